//! Typed response models for the seven federation request kinds.
//!
//! Each model renders exactly once per call through [`to_wire`] into the
//! JSON mapping the engine's JVM SDK parses. The key names on the wire
//! structs are protocol contract; renaming one breaks the remote parser.

use std::sync::{Arc, OnceLock};

use arrow::array::Int64Array;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use floe_common::Result;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Feature-flag bitmask advertised on ping; mirrors the engine SDK's
/// FederationCapabilities constant.
pub const CAPABILITIES: u32 = 23;

/// One queryable table within one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDefinition {
    #[serde(rename = "schemaName")]
    pub schema_name: String,
    #[serde(rename = "tableName")]
    pub table_name: String,
}

impl TableDefinition {
    pub fn new(schema_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
        }
    }
}

/// A schema/records blob pair with the per-render allocation id the
/// engine uses to track the block.
#[derive(Serialize)]
struct EncodedBlockWire {
    #[serde(rename = "aId")]
    a_id: String,
    schema: String,
    records: String,
}

impl EncodedBlockWire {
    fn new(schema: &Schema, records: &RecordBatch) -> Result<Self> {
        Ok(Self {
            a_id: Uuid::new_v4().to_string(),
            schema: floe_codec::encode_schema(schema)?,
            records: floe_codec::encode_record_batch(records)?,
        })
    }
}

#[derive(Serialize)]
struct TableNameWire<'a> {
    #[serde(rename = "schemaName")]
    schema_name: &'a str,
    #[serde(rename = "tableName")]
    table_name: &'a str,
}

#[derive(Debug, Clone)]
pub struct PingResponse {
    pub catalog_name: String,
    pub query_id: String,
    pub source_type: String,
}

impl PingResponse {
    pub fn new(
        catalog_name: impl Into<String>,
        query_id: impl Into<String>,
        source_type: impl Into<String>,
    ) -> Self {
        Self {
            catalog_name: catalog_name.into(),
            query_id: query_id.into(),
            source_type: source_type.into(),
        }
    }

    pub fn to_wire(&self) -> Result<Value> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "@type")]
            type_tag: &'static str,
            #[serde(rename = "catalogName")]
            catalog_name: &'a str,
            #[serde(rename = "queryId")]
            query_id: &'a str,
            #[serde(rename = "sourceType")]
            source_type: &'a str,
            capabilities: u32,
        }
        Ok(serde_json::to_value(Wire {
            type_tag: "PingResponse",
            catalog_name: &self.catalog_name,
            query_id: &self.query_id,
            source_type: &self.source_type,
            capabilities: CAPABILITIES,
        })?)
    }
}

#[derive(Debug, Clone)]
pub struct ListSchemasResponse {
    pub catalog_name: String,
    pub schemas: Vec<String>,
}

impl ListSchemasResponse {
    pub fn new(catalog_name: impl Into<String>, schemas: Vec<String>) -> Self {
        Self {
            catalog_name: catalog_name.into(),
            schemas,
        }
    }

    pub fn to_wire(&self) -> Result<Value> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "@type")]
            type_tag: &'static str,
            #[serde(rename = "catalogName")]
            catalog_name: &'a str,
            schemas: &'a [String],
            #[serde(rename = "requestType")]
            request_type: &'static str,
        }
        Ok(serde_json::to_value(Wire {
            type_tag: "ListSchemasResponse",
            catalog_name: &self.catalog_name,
            schemas: &self.schemas,
            request_type: "LIST_SCHEMAS",
        })?)
    }
}

#[derive(Debug, Clone)]
pub struct ListTablesResponse {
    pub catalog_name: String,
    pub tables: Vec<TableDefinition>,
}

impl ListTablesResponse {
    /// Starts with a fresh, per-instance empty table list.
    pub fn new(catalog_name: impl Into<String>) -> Self {
        Self {
            catalog_name: catalog_name.into(),
            tables: Vec::new(),
        }
    }

    pub fn add_table_definition(
        &mut self,
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
    ) {
        self.tables.push(TableDefinition::new(schema_name, table_name));
    }

    pub fn to_wire(&self) -> Result<Value> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "@type")]
            type_tag: &'static str,
            #[serde(rename = "catalogName")]
            catalog_name: &'a str,
            tables: &'a [TableDefinition],
            #[serde(rename = "requestType")]
            request_type: &'static str,
        }
        Ok(serde_json::to_value(Wire {
            type_tag: "ListTablesResponse",
            catalog_name: &self.catalog_name,
            tables: &self.tables,
            request_type: "LIST_TABLES",
        })?)
    }
}

#[derive(Debug, Clone)]
pub struct GetTableResponse {
    pub catalog_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub schema: SchemaRef,
}

impl GetTableResponse {
    pub fn new(
        catalog_name: impl Into<String>,
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
        schema: SchemaRef,
    ) -> Self {
        Self {
            catalog_name: catalog_name.into(),
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            schema,
        }
    }

    pub fn to_wire(&self) -> Result<Value> {
        #[derive(Serialize)]
        struct SchemaWire {
            schema: String,
        }
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "@type")]
            type_tag: &'static str,
            #[serde(rename = "catalogName")]
            catalog_name: &'a str,
            #[serde(rename = "tableName")]
            table_name: TableNameWire<'a>,
            schema: SchemaWire,
            #[serde(rename = "partitionColumns")]
            partition_columns: &'a [String],
            #[serde(rename = "requestType")]
            request_type: &'static str,
        }
        Ok(serde_json::to_value(Wire {
            type_tag: "GetTableResponse",
            catalog_name: &self.catalog_name,
            table_name: TableNameWire {
                schema_name: &self.schema_name,
                table_name: &self.table_name,
            },
            schema: SchemaWire {
                schema: floe_codec::encode_schema(&self.schema)?,
            },
            partition_columns: &[],
            request_type: "GET_TABLE",
        })?)
    }
}

#[derive(Debug)]
pub struct GetTableLayoutResponse {
    pub catalog_name: String,
    pub schema_name: String,
    pub table_name: String,
    partitions: OnceLock<RecordBatch>,
}

impl GetTableLayoutResponse {
    pub fn new(
        catalog_name: impl Into<String>,
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
        partitions: Option<RecordBatch>,
    ) -> Self {
        let cell = OnceLock::new();
        if let Some(batch) = partitions {
            let _ = cell.set(batch);
        }
        Self {
            catalog_name: catalog_name.into(),
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            partitions: cell,
        }
    }

    /// The partition set this layout will render.
    ///
    /// An empty partition set reads as "no data" on the engine side, so a
    /// layout built without partitions materializes the single default
    /// partition here, once, on first render.
    pub fn partition_set(&self) -> &RecordBatch {
        self.partitions.get_or_init(default_partition_set)
    }

    pub fn to_wire(&self) -> Result<Value> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "@type")]
            type_tag: &'static str,
            #[serde(rename = "catalogName")]
            catalog_name: &'a str,
            #[serde(rename = "tableName")]
            table_name: TableNameWire<'a>,
            partitions: EncodedBlockWire,
            #[serde(rename = "requestType")]
            request_type: &'static str,
        }
        let partitions = self.partition_set();
        Ok(serde_json::to_value(Wire {
            type_tag: "GetTableLayoutResponse",
            catalog_name: &self.catalog_name,
            table_name: TableNameWire {
                schema_name: &self.schema_name,
                table_name: &self.table_name,
            },
            partitions: EncodedBlockWire::new(partitions.schema().as_ref(), partitions)?,
            request_type: "GET_TABLE_LAYOUT",
        })?)
    }
}

/// The single-row fallback partition set: one `partitionId` column holding 1.
pub fn default_partition_set() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![Field::new(
        "partitionId",
        DataType::Int64,
        true,
    )]));
    RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1_i64]))])
        .expect("single int64 column batch")
}

#[derive(Debug, Clone)]
pub struct GetSplitsResponse {
    pub catalog_name: String,
    /// Opaque split descriptors, passed through to the engine unchanged.
    pub splits: Vec<Value>,
}

impl GetSplitsResponse {
    pub fn new(catalog_name: impl Into<String>, splits: Vec<Value>) -> Self {
        Self {
            catalog_name: catalog_name.into(),
            splits,
        }
    }

    pub fn to_wire(&self) -> Result<Value> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "@type")]
            type_tag: &'static str,
            #[serde(rename = "catalogName")]
            catalog_name: &'a str,
            splits: &'a [Value],
            // Split pagination is not part of the current contract; the
            // token is always null on the wire, never omitted.
            #[serde(rename = "continuationToken")]
            continuation_token: Option<String>,
            #[serde(rename = "requestType")]
            request_type: &'static str,
        }
        Ok(serde_json::to_value(Wire {
            type_tag: "GetSplitsResponse",
            catalog_name: &self.catalog_name,
            splits: &self.splits,
            continuation_token: None,
            request_type: "GET_SPLITS",
        })?)
    }
}

#[derive(Debug, Clone)]
pub struct ReadRecordsResponse {
    pub catalog_name: String,
    pub schema: SchemaRef,
    pub records: RecordBatch,
}

impl ReadRecordsResponse {
    pub fn new(catalog_name: impl Into<String>, schema: SchemaRef, records: RecordBatch) -> Self {
        Self {
            catalog_name: catalog_name.into(),
            schema,
            records,
        }
    }

    pub fn to_wire(&self) -> Result<Value> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "@type")]
            type_tag: &'static str,
            #[serde(rename = "catalogName")]
            catalog_name: &'a str,
            records: EncodedBlockWire,
            #[serde(rename = "requestType")]
            request_type: &'static str,
        }
        Ok(serde_json::to_value(Wire {
            type_tag: "ReadRecordsResponse",
            catalog_name: &self.catalog_name,
            records: EncodedBlockWire::new(&self.schema, &self.records)?,
            request_type: "READ_RECORDS",
        })?)
    }
}

/// A response of any of the seven kinds, as handed back by the dispatcher.
#[derive(Debug)]
pub enum Response {
    Ping(PingResponse),
    ListSchemas(ListSchemasResponse),
    ListTables(ListTablesResponse),
    GetTable(GetTableResponse),
    GetTableLayout(GetTableLayoutResponse),
    GetSplits(GetSplitsResponse),
    ReadRecords(ReadRecordsResponse),
}

impl Response {
    pub fn to_wire(&self) -> Result<Value> {
        match self {
            Response::Ping(r) => r.to_wire(),
            Response::ListSchemas(r) => r.to_wire(),
            Response::ListTables(r) => r.to_wire(),
            Response::GetTable(r) => r.to_wire(),
            Response::GetTableLayout(r) => r.to_wire(),
            Response::GetSplits(r) => r.to_wire(),
            Response::ReadRecords(r) => r.to_wire(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
    use serde_json::json;

    const CATALOG: &str = "sample_catalog";
    const DB: &str = "sample_db";
    const TABLE: &str = "sample_table";

    fn one_column_schema() -> SchemaRef {
        Arc::new(Schema::new(vec![Field::new(
            "messageId",
            DataType::Utf8,
            true,
        )]))
    }

    #[test]
    fn ping_wire_mapping() {
        let wire = PingResponse::new(CATALOG, "q-123", "sample")
            .to_wire()
            .unwrap();
        assert_eq!(wire["@type"], "PingResponse");
        assert_eq!(wire["catalogName"], CATALOG);
        assert_eq!(wire["queryId"], "q-123");
        assert_eq!(wire["sourceType"], "sample");
        assert_eq!(wire["capabilities"], 23);
    }

    #[test]
    fn list_schemas_wire_mapping() {
        let wire = ListSchemasResponse::new(CATALOG, vec!["personal".to_string()])
            .to_wire()
            .unwrap();
        assert_eq!(wire["@type"], "ListSchemasResponse");
        assert_eq!(wire["schemas"], json!(["personal"]));
        assert_eq!(wire["requestType"], "LIST_SCHEMAS");
    }

    #[test]
    fn list_tables_starts_empty_per_instance() {
        let mut first = ListTablesResponse::new(CATALOG);
        first.add_table_definition(DB, TABLE);
        let second = ListTablesResponse::new(CATALOG);
        assert_eq!(first.tables.len(), 1);
        assert!(second.tables.is_empty());

        let wire = first.to_wire().unwrap();
        assert_eq!(
            wire["tables"],
            json!([{"schemaName": DB, "tableName": TABLE}])
        );
        assert_eq!(wire["requestType"], "LIST_TABLES");
    }

    #[test]
    fn get_table_wire_mapping_round_trips_schema() {
        let schema = one_column_schema();
        let wire = GetTableResponse::new(CATALOG, DB, TABLE, schema.clone())
            .to_wire()
            .unwrap();
        assert_eq!(wire["@type"], "GetTableResponse");
        assert_eq!(
            wire["tableName"],
            json!({"schemaName": DB, "tableName": TABLE})
        );
        assert_eq!(wire["partitionColumns"], json!([]));

        let blob = wire["schema"]["schema"].as_str().unwrap();
        let decoded = floe_codec::decode_schema(blob).unwrap();
        assert_eq!(decoded.as_ref(), schema.as_ref());
    }

    #[test]
    fn layout_without_partitions_renders_default_partition() {
        let layout = GetTableLayoutResponse::new(CATALOG, DB, TABLE, None);
        let wire = layout.to_wire().unwrap();
        assert_eq!(wire["@type"], "GetTableLayoutResponse");

        let partitions = &wire["partitions"];
        let schema = floe_codec::decode_schema(partitions["schema"].as_str().unwrap()).unwrap();
        let batch =
            floe_codec::decode_record_batch(schema, partitions["records"].as_str().unwrap())
                .unwrap();
        assert_eq!(batch.num_columns(), 1);
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.schema().field(0).name(), "partitionId");
        let values = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(values.value(0), 1);
    }

    #[test]
    fn layout_default_is_stable_across_renders() {
        let layout = GetTableLayoutResponse::new(CATALOG, DB, TABLE, None);
        let first = layout.to_wire().unwrap();
        let second = layout.to_wire().unwrap();
        // Same synthesized partition set every time, fresh aId every time.
        assert_eq!(first["partitions"]["schema"], second["partitions"]["schema"]);
        assert_eq!(
            first["partitions"]["records"],
            second["partitions"]["records"]
        );
        assert_ne!(first["partitions"]["aId"], second["partitions"]["aId"]);
        uuid::Uuid::parse_str(first["partitions"]["aId"].as_str().unwrap()).unwrap();
    }

    #[test]
    fn layout_keeps_supplied_partitions() {
        let partitions = default_partition_set();
        let layout = GetTableLayoutResponse::new(CATALOG, DB, TABLE, Some(partitions.clone()));
        assert_eq!(layout.partition_set(), &partitions);
    }

    #[test]
    fn splits_wire_mapping_has_null_continuation_token() {
        let split = json!({
            "spillLocation": {
                "@type": "S3SpillLocation",
                "bucket": "spill-bucket",
                "key": "spill/abc",
                "directory": true
            },
            "properties": {}
        });
        let wire = GetSplitsResponse::new(CATALOG, vec![split.clone()])
            .to_wire()
            .unwrap();
        assert_eq!(wire["@type"], "GetSplitsResponse");
        assert_eq!(wire["splits"], json!([split]));
        assert!(wire.as_object().unwrap().contains_key("continuationToken"));
        assert_eq!(wire["continuationToken"], Value::Null);
        assert_eq!(wire["requestType"], "GET_SPLITS");
    }

    #[test]
    fn read_records_wire_mapping_round_trips() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("name", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
                Arc::new(StringArray::from(vec!["damon", "dacort"])) as ArrayRef,
            ],
        )
        .unwrap();

        let wire = ReadRecordsResponse::new(CATALOG, schema.clone(), batch.clone())
            .to_wire()
            .unwrap();
        assert_eq!(wire["@type"], "ReadRecordsResponse");
        assert_eq!(wire["requestType"], "READ_RECORDS");

        let block = &wire["records"];
        let decoded_schema =
            floe_codec::decode_schema(block["schema"].as_str().unwrap()).unwrap();
        let decoded = floe_codec::decode_record_batch(
            decoded_schema.clone(),
            block["records"].as_str().unwrap(),
        )
        .unwrap();
        assert_eq!(decoded_schema.as_ref(), schema.as_ref());
        assert_eq!(decoded, batch);
    }
}
