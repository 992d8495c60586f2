//! In-memory reference connector.
//!
//! Serves one fixed table of sample rows through the full seven-operation
//! federation contract. Useful as a template for real connectors and as
//! the end-to-end fixture for the dispatcher and codec.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use floe_common::{Error, Result};
use floe_federation::models::{
    GetSplitsResponse, GetTableLayoutResponse, GetTableResponse, ListSchemasResponse,
    ListTablesResponse, PingResponse, ReadRecordsResponse,
};
use floe_federation::Federator;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

pub mod config;

pub use config::Settings;

const SOURCE_TYPE: &str = "memory";
const SCHEMA_NAME: &str = "demo";
const TABLE_NAME: &str = "events";

/// A connector over one static in-memory table.
pub struct MemoryConnector {
    settings: Settings,
    envelope: Value,
}

impl MemoryConnector {
    /// The factory shape the dispatcher expects: one instance per
    /// request envelope.
    pub fn from_envelope(settings: Settings, envelope: &Value) -> Result<Self> {
        Ok(Self {
            settings,
            envelope: envelope.clone(),
        })
    }

    fn query_id(&self) -> Result<&str> {
        self.envelope
            .get("queryId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_request("envelope is missing queryId"))
    }
}

/// Schema of the sample table: four string columns.
pub fn table_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("eventId", DataType::Utf8, true),
        Field::new("message", DataType::Utf8, true),
        Field::new("source", DataType::Utf8, true),
        Field::new("occurredAt", DataType::Utf8, true),
    ]))
}

fn sample_columns() -> HashMap<String, ArrayRef> {
    let mut columns: HashMap<String, ArrayRef> = HashMap::new();
    columns.insert(
        "eventId".to_string(),
        Arc::new(StringArray::from(vec!["1", "2", "3", "4"])) as ArrayRef,
    );
    columns.insert(
        "message".to_string(),
        Arc::new(StringArray::from(vec!["hello", "happy", "boxing", "day"])) as ArrayRef,
    );
    columns.insert(
        "source".to_string(),
        Arc::new(StringArray::from(vec![
            "alpha.example",
            "beta.example",
            "gamma.example",
            "gamma.example",
        ])) as ArrayRef,
    );
    columns.insert(
        "occurredAt".to_string(),
        Arc::new(StringArray::from(vec![
            "2020-12-18",
            "2020-12-20",
            "2020-12-26",
            "2020-12-26",
        ])) as ArrayRef,
    );
    columns
}

impl Federator for MemoryConnector {
    fn ping(&self) -> Result<PingResponse> {
        Ok(PingResponse::new(
            &self.settings.catalog_name,
            self.query_id()?,
            SOURCE_TYPE,
        ))
    }

    fn list_schemas(&self) -> Result<ListSchemasResponse> {
        Ok(ListSchemasResponse::new(
            &self.settings.catalog_name,
            vec![SCHEMA_NAME.to_string()],
        ))
    }

    fn list_tables(&self) -> Result<ListTablesResponse> {
        let mut response = ListTablesResponse::new(&self.settings.catalog_name);
        response.add_table_definition(SCHEMA_NAME, TABLE_NAME);
        Ok(response)
    }

    fn get_table(&self) -> Result<GetTableResponse> {
        Ok(GetTableResponse::new(
            &self.settings.catalog_name,
            SCHEMA_NAME,
            TABLE_NAME,
            table_schema(),
        ))
    }

    fn get_table_layout(&self) -> Result<GetTableLayoutResponse> {
        // No partitioning for a single in-memory table; the response
        // renders the default single-partition set.
        Ok(GetTableLayoutResponse::new(
            &self.settings.catalog_name,
            SCHEMA_NAME,
            TABLE_NAME,
            None,
        ))
    }

    fn get_splits(&self) -> Result<GetSplitsResponse> {
        // One static split. The spill location is an opaque descriptor
        // for the engine; nothing here writes to it.
        let key = format!(
            "{}/{}/{}",
            self.settings.spill_prefix,
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        debug!(key = key.as_str(), "built spill location for split");
        let split = json!({
            "spillLocation": {
                "@type": "S3SpillLocation",
                "bucket": self.settings.spill_bucket,
                "key": key,
                "directory": true
            },
            "properties": {}
        });
        Ok(GetSplitsResponse::new(
            &self.settings.catalog_name,
            vec![split],
        ))
    }

    fn read_records(&self) -> Result<ReadRecordsResponse> {
        let blob = self
            .envelope
            .pointer("/schema/schema")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_request("envelope is missing schema.schema"))?;
        let schema = floe_codec::decode_schema(blob)?;
        debug!(columns = schema.fields().len(), "reading sample records");

        let batch = floe_codec::build_record_batch(schema.clone(), &sample_columns())?;
        Ok(ReadRecordsResponse::new(
            &self.settings.catalog_name,
            schema,
            batch,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use floe_federation::Dispatcher;

    fn settings() -> Settings {
        Settings {
            catalog_name: "mem".to_string(),
            spill_bucket: "spill-bucket".to_string(),
            spill_prefix: "floe-spill".to_string(),
        }
    }

    fn dispatch(envelope: Value) -> Result<Value> {
        Dispatcher::new().dispatch(&envelope, |event| {
            MemoryConnector::from_envelope(settings(), event)
        })
    }

    #[test]
    fn ping_reads_query_id_from_envelope() {
        let wire = dispatch(json!({"@type": "PingRequest", "queryId": "q-9"})).unwrap();
        assert_eq!(wire["@type"], "PingResponse");
        assert_eq!(wire["catalogName"], "mem");
        assert_eq!(wire["queryId"], "q-9");
        assert_eq!(wire["sourceType"], "memory");
    }

    #[test]
    fn ping_without_query_id_is_invalid() {
        let err = dispatch(json!({"@type": "PingRequest"})).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn metadata_operations_cover_the_sample_table() {
        let schemas = dispatch(json!({"@type": "ListSchemasRequest"})).unwrap();
        assert_eq!(schemas["schemas"], json!(["demo"]));

        let tables = dispatch(json!({"@type": "ListTablesRequest"})).unwrap();
        assert_eq!(
            tables["tables"],
            json!([{"schemaName": "demo", "tableName": "events"}])
        );

        let table = dispatch(json!({"@type": "GetTableRequest"})).unwrap();
        let decoded =
            floe_codec::decode_schema(table["schema"]["schema"].as_str().unwrap()).unwrap();
        assert_eq!(decoded.as_ref(), table_schema().as_ref());

        let layout = dispatch(json!({"@type": "GetTableLayoutRequest"})).unwrap();
        assert_eq!(layout["@type"], "GetTableLayoutResponse");
        assert!(layout["partitions"]["records"].is_string());
    }

    #[test]
    fn splits_carry_the_configured_spill_location() {
        let wire = dispatch(json!({"@type": "GetSplitsRequest"})).unwrap();
        let splits = wire["splits"].as_array().unwrap();
        assert_eq!(splits.len(), 1);
        let location = &splits[0]["spillLocation"];
        assert_eq!(location["@type"], "S3SpillLocation");
        assert_eq!(location["bucket"], "spill-bucket");
        assert!(location["key"]
            .as_str()
            .unwrap()
            .starts_with("floe-spill/"));
        assert_eq!(wire["continuationToken"], Value::Null);
    }

    #[test]
    fn read_records_projects_the_requested_columns() {
        let requested = Arc::new(Schema::new(vec![
            Field::new("eventId", DataType::Utf8, true),
            Field::new("message", DataType::Utf8, true),
        ]));
        let blob = floe_codec::encode_schema(&requested).unwrap();
        let wire = dispatch(json!({
            "@type": "ReadRecordsRequest",
            "queryId": "q-3",
            "schema": {"schema": blob}
        }))
        .unwrap();

        let block = &wire["records"];
        let schema = floe_codec::decode_schema(block["schema"].as_str().unwrap()).unwrap();
        let batch =
            floe_codec::decode_record_batch(schema.clone(), block["records"].as_str().unwrap())
                .unwrap();
        assert_eq!(schema.as_ref(), requested.as_ref());
        assert_eq!(batch.num_rows(), 4);
        let messages = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(messages.value(0), "hello");
    }

    #[test]
    fn read_records_rejects_unknown_columns() {
        let requested = Arc::new(Schema::new(vec![Field::new(
            "no_such_column",
            DataType::Utf8,
            true,
        )]));
        let blob = floe_codec::encode_schema(&requested).unwrap();
        let err = dispatch(json!({
            "@type": "ReadRecordsRequest",
            "queryId": "q-3",
            "schema": {"schema": blob}
        }))
        .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }
}
