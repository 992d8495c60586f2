use floe_common::{Error, Result};

use crate::models::{
    GetSplitsResponse, GetTableLayoutResponse, GetTableResponse, ListSchemasResponse,
    ListTablesResponse, PingResponse, ReadRecordsResponse,
};

/// The capability contract every Floe connector implements.
///
/// One instance is built per request envelope by the dispatcher's factory
/// and asked for exactly one of these operations. Each default body fails
/// with [`Error::NotImplemented`]: a connector under development may ship
/// with a subset of operations, but exercising a missing one must fail
/// loudly rather than default to an empty answer.
pub trait Federator {
    /// Metadata about this connector: catalog name, source type, and the
    /// capability bitmask.
    fn ping(&self) -> Result<PingResponse> {
        Err(Error::NotImplemented("ping"))
    }

    /// The databases this connector can serve.
    fn list_schemas(&self) -> Result<ListSchemasResponse> {
        Err(Error::NotImplemented("listSchemas"))
    }

    /// The tables available within those databases.
    fn list_tables(&self) -> Result<ListTablesResponse> {
        Err(Error::NotImplemented("listTables"))
    }

    /// Column-level metadata for one table.
    fn get_table(&self) -> Result<GetTableResponse> {
        Err(Error::NotImplemented("getTable"))
    }

    /// Partition layout for one table; connectors with no partitioning
    /// return a layout built without partitions and let it render the
    /// default partition set.
    fn get_table_layout(&self) -> Result<GetTableLayoutResponse> {
        Err(Error::NotImplemented("getTableLayout"))
    }

    /// Work units for the read phase. The engine treats these as opaque
    /// hints handed back on readRecords.
    fn get_splits(&self) -> Result<GetSplitsResponse> {
        Err(Error::NotImplemented("getSplits"))
    }

    /// The actual data, shaped to the schema carried in the request
    /// envelope.
    fn read_records(&self) -> Result<ReadRecordsResponse> {
        Err(Error::NotImplemented("readRecords"))
    }
}
