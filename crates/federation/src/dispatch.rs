//! Routes one request envelope to one connector operation.

use floe_common::{Error, Result};
use serde_json::Value;
use tracing::debug;

use crate::federator::Federator;
use crate::models::Response;

/// The seven request kinds the engine can send, keyed by the `@type` tag
/// on the inbound envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Ping,
    ListSchemas,
    ListTables,
    GetTable,
    GetTableLayout,
    GetSplits,
    ReadRecords,
}

impl RequestKind {
    pub fn from_type_tag(tag: &str) -> Result<Self> {
        match tag {
            "PingRequest" => Ok(RequestKind::Ping),
            "ListSchemasRequest" => Ok(RequestKind::ListSchemas),
            "ListTablesRequest" => Ok(RequestKind::ListTables),
            "GetTableRequest" => Ok(RequestKind::GetTable),
            "GetTableLayoutRequest" => Ok(RequestKind::GetTableLayout),
            "GetSplitsRequest" => Ok(RequestKind::GetSplits),
            "ReadRecordsRequest" => Ok(RequestKind::ReadRecords),
            other => Err(Error::UnknownRequestKind(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Ping => "PingRequest",
            RequestKind::ListSchemas => "ListSchemasRequest",
            RequestKind::ListTables => "ListTablesRequest",
            RequestKind::GetTable => "GetTableRequest",
            RequestKind::GetTableLayout => "GetTableLayoutRequest",
            RequestKind::GetSplits => "GetSplitsRequest",
            RequestKind::ReadRecords => "ReadRecordsRequest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Handling,
}

/// One-request-at-a-time dispatcher.
///
/// Handles exactly one envelope per call: resolve the kind, build the
/// connector, invoke the one operation, render the wire mapping, return
/// to idle. Failures surface as-is; retry policy belongs to the invoking
/// transport.
#[derive(Debug)]
pub struct Dispatcher {
    state: State,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn dispatch<C, F>(&mut self, envelope: &Value, factory: F) -> Result<Value>
    where
        C: Federator,
        F: FnOnce(&Value) -> Result<C>,
    {
        let tag = envelope
            .get("@type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_request("envelope is missing the @type discriminant"))?;
        let kind = RequestKind::from_type_tag(tag)?;

        self.state = State::Handling;
        let outcome = handle(kind, envelope, factory);
        self.state = State::Idle;
        outcome
    }
}

fn handle<C, F>(kind: RequestKind, envelope: &Value, factory: F) -> Result<Value>
where
    C: Federator,
    F: FnOnce(&Value) -> Result<C>,
{
    let span = tracing::debug_span!("dispatch", request = kind.as_str());
    let _guard = span.enter();

    let connector = factory(envelope)?;
    let response = match kind {
        RequestKind::Ping => Response::Ping(connector.ping()?),
        RequestKind::ListSchemas => Response::ListSchemas(connector.list_schemas()?),
        RequestKind::ListTables => Response::ListTables(connector.list_tables()?),
        RequestKind::GetTable => Response::GetTable(connector.get_table()?),
        RequestKind::GetTableLayout => Response::GetTableLayout(connector.get_table_layout()?),
        RequestKind::GetSplits => Response::GetSplits(connector.get_splits()?),
        RequestKind::ReadRecords => Response::ReadRecords(connector.read_records()?),
    };
    debug!(request = kind.as_str(), "rendering response");
    response.to_wire()
}
