use thiserror::Error;

/// Unified error type for Floe crates.
///
/// One request either renders a complete wire mapping or fails with one of
/// these; there is no partial-success shape and nothing here is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown request kind: {0}")]
    UnknownRequestKind(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("operation not implemented by this connector: {0}")]
    NotImplemented(&'static str),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("malformed message framing: {0}")]
    Codec(String),

    #[error("malformed base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Error::InvalidRequest(msg.into())
    }

    pub fn schema_mismatch(msg: impl Into<String>) -> Self {
        Error::SchemaMismatch(msg.into())
    }
}
