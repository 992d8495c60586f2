//! Federation crate
//!
//! The request/response contract between a Floe connector and the query
//! engine: the seven typed response models, the `Federator` capability
//! trait every connector implements, and the dispatcher that routes one
//! incoming request envelope to one connector operation and renders the
//! wire mapping the engine's SDK expects.

pub mod dispatch;
pub mod federator;
pub mod models;

pub use dispatch::{Dispatcher, RequestKind};
pub use federator::Federator;
pub use models::Response;
