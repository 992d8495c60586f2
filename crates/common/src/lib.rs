//! Common crate
//!
//! Shared error handling for the Floe federation connector SDK.
//!
//! # Example
//! ```rust
//! use floe_common::Error;
//! let err = Error::invalid_request("envelope is missing queryId");
//! ```

pub mod error;

pub use error::{Error, Result};
