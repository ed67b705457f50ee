//! Domain types for the resource-access layer.

pub mod errors;
pub mod types;

pub use errors::StoreError;
pub use types::{Command, Query, QueryResult, QuerySignature};
