//! Store-layer error taxonomy.
//!
//! - `TransientResource`: acquisition failed; eligible for caller-side retry.
//! - `TransactionFailure`: the operation body failed after a transaction was
//!   opened; rollback has already run when this surfaces.
//! - `Backend`: the storage engine itself failed.
//! - `Config`: invalid scope configuration, fatal at construction.

/// Errors surfaced by the resource-access layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connection acquisition failed (pool exhausted, timeout, engine down).
    #[error("transient resource error: {0}")]
    TransientResource(String),

    /// The transaction body failed; state was rolled back to the
    /// pre-operation snapshot before this error propagated.
    #[error("transaction rolled back: {source}")]
    TransactionFailure {
        #[source]
        source: Box<StoreError>,
    },

    /// Storage engine failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// Invalid configuration, fatal before serving traffic.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    pub fn transient(message: impl Into<String>) -> Self {
        StoreError::TransientResource(message.into())
    }

    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into())
    }

    /// Whether the caller may retry with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::TransientResource(_))
    }
}
