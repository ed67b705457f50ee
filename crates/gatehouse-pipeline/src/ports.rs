//! Outbound ports for the pipeline.
//!
//! These are the interfaces the host application implements: an append-only
//! audit sink and a time source. Both have production adapters in
//! [`crate::adapters`] and in-memory test doubles in [`crate::test_utils`].

use chrono::{DateTime, NaiveTime, Utc};
use std::time::Instant;

/// One audit record per request, diagnostic format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    /// Username or "Anonymous".
    pub principal: String,
    pub path: String,
}

impl AuditRecord {
    /// Render the single-line log format: `<timestamp> - User: <p> - Path: <path>`.
    pub fn render(&self) -> String {
        format!(
            "{} - User: {} - Path: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.principal,
            self.path
        )
    }
}

/// Audit sink failure. Swallowed by the audit gate, never surfaced.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit sink I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Append-only destination for audit records.
pub trait AuditSink: Send + Sync {
    /// Append one record. Best-effort: callers tolerate failure.
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Time source trait for testability.
pub trait TimeSource: Send + Sync {
    /// Monotonic instant for sliding-window arithmetic.
    fn instant(&self) -> Instant;

    /// Wall-clock timestamp for audit records.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Local time of day for the time-window gate.
    fn time_of_day(&self) -> NaiveTime;
}
