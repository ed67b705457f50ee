//! Storage commands, queries, and results.
//!
//! The backing engine is abstracted over a small operation vocabulary rather
//! than raw query strings, so signatures are canonical and adapters stay
//! honest about what they support.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A write operation executed inside a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Insert a new row. Fails if the key already exists.
    Insert {
        table: String,
        key: String,
        fields: Map<String, Value>,
    },
    /// Merge fields into an existing row. Affects 0 rows if the key is absent.
    Update {
        table: String,
        key: String,
        fields: Map<String, Value>,
    },
    /// Remove a row. Affects 0 rows if the key is absent.
    Delete { table: String, key: String },
}

impl Command {
    /// Table the command targets, for logging.
    pub fn table(&self) -> &str {
        match self {
            Command::Insert { table, .. }
            | Command::Update { table, .. }
            | Command::Delete { table, .. } => table,
        }
    }
}

/// A read-only operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Query {
    /// All rows of a table, in key order.
    SelectAll { table: String },
    /// The row stored under one key (zero or one rows).
    SelectByKey { table: String, key: String },
}

/// Rows produced by a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<Value>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Exact signature of a read operation: operation kind plus literal
/// arguments, rendered as canonical JSON. Cache key for [`crate::QueryCache`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySignature(String);

impl QuerySignature {
    /// Signature of a query value.
    pub fn of(query: &Query) -> Self {
        // Serialization of this enum cannot fail; the fallback keeps the
        // signature total without panicking.
        let rendered =
            serde_json::to_string(query).unwrap_or_else(|_| format!("{query:?}"));
        Self(rendered)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
