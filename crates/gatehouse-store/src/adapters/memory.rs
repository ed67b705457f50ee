//! In-memory storage backend with staged-write transactions.
//!
//! Committed tables live behind a shared lock. Each connection stages its
//! writes on a copy of the tables it touches; `commit` publishes the staged
//! tables, `rollback` (or dropping the connection) discards them. Reads on a
//! connection see its own staged writes; fresh connections see committed
//! state only.
//!
//! Concurrent transactions touching the same table are last-writer-wins at
//! commit, which is sufficient for the test and embedding scenarios this
//! adapter serves.

use crate::domain::types::{Command, Query, QueryResult};
use crate::domain::StoreError;
use crate::ports::{StorageBackend, StorageConnection};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

type Row = Map<String, Value>;
type Table = BTreeMap<String, Row>;
type Tables = HashMap<String, Table>;

/// Shared in-memory storage engine.
#[derive(Default)]
pub struct MemoryBackend {
    committed: Arc<RwLock<Tables>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with the given empty tables pre-created.
    pub fn with_tables(names: &[&str]) -> Self {
        let backend = Self::default();
        {
            let mut tables = backend.committed.write();
            for name in names {
                tables.insert((*name).to_string(), Table::new());
            }
        }
        backend
    }

    pub fn create_table(&self, name: impl Into<String>) {
        self.committed.write().entry(name.into()).or_default();
    }

    /// Committed row count, bypassing any connection. Test inspection helper.
    pub fn committed_rows(&self, table: &str) -> Option<usize> {
        self.committed.read().get(table).map(|t| t.len())
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn connect(&self) -> Result<Box<dyn StorageConnection>, StoreError> {
        Ok(Box::new(MemoryConnection {
            committed: Arc::clone(&self.committed),
            staged: HashMap::new(),
            open: true,
        }))
    }
}

struct MemoryConnection {
    committed: Arc<RwLock<Tables>>,
    /// Copy-on-write overlay of every table this transaction has written.
    staged: Tables,
    open: bool,
}

impl MemoryConnection {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.open {
            Ok(())
        } else {
            Err(StoreError::backend("connection is closed"))
        }
    }

    /// Staged copy of a table, cloned from committed state on first touch.
    fn staged_table(&mut self, name: &str) -> Result<&mut Table, StoreError> {
        use std::collections::hash_map::Entry;
        match self.staged.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(slot) => {
                let snapshot = self
                    .committed
                    .read()
                    .get(name)
                    .cloned()
                    .ok_or_else(|| StoreError::backend(format!("no such table: {name}")))?;
                Ok(slot.insert(snapshot))
            }
        }
    }

    fn rows_of(table: &Table) -> Vec<Value> {
        table.values().map(|row| Value::Object(row.clone())).collect()
    }
}

#[async_trait]
impl StorageConnection for MemoryConnection {
    async fn execute(&mut self, command: Command) -> Result<u64, StoreError> {
        self.ensure_open()?;
        match command {
            Command::Insert { table, key, fields } => {
                let table = self.staged_table(&table)?;
                if table.contains_key(&key) {
                    return Err(StoreError::backend(format!("duplicate key: {key}")));
                }
                table.insert(key, fields);
                Ok(1)
            }
            Command::Update { table, key, fields } => {
                let table = self.staged_table(&table)?;
                match table.get_mut(&key) {
                    Some(row) => {
                        for (field, value) in fields {
                            row.insert(field, value);
                        }
                        Ok(1)
                    }
                    None => Ok(0),
                }
            }
            Command::Delete { table, key } => {
                let table = self.staged_table(&table)?;
                Ok(u64::from(table.remove(&key).is_some()))
            }
        }
    }

    async fn query(&mut self, query: &Query) -> Result<QueryResult, StoreError> {
        self.ensure_open()?;
        let (table_name, key) = match query {
            Query::SelectAll { table } => (table, None),
            Query::SelectByKey { table, key } => (table, Some(key)),
        };

        // Own staged writes are visible; otherwise read committed state.
        let rows = if let Some(staged) = self.staged.get(table_name) {
            match key {
                Some(k) => staged
                    .get(k)
                    .map(|row| vec![Value::Object(row.clone())])
                    .unwrap_or_default(),
                None => Self::rows_of(staged),
            }
        } else {
            let committed = self.committed.read();
            let table = committed
                .get(table_name)
                .ok_or_else(|| StoreError::backend(format!("no such table: {table_name}")))?;
            match key {
                Some(k) => table
                    .get(k)
                    .map(|row| vec![Value::Object(row.clone())])
                    .unwrap_or_default(),
                None => Self::rows_of(table),
            }
        };

        Ok(QueryResult { rows })
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        let mut committed = self.committed.write();
        for (name, table) in self.staged.drain() {
            committed.insert(name, table);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.staged.clear();
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        // Idempotent; un-committed staged work is discarded.
        self.staged.clear();
        self.open = false;
        Ok(())
    }
}
