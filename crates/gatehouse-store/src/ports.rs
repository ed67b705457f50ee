//! Outbound ports: the storage engine abstraction.
//!
//! The engine exposes connect/execute/query/commit/rollback/close primitives.
//! Production adapters wrap a real database driver; [`crate::adapters::MemoryBackend`]
//! implements the same contract in memory for tests and embedding.

use crate::domain::types::{Command, Query, QueryResult};
use crate::domain::StoreError;
use async_trait::async_trait;

/// Connection factory for the backing store.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Open a new connection with an implicit transaction.
    async fn connect(&self) -> Result<Box<dyn StorageConnection>, StoreError>;
}

/// One live connection. Single-owner: never shared across operations.
///
/// Dropping a connection without calling [`close`](Self::close) must be
/// treated by the adapter as rollback-then-close; that is what guarantees
/// cleanup when a request is cancelled mid-operation.
#[async_trait]
pub trait StorageConnection: Send {
    /// Execute one write command inside the current transaction.
    /// Returns the number of affected rows.
    async fn execute(&mut self, command: Command) -> Result<u64, StoreError>;

    /// Run a read. Sees this connection's uncommitted writes plus the
    /// committed state; never other connections' staged work.
    async fn query(&mut self, query: &Query) -> Result<QueryResult, StoreError>;

    /// Publish all staged writes atomically.
    async fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard all staged writes.
    async fn rollback(&mut self) -> Result<(), StoreError>;

    /// Release the connection. Idempotent.
    async fn close(&mut self) -> Result<(), StoreError>;
}
