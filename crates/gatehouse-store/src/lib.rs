//! Gatehouse store - transactional resource access for the messaging backend.
//!
//! Three cooperating pieces sit between terminal handlers and the storage
//! engine:
//!
//! ```text
//! TerminalHandler
//!      │
//!      ├──► QueryCache ───────────┐   reads, memoized by signature
//!      │                          ▼
//!      └──► TransactionalExecutor ──► ResourceScope ──► StorageBackend
//!              commit / rollback        bounded acquire,     (port)
//!                                       guaranteed release
//! ```
//!
//! - [`ResourceScope`]: scoped connection acquisition; the handle is released
//!   exactly once on every exit path, including cancellation.
//! - [`TransactionalExecutor`]: commit on success, rollback before re-raising
//!   on failure; no partial state observable either way.
//! - [`QueryCache`]: never-expiring memoization of read results, with an
//!   optional entry cap.
//!
//! The storage engine is a port ([`StorageBackend`] / [`StorageConnection`]);
//! [`adapters::MemoryBackend`] provides an in-memory implementation with real
//! staged-write transaction semantics.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod cache;
pub mod domain;
pub mod executor;
pub mod ports;
pub mod scope;

pub use cache::{EvictionPolicy, QueryCache};
pub use domain::{Command, Query, QueryResult, QuerySignature, StoreError};
pub use executor::TransactionalExecutor;
pub use ports::{StorageBackend, StorageConnection};
pub use scope::{ResourceScope, ScopeConfig, ScopedConnection};
