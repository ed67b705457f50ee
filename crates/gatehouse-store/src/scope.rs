//! Scoped connection acquisition with guaranteed release.
//!
//! A [`ResourceScope`] caps concurrent connections with a semaphore and hands
//! out [`ScopedConnection`] guards. The permit is released when the guard
//! drops, on every exit path: normal close, early return, failure, or task
//! cancellation. Release is never left to caller discipline.

use crate::domain::StoreError;
use crate::ports::{StorageBackend, StorageConnection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

/// Connection scope configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Maximum concurrently held connections.
    pub max_connections: usize,
    /// How long `acquire` may wait for a free slot.
    #[serde(with = "duration_secs")]
    pub acquire_timeout: Duration,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            max_connections: 8,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl ScopeConfig {
    /// Validate configuration. Invalid values are fatal at construction.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.max_connections == 0 {
            return Err(StoreError::Config("max_connections cannot be 0".into()));
        }
        if self.acquire_timeout.is_zero() {
            return Err(StoreError::Config("acquire_timeout cannot be 0".into()));
        }
        Ok(())
    }
}

/// Acquires and releases backing-store connections with a bounded wait.
pub struct ResourceScope {
    backend: Arc<dyn StorageBackend>,
    permits: Arc<Semaphore>,
    acquire_timeout: Duration,
}

impl ResourceScope {
    pub fn new(backend: Arc<dyn StorageBackend>, config: ScopeConfig) -> Result<Self, StoreError> {
        config.validate()?;
        Ok(Self {
            backend,
            permits: Arc::new(Semaphore::new(config.max_connections)),
            acquire_timeout: config.acquire_timeout,
        })
    }

    /// Acquire a connection, waiting at most the configured timeout for a
    /// free slot. Acquisition failures surface as transient errors the
    /// caller may retry with backoff.
    pub async fn acquire(&self) -> Result<ScopedConnection, StoreError> {
        let permit = match tokio::time::timeout(
            self.acquire_timeout,
            Arc::clone(&self.permits).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_closed)) => {
                return Err(StoreError::transient("connection scope is shut down"));
            }
            Err(_elapsed) => {
                return Err(StoreError::transient(format!(
                    "timed out after {:?} waiting for a connection",
                    self.acquire_timeout
                )));
            }
        };

        let conn = self
            .backend
            .connect()
            .await
            .map_err(|e| StoreError::transient(format!("connect failed: {e}")))?;

        Ok(ScopedConnection {
            conn: Some(conn),
            _permit: permit,
        })
    }

    /// Currently free connection slots.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Guard owning one connection for the duration of one operation.
///
/// The connection is released exactly once: either through [`close`](Self::close)
/// or, failing that, when the guard drops. Adapters treat an un-closed drop
/// as rollback-then-close, so staged work never leaks.
pub struct ScopedConnection {
    conn: Option<Box<dyn StorageConnection>>,
    _permit: OwnedSemaphorePermit,
}

impl ScopedConnection {
    /// Access the underlying connection.
    pub fn conn(&mut self) -> &mut dyn StorageConnection {
        // Invariant: `conn` is only taken by close() (which consumes self)
        // and by Drop; neither can race a live borrow.
        self.conn
            .as_deref_mut()
            .expect("scoped connection used after close")
    }

    /// Close the connection and release the slot.
    pub async fn close(mut self) -> Result<(), StoreError> {
        match self.conn.take() {
            Some(mut conn) => conn.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        if self.conn.take().is_some() {
            // Dropping the boxed connection discards staged work; the permit
            // is released by its own Drop. Nothing to await here.
            trace!("connection dropped without explicit close; staged work discarded");
        }
    }
}

impl std::fmt::Debug for ScopedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedConnection")
            .field("open", &self.conn.is_some())
            .finish()
    }
}

/// Duration-as-seconds serde module.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
