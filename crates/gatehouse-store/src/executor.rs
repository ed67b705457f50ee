//! Commit/rollback execution over scoped connections.
//!
//! Every operation runs inside an implicit transaction: commit on normal
//! completion, rollback before the failure propagates otherwise. No partial
//! state is observable by other operations once a call returns.

use crate::domain::types::{Command, Query, QueryResult};
use crate::domain::StoreError;
use crate::scope::ResourceScope;
use crate::ports::StorageConnection;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, warn};

/// Wraps operation bodies in acquire / commit-or-rollback / release.
pub struct TransactionalExecutor {
    scope: Arc<ResourceScope>,
}

impl TransactionalExecutor {
    pub fn new(scope: Arc<ResourceScope>) -> Self {
        Self { scope }
    }

    /// Run `body` inside a transaction.
    ///
    /// The body receives the scoped connection and may execute any number of
    /// commands and queries. On `Ok` the transaction commits; on `Err` it is
    /// rolled back (best-effort, a rollback failure is logged) and the
    /// original error is re-raised wrapped as [`StoreError::TransactionFailure`].
    pub async fn execute<T, F>(&self, body: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut dyn StorageConnection) -> BoxFuture<'a, Result<T, StoreError>>
            + Send,
    {
        let mut scoped = self.scope.acquire().await?;
        debug!("transaction started");

        match body(scoped.conn()).await {
            Ok(value) => {
                scoped.conn().commit().await?;
                scoped.close().await?;
                debug!("transaction committed");
                Ok(value)
            }
            Err(source) => {
                if let Err(rollback_error) = scoped.conn().rollback().await {
                    warn!(error = %rollback_error, "rollback failed");
                }
                if let Err(close_error) = scoped.close().await {
                    warn!(error = %close_error, "close after rollback failed");
                }
                debug!("transaction rolled back");
                Err(StoreError::TransactionFailure {
                    source: Box::new(source),
                })
            }
        }
    }

    /// Run a single command in its own transaction.
    pub async fn execute_one(&self, command: Command) -> Result<u64, StoreError> {
        debug!(table = command.table(), "executing command");
        self.execute(move |conn: &mut dyn StorageConnection| {
            Box::pin(async move { conn.execute(command).await })
        })
        .await
    }

    /// Run a read on a scoped connection, no transaction envelope.
    pub async fn query(&self, query: &Query) -> Result<QueryResult, StoreError> {
        let mut scoped = self.scope.acquire().await?;
        debug!(query = ?query, "executing read");

        let result = scoped.conn().query(query).await;
        if let Err(close_error) = scoped.close().await {
            warn!(error = %close_error, "close after read failed");
        }
        result
    }
}
