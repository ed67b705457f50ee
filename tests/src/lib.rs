//! Shared fixtures for the Gatehouse test suite.
//!
//! The scenario tests wire a full interceptor chain (manual clock, in-memory
//! audit sink) to a terminal handler backed by the in-memory storage engine,
//! which is the same shape a deployed service has minus the HTTP boundary.

use async_trait::async_trait;
use gatehouse_pipeline::test_utils::{ManualTimeSource, MemoryAuditSink};
use gatehouse_pipeline::{
    InterceptorChain, Method, PipelineConfig, PipelineError, Principal, Request, Response,
    TerminalHandler,
};
use gatehouse_store::adapters::MemoryBackend;
use gatehouse_store::{
    Command, Query, QueryCache, QuerySignature, ResourceScope, ScopeConfig,
    TransactionalExecutor,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a test subscriber once per process (RUST_LOG controls verbosity).
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
        tracing::debug!("test tracing initialized");
    });
}

/// Terminal handler persisting chat messages through the transactional
/// resource layer and serving reads through the query cache.
pub struct MessageHandler {
    pub executor: TransactionalExecutor,
    pub cache: QueryCache,
}

impl MessageHandler {
    pub fn new(backend: Arc<MemoryBackend>) -> Self {
        let scope = ResourceScope::new(backend, ScopeConfig::default())
            .expect("default scope config is valid");
        Self {
            executor: TransactionalExecutor::new(Arc::new(scope)),
            cache: QueryCache::new(),
        }
    }
}

#[async_trait]
impl TerminalHandler for MessageHandler {
    async fn handle(&self, request: &Request) -> Result<Response, PipelineError> {
        match request.method {
            Method::Post => {
                let key = request.id.to_string();
                let mut fields = serde_json::Map::new();
                fields.insert("sender".into(), json!(request.principal_name()));
                fields.insert("path".into(), json!(request.path));
                self.executor
                    .execute_one(Command::Insert {
                        table: "messages".into(),
                        key: key.clone(),
                        fields,
                    })
                    .await
                    .map_err(PipelineError::handler)?;
                Ok(Response::ok(json!({ "stored": key })))
            }
            _ => {
                let query = Query::SelectAll {
                    table: "messages".into(),
                };
                let result = self
                    .cache
                    .get_or_run(QuerySignature::of(&query), || self.executor.query(&query))
                    .await
                    .map_err(PipelineError::handler)?;
                Ok(Response::ok(json!({ "messages": result.rows })))
            }
        }
    }
}

/// A fully wired chain plus handles to its moving parts.
pub struct Harness {
    pub chain: InterceptorChain,
    pub time: Arc<ManualTimeSource>,
    pub sink: Arc<MemoryAuditSink>,
    pub backend: Arc<MemoryBackend>,
}

impl Harness {
    pub fn new(config: PipelineConfig) -> Self {
        init_tracing();
        let time = Arc::new(ManualTimeSource::new());
        let sink = Arc::new(MemoryAuditSink::default());
        let backend = Arc::new(MemoryBackend::with_tables(&["messages", "users"]));
        let handler = Arc::new(MessageHandler::new(backend.clone()));
        let chain = InterceptorChain::from_config(config, sink.clone(), time.clone(), handler)
            .expect("test config is valid");
        Self {
            chain,
            time,
            sink,
            backend,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

/// POST to the message-send endpoint from a given client IP.
pub fn send_message(ip: &str, principal: Option<Principal>) -> Request {
    Request::new(Method::Post, "/api/chats/messages/", None, ip, principal)
}
