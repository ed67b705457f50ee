//! Interceptor chain: ordered gates ahead of one terminal handler.
//!
//! Gates run strictly in configured order. The first denial becomes a
//! forbidden response immediately; no later gate and no terminal handler
//! executes. Only if every gate passes does the terminal handler run.

use crate::domain::config::{ConfigError, PipelineConfig};
use crate::domain::error::PipelineError;
use crate::domain::types::{Request, Response};
use crate::middleware::{AuditGate, Gate, GateDecision, RateLimitGate, RbacGate, TimeWindowGate};
use crate::ports::{AuditSink, TimeSource};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// The operation executed once all gates pass.
///
/// Handlers typically drive the transactional resource layer; their failures
/// propagate unchanged through [`InterceptorChain::handle`].
#[async_trait]
pub trait TerminalHandler: Send + Sync {
    async fn handle(&self, request: &Request) -> Result<Response, PipelineError>;
}

/// Ordered gate pipeline with one terminal handler.
pub struct InterceptorChain {
    gates: Vec<Arc<dyn Gate>>,
    terminal: Arc<dyn TerminalHandler>,
}

impl InterceptorChain {
    /// Compose an explicit gate list. Order is preserved exactly.
    pub fn new(gates: Vec<Arc<dyn Gate>>, terminal: Arc<dyn TerminalHandler>) -> Self {
        Self { gates, terminal }
    }

    /// Build the canonical stack from configuration:
    /// Audit → TimeWindow → RateLimit → Rbac → terminal.
    ///
    /// Fails fast on invalid policy, before any traffic is served.
    pub fn from_config(
        config: PipelineConfig,
        sink: Arc<dyn AuditSink>,
        time: Arc<dyn TimeSource>,
        terminal: Arc<dyn TerminalHandler>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let gates: Vec<Arc<dyn Gate>> = vec![
            Arc::new(AuditGate::new(sink, Arc::clone(&time))),
            Arc::new(TimeWindowGate::new(config.time, Arc::clone(&time))),
            Arc::new(RateLimitGate::new(config.rate, time)),
            Arc::new(RbacGate::new(config.rbac)),
        ];
        Ok(Self::new(gates, terminal))
    }

    /// Run one request through the chain.
    ///
    /// Deterministic: identical request and identical gate state always yield
    /// the same decision. Gate side effects occur exactly once per request
    /// because each gate is consulted at most once.
    pub async fn handle(&self, request: &Request) -> Result<Response, PipelineError> {
        for gate in &self.gates {
            match gate.check(request) {
                GateDecision::Pass => {}
                GateDecision::Deny { message } => {
                    debug!(
                        request_id = %request.id,
                        gate = gate.name(),
                        "request short-circuited"
                    );
                    return Ok(Response::forbidden(message));
                }
            }
        }
        self.terminal.handle(request).await
    }
}
