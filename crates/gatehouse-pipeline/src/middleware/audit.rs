//! Audit gate: logs every request, never rejects.
//!
//! An unavailable audit log must not take the service down with it: sink
//! failures are reported through tracing and the chain continues.

use crate::domain::types::Request;
use crate::middleware::{Gate, GateDecision};
use crate::ports::{AuditRecord, AuditSink, TimeSource};
use std::sync::Arc;
use tracing::warn;

/// Always-pass gate appending one audit record per request.
pub struct AuditGate {
    sink: Arc<dyn AuditSink>,
    time: Arc<dyn TimeSource>,
}

impl AuditGate {
    pub fn new(sink: Arc<dyn AuditSink>, time: Arc<dyn TimeSource>) -> Self {
        Self { sink, time }
    }
}

impl Gate for AuditGate {
    fn name(&self) -> &'static str {
        "audit"
    }

    fn check(&self, request: &Request) -> GateDecision {
        let record = AuditRecord {
            timestamp: self.time.now_utc(),
            principal: request.principal_name().to_string(),
            path: request.path.clone(),
        };

        if let Err(error) = self.sink.append(&record) {
            warn!(
                request_id = %request.id,
                path = %request.path,
                error = %error,
                "audit sink write failed; continuing"
            );
        }

        GateDecision::Pass
    }
}
