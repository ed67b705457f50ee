//! Test doubles for the pipeline's outbound ports.
//!
//! Usable from unit tests here and from the workspace test suite; none of
//! this is compiled into release binaries of downstream services unless they
//! opt in.

use crate::chain::TerminalHandler;
use crate::domain::error::PipelineError;
use crate::domain::types::{Request, Response};
use crate::middleware::{Gate, GateDecision};
use crate::ports::{AuditError, AuditRecord, AuditSink, TimeSource};
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::AtomicUsize;
use std::time::{Duration, Instant};

/// Collects rendered audit lines in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryAuditSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.lines.lock().push(record.render());
        Ok(())
    }
}

/// Sink that always fails, for exercising best-effort logging.
pub struct FailingAuditSink;

impl AuditSink for FailingAuditSink {
    fn append(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        Err(AuditError::Unavailable("sink offline".to_string()))
    }
}

/// Manually driven clock. Starts at a fixed instant and noon; tests advance
/// it explicitly, so no test ever sleeps.
pub struct ManualTimeSource {
    origin: Instant,
    state: Mutex<ManualState>,
}

struct ManualState {
    elapsed: Duration,
    time_of_day: NaiveTime,
    now_utc: DateTime<Utc>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ManualState {
                elapsed: Duration::ZERO,
                time_of_day: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN),
                now_utc: Utc::now(),
            }),
        }
    }

    /// Move the monotonic clock forward.
    pub fn advance(&self, by: Duration) {
        self.state.lock().elapsed += by;
    }

    pub fn set_time_of_day(&self, t: NaiveTime) {
        self.state.lock().time_of_day = t;
    }

    pub fn set_now_utc(&self, ts: DateTime<Utc>) {
        self.state.lock().now_utc = ts;
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn instant(&self) -> Instant {
        self.origin + self.state.lock().elapsed
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.state.lock().now_utc
    }

    fn time_of_day(&self) -> NaiveTime {
        self.state.lock().time_of_day
    }
}

/// Zero-side-effect terminal handler counting invocations.
#[derive(Default)]
pub struct CountingHandler {
    pub calls: AtomicUsize,
}

#[async_trait]
impl TerminalHandler for CountingHandler {
    async fn handle(&self, _request: &Request) -> Result<Response, PipelineError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(Response::ok(serde_json::json!({"handled": true})))
    }
}

/// Gate that denies everything, counting how often it was consulted.
pub struct DenyAllGate {
    label: &'static str,
    pub calls: AtomicUsize,
}

impl DenyAllGate {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Gate for DenyAllGate {
    fn name(&self) -> &'static str {
        self.label
    }

    fn check(&self, _request: &Request) -> GateDecision {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        GateDecision::deny(format!("denied by {}", self.label))
    }
}
