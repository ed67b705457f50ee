//! Gatehouse pipeline - request interception for the messaging backend.
//!
//! Every incoming request passes through an ordered chain of gates before the
//! terminal handler runs:
//!
//! ```text
//! Request ──► Audit ──► TimeWindow ──► RateLimit ──► Rbac ──► Terminal handler
//!               │            │             │           │
//!               └── always   └─────── first denial short-circuits ──► Forbidden
//! ```
//!
//! - **Audit**: appends one record per request to an append-only sink;
//!   failures are swallowed, never blocking the chain.
//! - **TimeWindow**: rejects guarded paths outside the allowed time of day.
//! - **RateLimit**: sliding-window cap per client identity, atomic per client.
//! - **Rbac**: role resolution plus allowed-role policy on protected paths.
//!
//! Gates never block on I/O and share one chain instance across concurrent
//! requests. The only long-lived mutable state is the rate limiter's
//! per-client record map, mutated through per-key-atomic entry guards.
//!
//! # Usage
//!
//! ```ignore
//! use gatehouse_pipeline::{
//!     adapters::{FileAuditSink, SystemTimeSource},
//!     InterceptorChain, PipelineConfig,
//! };
//!
//! let config = PipelineConfig::default();
//! let sink = Arc::new(FileAuditSink::open(&config.audit.log_path)?);
//! let chain = InterceptorChain::from_config(config, sink, Arc::new(SystemTimeSource), handler)?;
//! let response = chain.handle(&request).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod chain;
pub mod domain;
pub mod middleware;
pub mod ports;
pub mod test_utils;

pub use chain::{InterceptorChain, TerminalHandler};
pub use domain::{
    derive_client_identity, ConfigError, Method, PipelineConfig, PipelineError, Principal,
    Request, Response, Role,
};
pub use middleware::{
    resolve_role, sweep_task, AuditGate, Gate, GateDecision, RateLimitGate, RbacGate,
    TimeWindowGate,
};
pub use ports::{AuditError, AuditRecord, AuditSink, TimeSource};
