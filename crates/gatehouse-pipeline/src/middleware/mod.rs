//! Gate stack for the interceptor chain.
//!
//! Gate order: Request → Audit → TimeWindow → RateLimit → Rbac → Handler
//!
//! Every gate is a synchronous check; none awaits. The audit gate's sink
//! append is the only gate side effect that touches I/O, and its failures
//! never block the chain. A gate either passes or short-circuits the chain
//! with a forbidden response.

pub mod audit;
pub mod rate_limit;
pub mod rbac;
pub mod time_window;

pub use audit::AuditGate;
pub use rate_limit::{sweep_task, RateLimitGate};
pub use rbac::{resolve_role, RbacGate};
pub use time_window::TimeWindowGate;

use crate::domain::types::Request;

/// Decision returned by a gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Continue to the next gate (or the terminal handler).
    Pass,
    /// Stop the chain and reject the request.
    Deny {
        /// Human-readable message naming the violated policy.
        message: String,
    },
}

impl GateDecision {
    pub fn deny(message: impl Into<String>) -> Self {
        GateDecision::Deny {
            message: message.into(),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, GateDecision::Pass)
    }
}

/// A pipeline stage that may reject a request or let it continue.
///
/// Implementations must be cheap and never block on I/O; side effects (such
/// as audit logging) happen exactly once per request because the chain calls
/// each gate at most once.
pub trait Gate: Send + Sync {
    /// Stable name for log correlation.
    fn name(&self) -> &'static str;

    /// Inspect the request and decide.
    fn check(&self, request: &Request) -> GateDecision;
}
