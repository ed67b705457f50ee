//! Time-of-day gate for guarded path prefixes.
//!
//! Requests to guarded paths are admitted only while the local time of day
//! falls inside `[allowed_start, allowed_end)`. The deployed policy keeps
//! messaging open 6 AM - 9 PM; both bounds are configurable and a window
//! crossing midnight is handled explicitly.

use crate::domain::config::TimeWindowConfig;
use crate::domain::types::Request;
use crate::middleware::{Gate, GateDecision};
use crate::ports::TimeSource;
use chrono::NaiveTime;
use std::sync::Arc;
use tracing::debug;

/// Rejects guarded requests outside the allowed time-of-day interval.
pub struct TimeWindowGate {
    config: TimeWindowConfig,
    time: Arc<dyn TimeSource>,
}

impl TimeWindowGate {
    pub fn new(config: TimeWindowConfig, time: Arc<dyn TimeSource>) -> Self {
        Self { config, time }
    }

    fn guards(&self, path: &str) -> bool {
        self.config
            .guarded_prefixes
            .iter()
            .any(|prefix| path.contains(prefix.as_str()))
    }

    /// Inside `[start, end)`, with explicit wraparound: when the window
    /// crosses midnight (`start > end`), `t` is inside when `start <= t`
    /// OR `t < end`.
    fn is_inside(&self, t: NaiveTime) -> bool {
        let (start, end) = (self.config.allowed_start, self.config.allowed_end);
        if start <= end {
            start <= t && t < end
        } else {
            start <= t || t < end
        }
    }
}

impl Gate for TimeWindowGate {
    fn name(&self) -> &'static str {
        "time_window"
    }

    fn check(&self, request: &Request) -> GateDecision {
        if !self.guards(&request.path) {
            return GateDecision::Pass;
        }

        let now = self.time.time_of_day();
        if self.is_inside(now) {
            return GateDecision::Pass;
        }

        debug!(
            request_id = %request.id,
            path = %request.path,
            time_of_day = %now.format("%H:%M:%S"),
            "request outside allowed hours"
        );
        GateDecision::deny(format!(
            "Access to messaging services is restricted outside allowed hours ({} - {}). \
             Please try again during allowed hours.",
            self.config.allowed_start.format("%H:%M"),
            self.config.allowed_end.format("%H:%M"),
        ))
    }
}
