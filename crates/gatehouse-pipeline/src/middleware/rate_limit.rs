//! Sliding-window rate limiting per client identity.
//!
//! Keeps one timestamp log per client in a concurrent map. Prune, check, and
//! append happen while holding that client's map entry, so admission is
//! atomic per client; distinct clients only contend on map shard access.
//!
//! An admitted slot is consumed even if the caller later abandons the
//! request: recorded timestamps are never rolled back.

use crate::domain::config::RateLimitConfig;
use crate::domain::types::Request;
use crate::middleware::{Gate, GateDecision};
use crate::ports::TimeSource;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Per-client event history, pruned to the active window on every access.
struct ClientRateRecord {
    /// Admitted event timestamps, oldest first.
    events: VecDeque<Instant>,
    /// Last time this client was seen, for idle eviction.
    last_seen: Instant,
}

impl ClientRateRecord {
    fn new(now: Instant) -> Self {
        Self {
            events: VecDeque::new(),
            last_seen: now,
        }
    }

    /// Drop timestamps older than `now - window`.
    fn prune(&mut self, now: Instant, window: Duration) {
        // checked_sub: `now` may be closer to the clock's origin than one
        // whole window, in which case nothing can be stale yet.
        let Some(cutoff) = now.checked_sub(window) else {
            return;
        };
        while let Some(front) = self.events.front() {
            if *front < cutoff {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Enforces a sliding-window cap on events per client identity.
pub struct RateLimitGate {
    records: DashMap<String, ClientRateRecord>,
    config: RateLimitConfig,
    time: Arc<dyn TimeSource>,
}

impl RateLimitGate {
    pub fn new(config: RateLimitConfig, time: Arc<dyn TimeSource>) -> Self {
        Self {
            records: DashMap::new(),
            config,
            time,
        }
    }

    /// The limit applies only to the configured method + path patterns.
    fn applies(&self, request: &Request) -> bool {
        request.method == self.config.method
            && self
                .config
                .path_patterns
                .iter()
                .any(|pattern| request.path.contains(pattern.as_str()))
    }

    /// Remove clients with no events seen within `max_age` (call periodically).
    pub fn sweep_idle(&self, max_age: Duration) {
        let now = self.time.instant();
        let Some(cutoff) = now.checked_sub(max_age) else {
            return;
        };
        self.records.retain(|client, record| {
            if record.last_seen < cutoff {
                debug!(client = %client, "evicting idle rate record");
                false
            } else {
                true
            }
        });
    }

    /// Number of distinct clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.records.len()
    }

    fn window_description(&self) -> String {
        let secs = self.config.window.as_secs();
        if secs >= 60 && secs % 60 == 0 {
            format!("{} minute(s)", secs / 60)
        } else {
            format!("{} second(s)", secs)
        }
    }
}

impl Gate for RateLimitGate {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn check(&self, request: &Request) -> GateDecision {
        if !self.applies(request) {
            return GateDecision::Pass;
        }

        let now = self.time.instant();

        // The entry guard holds this client's shard lock for the whole
        // prune/check/append sequence: no lost updates, no double admission.
        let mut record = self
            .records
            .entry(request.client_identity.clone())
            .or_insert_with(|| ClientRateRecord::new(now));
        record.last_seen = now;
        record.prune(now, self.config.window);

        if record.events.len() >= self.config.max_events as usize {
            drop(record);
            warn!(
                request_id = %request.id,
                client = %request.client_identity,
                max_events = self.config.max_events,
                "rate limit exceeded"
            );
            return GateDecision::deny(format!(
                "Rate limit exceeded. You can only send {} messages per {}. \
                 Please wait before sending more messages.",
                self.config.max_events,
                self.window_description(),
            ));
        }

        record.events.push_back(now);
        GateDecision::Pass
    }
}

/// Background task evicting idle clients on a fixed interval.
pub async fn sweep_task(gate: Arc<RateLimitGate>, interval: Duration, max_age: Duration) {
    let mut sweep_interval = tokio::time::interval(interval);
    sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        sweep_interval.tick().await;
        gate.sweep_idle(max_age);
    }
}
