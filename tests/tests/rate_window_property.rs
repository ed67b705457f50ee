//! Property: for any event sequence, the number of admitted events inside
//! any window of the configured duration never exceeds `max_events`.

use gatehouse_pipeline::test_utils::ManualTimeSource;
use gatehouse_pipeline::{
    domain::config::RateLimitConfig, Gate, Method, RateLimitGate, Request,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const WINDOW_SECS: u64 = 60;
const MAX_EVENTS: u32 = 5;

fn send(ip: &str) -> Request {
    Request::new(Method::Post, "/api/chats/messages/", None, ip, None)
}

proptest! {
    #[test]
    fn admitted_events_never_exceed_cap_in_any_window(
        // Gaps between consecutive attempts, in seconds.
        gaps in proptest::collection::vec(0u64..40, 1..80),
        client in "[a-d]",
    ) {
        let time = Arc::new(ManualTimeSource::new());
        let gate = RateLimitGate::new(
            RateLimitConfig {
                max_events: MAX_EVENTS,
                window: Duration::from_secs(WINDOW_SECS),
                ..RateLimitConfig::default()
            },
            time.clone(),
        );

        let mut clock = 0u64;
        let mut admitted_at: Vec<u64> = Vec::new();

        for gap in gaps {
            clock += gap;
            time.advance(Duration::from_secs(gap));
            if gate.check(&send(&client)).is_pass() {
                admitted_at.push(clock);
            }
        }

        // Slide a window over every admission and count admissions inside
        // (window is half-open: (t - WINDOW, t]).
        for (i, &end) in admitted_at.iter().enumerate() {
            let start = end.saturating_sub(WINDOW_SECS - 1);
            let inside = admitted_at[..=i]
                .iter()
                .filter(|&&t| t >= start)
                .count();
            prop_assert!(
                inside <= MAX_EVENTS as usize,
                "window ending at {end}s admitted {inside} events"
            );
        }
    }

    #[test]
    fn full_gap_always_readmits(burst in 1u32..20) {
        let time = Arc::new(ManualTimeSource::new());
        let gate = RateLimitGate::new(
            RateLimitConfig {
                max_events: MAX_EVENTS,
                window: Duration::from_secs(WINDOW_SECS),
                ..RateLimitConfig::default()
            },
            time.clone(),
        );

        for _ in 0..burst {
            let _ = gate.check(&send("1.1.1.1"));
        }
        time.advance(Duration::from_secs(WINDOW_SECS + 1));
        prop_assert!(gate.check(&send("1.1.1.1")).is_pass());
    }
}
