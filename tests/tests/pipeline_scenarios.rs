//! Scenario tests for the interceptor chain: rate limiting, time window,
//! RBAC, and short-circuit ordering, run against a fully wired stack.

use chrono::NaiveTime;
use gatehouse_pipeline::{Method, PipelineConfig, Principal, Request, Response};
use gatehouse_tests::{send_message, Harness};
use std::time::Duration;

fn at_noon(harness: &Harness) {
    harness
        .time
        .set_time_of_day(NaiveTime::from_hms_opt(12, 0, 0).unwrap());
}

#[tokio::test]
async fn rate_limit_scenario_five_per_minute() {
    let harness = Harness::default();
    at_noon(&harness);

    // Five POSTs within 10 seconds are all admitted.
    for i in 0..5 {
        harness.time.advance(Duration::from_secs(2));
        let response = harness
            .chain
            .handle(&send_message("1.2.3.4", None))
            .await
            .unwrap();
        assert!(!response.is_forbidden(), "message {i} should be admitted");
    }

    // A sixth within the same window is rejected.
    let response = harness
        .chain
        .handle(&send_message("1.2.3.4", None))
        .await
        .unwrap();
    match response {
        Response::Forbidden { message } => {
            assert!(message.contains("Rate limit exceeded"));
            assert!(message.contains("5 messages per 1 minute(s)"));
        }
        Response::Ok { .. } => panic!("sixth message must be rejected"),
    }

    // After 61 seconds a new POST is admitted again.
    harness.time.advance(Duration::from_secs(61));
    let response = harness
        .chain
        .handle(&send_message("1.2.3.4", None))
        .await
        .unwrap();
    assert!(!response.is_forbidden());
}

#[tokio::test]
async fn time_window_scenario() {
    let harness = Harness::default();

    // 22:00 to a guarded path: rejected.
    harness
        .time
        .set_time_of_day(NaiveTime::from_hms_opt(22, 0, 0).unwrap());
    let request = Request::new(Method::Get, "/chats/messages/", None, "1.2.3.4", None);
    let response = harness.chain.handle(&request).await.unwrap();
    assert!(response.is_forbidden());

    // Noon to the same path: admitted.
    at_noon(&harness);
    let request = Request::new(Method::Get, "/chats/messages/", None, "1.2.3.4", None);
    let response = harness.chain.handle(&request).await.unwrap();
    assert!(!response.is_forbidden());

    // 22:00 to an unguarded path: admitted.
    harness
        .time
        .set_time_of_day(NaiveTime::from_hms_opt(22, 0, 0).unwrap());
    let request = Request::new(Method::Get, "/public/", None, "1.2.3.4", None);
    let response = harness.chain.handle(&request).await.unwrap();
    assert!(!response.is_forbidden());
}

#[tokio::test]
async fn rbac_scenario() {
    let harness = Harness::default();
    at_noon(&harness);

    // Authenticated plain user on /admin/: rejected.
    let request = Request::new(
        Method::Get,
        "/admin/reports/",
        None,
        "1.2.3.4",
        Some(Principal::named("joe")),
    );
    match harness.chain.handle(&request).await.unwrap() {
        Response::Forbidden { message } => {
            assert!(message.contains("admin or moderator"));
            assert!(message.contains("user"));
        }
        Response::Ok { .. } => panic!("plain user must not reach /admin/"),
    }

    // Superuser with no explicit role resolves to admin: admitted.
    let root = Principal {
        is_superuser: true,
        ..Principal::named("root")
    };
    let request = Request::new(Method::Get, "/admin/reports/", None, "1.2.3.4", Some(root));
    let response = harness.chain.handle(&request).await.unwrap();
    assert!(!response.is_forbidden());
}

#[tokio::test]
async fn every_request_is_audited_exactly_once() {
    let harness = Harness::default();
    at_noon(&harness);

    // Admitted request.
    harness
        .chain
        .handle(&send_message("1.2.3.4", Some(Principal::named("alice"))))
        .await
        .unwrap();
    // Denied request (outside hours).
    harness
        .time
        .set_time_of_day(NaiveTime::from_hms_opt(23, 0, 0).unwrap());
    harness
        .chain
        .handle(&send_message("1.2.3.4", None))
        .await
        .unwrap();

    let lines = harness.sink.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("User: alice"));
    assert!(lines[1].contains("User: Anonymous"));
}

#[tokio::test]
async fn denied_post_writes_nothing_to_the_store() {
    let mut config = PipelineConfig::default();
    config.rate.max_events = 1;
    let harness = Harness::new(config);
    at_noon(&harness);

    let ok = harness
        .chain
        .handle(&send_message("9.9.9.9", None))
        .await
        .unwrap();
    assert!(!ok.is_forbidden());

    let denied = harness
        .chain
        .handle(&send_message("9.9.9.9", None))
        .await
        .unwrap();
    assert!(denied.is_forbidden());

    // Only the admitted request reached the terminal handler.
    assert_eq!(harness.backend.committed_rows("messages"), Some(1));
}

#[tokio::test]
async fn concurrent_clients_do_not_interfere() {
    let harness = std::sync::Arc::new(Harness::default());
    at_noon(&harness);

    let mut handles = Vec::new();
    for client in 0..4u8 {
        let harness = harness.clone();
        handles.push(tokio::spawn(async move {
            let ip = format!("10.0.0.{client}");
            let mut admitted = 0u32;
            for _ in 0..8 {
                let response = harness.chain.handle(&send_message(&ip, None)).await.unwrap();
                if !response.is_forbidden() {
                    admitted += 1;
                }
            }
            admitted
        }));
    }

    for handle in handles {
        // Each client gets its own budget of 5 within the window.
        assert_eq!(handle.await.unwrap(), 5);
    }
}
