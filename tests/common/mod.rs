//! Shared helpers for integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use rulematch_notify::infrastructure::mocks::MockClock;
use rulematch_notify::{Dispatcher, NotificationEvent, PushoverConfig, Reason};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub fn config(per_5min: u32, per_min: u32) -> PushoverConfig {
    PushoverConfig {
        enabled: true,
        app_token: "app-token".to_string(),
        user_key: "user-key".to_string(),
        rate_limit_per_5min: per_5min,
        global_rate_limit_per_min: per_min,
        ..PushoverConfig::default()
    }
}

/// Dispatcher on a mock clock, posting nowhere reachable.
pub fn offline_dispatcher(per_5min: u32, per_min: u32) -> (Dispatcher, MockClock) {
    let clock = MockClock::starting_now();
    let dispatcher = Dispatcher::builder(config(per_5min, per_min))
        .with_clock(Arc::new(clock.clone()))
        .with_endpoint("http://127.0.0.1:9/1/messages.json")
        .build()
        .unwrap();
    (dispatcher, clock)
}

pub fn event(domain: &str, reason: Reason, client_id: Option<&str>) -> NotificationEvent {
    NotificationEvent {
        domain: domain.to_string(),
        rule_text: format!("||{}^", domain),
        reason,
        client_ip: "192.168.1.42".parse().unwrap(),
        client_id: client_id.map(str::to_string),
        timestamp: Utc.with_ymd_and_hms(2024, 5, 17, 8, 15, 0).unwrap(),
    }
}

/// Wait until `done` holds, failing the test after five seconds.
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Decode an `application/x-www-form-urlencoded` body.
pub fn form_fields(body: &[u8]) -> BTreeMap<String, String> {
    serde_urlencoded::from_bytes(body).unwrap()
}
