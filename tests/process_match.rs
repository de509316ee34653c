//! End-to-end path from a filter result to the sink.

mod common;

use common::{config, form_fields, wait_until};
use rulematch_notify::infrastructure::mocks::{MockCaptureLayer, MockClock};
use rulematch_notify::{
    Dispatcher, LimitScope, MatchOutcome, MatchedRule, Reason, RuleMatch,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rule_match(host: &str, rules: &[&str], reason: Reason, client_id: Option<&str>) -> RuleMatch {
    RuleMatch {
        host: host.to_string(),
        rules: rules.iter().map(|text| MatchedRule::new(*text)).collect(),
        reason,
        client_ip: "10.1.2.3".parse().unwrap(),
        client_id: client_id.map(str::to_string),
    }
}

async fn setup(per_5min: u32, per_min: u32) -> (Dispatcher, MockClock, MockServer) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let clock = MockClock::starting_now();
    let dispatcher = Dispatcher::builder(config(per_5min, per_min))
        .with_endpoint(format!("{}/1/messages.json", server.uri()))
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();
    (dispatcher, clock, server)
}

#[tokio::test]
async fn test_match_is_delivered() {
    let (dispatcher, _clock, server) = setup(1, 1).await;

    let outcome = dispatcher.process_match(&rule_match(
        "cdn.example.net",
        &["||cdn.example.net^$dnsrewrite=10.0.0.1"],
        Reason::RewrittenRule,
        Some("kids-tablet"),
    ));
    assert_eq!(outcome, MatchOutcome::Dispatched);

    wait_until(|| dispatcher.metrics().sent() == 1).await;
    let requests = server.received_requests().await.unwrap();
    let fields = form_fields(&requests[0].body);
    assert_eq!(fields["title"], "AdGuard: Domain Rewritten");
    assert!(fields["message"].starts_with("Domain: cdn.example.net\n"));
    assert!(fields["message"].contains("Client: kids-tablet (10.1.2.3)\n"));
}

#[tokio::test]
async fn test_only_first_rule_is_reported() {
    let capture = MockCaptureLayer::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let (dispatcher, _clock, _server) = setup(1, 1).await;

    dispatcher.process_match(&rule_match(
        "ads.example.com",
        &["||ads.example.com^", "||example.com^", "/ads/"],
        Reason::FilteredBlockList,
        None,
    ));

    let lines = capture.with_message("sending pushover notification");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].level, Level::DEBUG);
    assert_eq!(lines[0].fields["rule"], "||ads.example.com^");
    assert_eq!(lines[0].fields["reason"], "filtered_blocklist");
}

#[tokio::test]
async fn test_rate_limited_match_is_logged_and_not_sent() {
    let capture = MockCaptureLayer::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let (dispatcher, clock, server) = setup(1, 1).await;
    let matched = rule_match("a.com", &["||a.com^"], Reason::FilteredBlockList, None);

    assert_eq!(dispatcher.process_match(&matched), MatchOutcome::Dispatched);
    clock.advance(Duration::from_secs(1));
    assert_eq!(
        dispatcher.process_match(&matched),
        MatchOutcome::RateLimited(LimitScope::Global)
    );

    let limited = capture.with_message("notification rate limited");
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].fields["domain"], "a.com");
    assert_eq!(limited[0].fields["limit_type"], "global");

    wait_until(|| dispatcher.metrics().sent() == 1).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_match_without_rules_is_ignored() {
    let (dispatcher, _clock, server) = setup(1, 1).await;

    assert_eq!(
        dispatcher.process_match(&rule_match("a.com", &[], Reason::NotFilteredNotFound, None)),
        MatchOutcome::NoRules
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(dispatcher.metrics().admitted(), 0);
}
