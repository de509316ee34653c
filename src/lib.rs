//! # rulematch-notify
//!
//! Rate-limited push notifications for DNS filtering rule matches.
//!
//! When a query matches a filtering rule, the resolver asks a [`Dispatcher`]
//! whether an alert may go out. Two independent gates decide:
//!
//! - a **global** gate spacing notifications across all domains
//!   (`global_rate_limit_per_min`), checked first;
//! - a **per-domain** gate spacing notifications for the same domain
//!   (`rate_limit_per_5min`), checked only if the global gate admitted.
//!
//! Admitted events are posted to [Pushover](https://pushover.net) on a
//! detached Tokio task. Delivery is best effort: one attempt, a 10 second
//! timeout, failures logged and dropped. Nothing on the dispatch path can
//! fail or slow down resolution.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rulematch_notify::{Dispatcher, MatchedRule, PushoverConfig, Reason, RuleMatch};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PushoverConfig {
//!     enabled: true,
//!     app_token: "azGDORePK8gMaC0QOYAMyEEuzJnyUi".to_string(),
//!     user_key: "uQiRzpo4DXghDmr9QzzfQu27cmVRsG".to_string(),
//!     rate_limit_per_5min: 1,
//!     global_rate_limit_per_min: 2,
//!     ..PushoverConfig::default()
//! };
//!
//! if let Some(dispatcher) = Dispatcher::from_config(&config)? {
//!     // Called by the resolver on a rule match; never blocks
//!     dispatcher.process_match(&RuleMatch {
//!         host: "ads.example.com".to_string(),
//!         rules: vec![MatchedRule::new("||ads.example.com^")],
//!         reason: Reason::FilteredBlockList,
//!         client_ip: "192.168.1.10".parse()?,
//!         client_id: Some("living-room-tv".to_string()),
//!     });
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Driving the gates directly
//!
//! ```rust,no_run
//! # use rulematch_notify::{Admission, Dispatcher, NotificationEvent, PushoverConfig, Reason};
//! # async fn run(dispatcher: Dispatcher) {
//! match dispatcher.should_notify("ads.example.com") {
//!     Admission::Admitted => dispatcher.send_async(NotificationEvent {
//!         domain: "ads.example.com".to_string(),
//!         rule_text: "||ads.example.com^".to_string(),
//!         reason: Reason::FilteredBlockList,
//!         client_ip: "192.168.1.10".parse().unwrap(),
//!         client_id: None,
//!         timestamp: chrono::Utc::now(),
//!     }),
//!     Admission::Blocked(scope) => tracing::debug!(limit_type = %scope, "rate limited"),
//! }
//! # }
//! ```
//!
//! ## Intervals
//!
//! A rate of `n > 1` per period spaces admissions `period / n` apart. Rates of
//! 0 and 1 both mean one per full period:
//!
//! | Setting | Value | Minimum spacing |
//! |---------|-------|-----------------|
//! | `rate_limit_per_5min` | 0 or 1 | 5 minutes per domain |
//! | `rate_limit_per_5min` | 5 | 1 minute per domain |
//! | `global_rate_limit_per_min` | 0 or 1 | 1 minute overall |
//! | `global_rate_limit_per_min` | 4 | 15 seconds overall |
//!
//! A domain that keeps matching while the global gate is closed does not move
//! its own window, because its gate is never consulted during that time.
//!
//! ## Housekeeping
//!
//! Per-domain windows are kept until [`Dispatcher::cleanup`] removes those
//! idle for more than twice the domain interval. Call it from an existing
//! maintenance timer, or spawn a [`CleanupTask`]:
//!
//! ```rust,no_run
//! # use rulematch_notify::{CleanupTask, Dispatcher};
//! # use std::time::Duration;
//! # async fn run(dispatcher: Dispatcher) {
//! let cleanup = CleanupTask::spawn(dispatcher.clone(), Duration::from_secs(600)).unwrap();
//! // ... on server stop:
//! dispatcher.shutdown();
//! cleanup.shutdown().await.unwrap();
//! # }
//! ```
//!
//! ## Observability
//!
//! Every decision is logged through `tracing` (denials at DEBUG with a
//! `limit_type` field, delivery failures at ERROR with `domain` and `error`)
//! and counted in [`DispatchMetrics`].

// Domain layer - pure logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

pub use domain::{
    admission::{Admission, LimitScope},
    config::{NotificationsConfig, PushoverConfig},
    event::{NotificationEvent, Reason},
    window::RateWindow,
};

pub use application::{
    cleanup::{CleanupConfigError, CleanupHandle, CleanupTask},
    dispatcher::{BuildError, Dispatcher, DispatcherBuilder},
    limiter::{DomainLimiter, GlobalLimiter},
    metrics::{DispatchMetrics, MetricsSnapshot},
    ports::{Clock, Storage},
    producer::{MatchOutcome, MatchedRule, RuleMatch},
};

pub use infrastructure::{
    clock::SystemClock,
    pushover::{PushoverClient, PushoverMessage, SendError},
    storage::ShardedStorage,
};

pub use tokio_util::sync::CancellationToken;
