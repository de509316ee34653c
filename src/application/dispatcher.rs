//! Rate-limited, fire-and-forget notification dispatch.
//!
//! The dispatcher composes the global and per-domain gates into a single
//! admission decision and ships admitted events to Pushover on detached
//! background tasks, so the resolution path never waits on the network.
//!
//! # Lock ordering
//!
//! The global gate is always evaluated first and its lock is released before
//! the per-domain gate takes its shard lock. No code path holds both, which
//! rules out lock-ordering deadlocks between the two tiers.

use crate::application::limiter::{DomainLimiter, GlobalLimiter};
use crate::application::metrics::DispatchMetrics;
use crate::application::ports::Clock;
use crate::domain::admission::{Admission, LimitScope};
use crate::domain::config::PushoverConfig;
use crate::domain::event::NotificationEvent;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::pushover::{
    PushoverClient, PushoverMessage, SendError, DEFAULT_TIMEOUT, PUSHOVER_API_URL,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, Instrument};

/// Product name put in front of every notification title.
pub const DEFAULT_TITLE_PREFIX: &str = "AdGuard";

/// Error returned when building a `Dispatcher` fails.
#[derive(Debug)]
pub enum BuildError {
    /// No runtime handle was given and the builder ran outside a Tokio runtime
    NoRuntime,
    /// The HTTP client could not be constructed
    HttpClient(reqwest::Error),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::NoRuntime => {
                write!(f, "no tokio runtime available to run background sends")
            }
            BuildError::HttpClient(e) => write!(f, "building http client: {}", e),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::HttpClient(e) => Some(e),
            BuildError::NoRuntime => None,
        }
    }
}

/// Builder for constructing a `Dispatcher`.
pub struct DispatcherBuilder {
    config: PushoverConfig,
    clock: Option<Arc<dyn Clock>>,
    endpoint: String,
    timeout: Duration,
    title_prefix: String,
    runtime: Option<Handle>,
}

impl DispatcherBuilder {
    fn new(config: PushoverConfig) -> Self {
        Self {
            config,
            clock: None,
            endpoint: PUSHOVER_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            title_prefix: DEFAULT_TITLE_PREFIX.to_string(),
            runtime: None,
        }
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Post to a different endpoint than the public Pushover API.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the per-request timeout.
    ///
    /// Default: 10 seconds
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the product name shown at the start of every title.
    ///
    /// Default: `"AdGuard"`
    pub fn with_title_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.title_prefix = prefix.into();
        self
    }

    /// Run background sends on a specific runtime.
    ///
    /// Without this, `build()` captures the runtime it is called from, which
    /// lets the dispatcher be used from threads outside the runtime afterwards.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the dispatcher.
    ///
    /// # Errors
    /// Returns `BuildError` if no runtime is available or the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<Dispatcher, BuildError> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| BuildError::NoRuntime)?,
        };
        let client =
            PushoverClient::new(self.endpoint, self.timeout).map_err(BuildError::HttpClient)?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));

        let inner = DispatcherInner {
            global: GlobalLimiter::new(self.config.global_rate_limit_per_min, clock.clone()),
            domains: DomainLimiter::new(self.config.rate_limit_per_5min, clock),
            config: self.config,
            title_prefix: self.title_prefix,
            client,
            metrics: DispatchMetrics::new(),
            runtime,
            shutdown: CancellationToken::new(),
        };

        Ok(Dispatcher {
            inner: Arc::new(inner),
        })
    }
}

/// Rate-limited Pushover notifier.
///
/// Cheap to clone; clones share limiters, client, metrics and lifecycle.
/// Construct one at server start and hand clones to the resolution pipeline.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Debug)]
struct DispatcherInner {
    config: PushoverConfig,
    title_prefix: String,
    global: GlobalLimiter,
    domains: DomainLimiter,
    client: PushoverClient,
    metrics: DispatchMetrics,
    runtime: Handle,
    shutdown: CancellationToken,
}

impl Dispatcher {
    /// Start building a dispatcher from Pushover settings.
    ///
    /// The `enabled` flag is not consulted here; see [`Dispatcher::from_config`].
    pub fn builder(config: PushoverConfig) -> DispatcherBuilder {
        DispatcherBuilder::new(config)
    }

    /// Build a dispatcher with default options if notifications are enabled.
    ///
    /// # Errors
    /// Same as [`DispatcherBuilder::build`].
    pub fn from_config(config: &PushoverConfig) -> Result<Option<Self>, BuildError> {
        if !config.enabled {
            debug!("pushover notifications disabled");
            return Ok(None);
        }

        let dispatcher = Self::builder(config.clone()).build()?;
        info!(
            domain_interval_secs = dispatcher.domain_interval().as_secs_f64(),
            global_interval_secs = dispatcher.global_interval().as_secs_f64(),
            "pushover notifications enabled"
        );
        Ok(Some(dispatcher))
    }

    /// Decide whether a notification for `domain` may be sent.
    ///
    /// The global gate is consulted first. When it denies, the per-domain
    /// gate is not consulted at all, so a domain's own window only moves
    /// while the global gate is open. When the global gate admits but the
    /// domain gate denies, the global admission still stands.
    pub fn should_notify(&self, domain: &str) -> Admission {
        if !self.inner.global.should_notify() {
            self.inner.metrics.record_blocked_by_global();
            return Admission::Blocked(LimitScope::Global);
        }

        if !self.inner.domains.should_notify(domain) {
            self.inner.metrics.record_blocked_by_domain();
            return Admission::Blocked(LimitScope::Domain);
        }

        self.inner.metrics.record_admitted();
        Admission::Admitted
    }

    /// Send a notification on a detached background task.
    ///
    /// Returns immediately. Failures are logged and dropped.
    pub fn send_async(&self, event: NotificationEvent) {
        self.send_async_with_cancel(event, CancellationToken::new());
    }

    /// Like [`Dispatcher::send_async`], but abandons the send once `cancel`
    /// fires.
    ///
    /// Cancellation only takes effect at the task's next poll, so a send that
    /// has already been issued may still reach the sink.
    pub fn send_async_with_cancel(&self, event: NotificationEvent, cancel: CancellationToken) {
        if self.inner.shutdown.is_cancelled() {
            self.inner.metrics.record_cancelled();
            debug!(domain = %event.domain, "dispatcher shut down, dropping notification");
            return;
        }

        let dispatcher = self.clone();
        let task = async move {
            let shutdown = dispatcher.inner.shutdown.clone();
            let result = tokio::select! {
                biased;
                _ = shutdown.cancelled() => Err(SendError::Cancelled),
                _ = cancel.cancelled() => Err(SendError::Cancelled),
                result = dispatcher.send(&event) => result,
            };

            match result {
                Ok(()) => {}
                Err(SendError::Cancelled) => {
                    dispatcher.inner.metrics.record_cancelled();
                    debug!(domain = %event.domain, "pushover notification cancelled");
                }
                Err(err) => {
                    error!(
                        domain = %event.domain,
                        error = %err,
                        "sending pushover notification"
                    );
                }
            }
        };

        self.inner
            .runtime
            .spawn(task.in_current_span().with_current_subscriber());
    }

    /// Format and post one notification, waiting for the outcome.
    ///
    /// # Errors
    /// Returns `SendError` on transport errors, timeouts and any status
    /// other than 200.
    pub async fn send(&self, event: &NotificationEvent) -> Result<(), SendError> {
        let config = &self.inner.config;
        let message = PushoverMessage {
            token: &config.app_token,
            user: &config.user_key,
            title: event.title(&self.inner.title_prefix),
            message: event.message(),
            priority: config.priority,
            sound: &config.sound,
        };

        match self.inner.client.post(&message).await {
            Ok(()) => {
                self.inner.metrics.record_sent();
                debug!(
                    domain = %event.domain,
                    reason = %event.reason,
                    "pushover notification sent"
                );
                Ok(())
            }
            Err(err) => {
                self.inner.metrics.record_failed();
                Err(err)
            }
        }
    }

    /// Drop per-domain windows that can no longer deny anything.
    ///
    /// Safe to call at any time, concurrently with admission checks.
    ///
    /// # Returns
    /// The number of windows removed
    pub fn cleanup(&self) -> usize {
        let removed = self.inner.domains.cleanup();
        if removed > 0 {
            self.inner.metrics.record_pruned(removed);
            debug!(removed, "removed stale notification rate windows");
        }
        removed
    }

    /// Abandon pending sends and refuse new ones.
    ///
    /// Admission checks keep working.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.is_cancelled() {
            info!("shutting down pushover dispatcher");
            self.inner.shutdown.cancel();
        }
    }

    /// Check if [`Dispatcher::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &DispatchMetrics {
        &self.inner.metrics
    }

    /// Get the settings the dispatcher was built with.
    pub fn config(&self) -> &PushoverConfig {
        &self.inner.config
    }

    /// Minimum spacing between two notifications for one domain.
    pub fn domain_interval(&self) -> Duration {
        self.inner.domains.interval()
    }

    /// Minimum spacing between two notifications overall.
    pub fn global_interval(&self) -> Duration {
        self.inner.global.interval()
    }

    /// Number of domains with a live rate window.
    pub fn tracked_domains(&self) -> usize {
        self.inner.domains.len()
    }

    /// Endpoint notifications are posted to.
    pub fn endpoint(&self) -> &str {
        self.inner.client.endpoint()
    }

    /// Runtime background work is spawned on.
    pub(crate) fn runtime(&self) -> &Handle {
        &self.inner.runtime
    }
}
