//! Periodic pruning of stale per-domain windows.
//!
//! The dispatcher only prunes when asked to. Servers that do not already have
//! a maintenance timer can spawn a [`CleanupTask`] next to the dispatcher.

use crate::application::dispatcher::Dispatcher;
use std::fmt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

/// Error returned when cleanup configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupConfigError {
    /// Cleanup period must be greater than zero
    ZeroPeriod,
}

impl fmt::Display for CleanupConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupConfigError::ZeroPeriod => write!(f, "cleanup period must be greater than 0"),
        }
    }
}

impl std::error::Error for CleanupConfigError {}

/// Spawns the periodic cleanup loop.
#[derive(Debug)]
pub struct CleanupTask {
    dispatcher: Dispatcher,
    period: Duration,
}

impl CleanupTask {
    /// Create a cleanup task running every `period`.
    ///
    /// # Errors
    /// Returns `CleanupConfigError::ZeroPeriod` if `period` is zero.
    pub fn new(dispatcher: Dispatcher, period: Duration) -> Result<Self, CleanupConfigError> {
        if period.is_zero() {
            return Err(CleanupConfigError::ZeroPeriod);
        }
        Ok(Self { dispatcher, period })
    }

    /// Cleanup period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start the loop on the dispatcher's runtime.
    ///
    /// Can be called from any thread. The first pass runs one period after
    /// the start.
    pub fn start(self) -> CleanupHandle {
        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        let span = tracing::debug_span!("notification_cleanup", period_secs = self.period.as_secs());

        let runtime = self.dispatcher.runtime().clone();
        let task = runtime.spawn(
            async move {
                let mut ticker = interval(self.period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick completes immediately
                ticker.tick().await;

                loop {
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        _ = ticker.tick() => {
                            self.dispatcher.cleanup();
                        }
                    }
                }
                debug!("notification cleanup stopped");
            }
            .instrument(span),
        );

        CleanupHandle { cancel, task }
    }

    /// Validate and start in one step.
    ///
    /// # Errors
    /// Same as [`CleanupTask::new`].
    pub fn spawn(dispatcher: Dispatcher, period: Duration) -> Result<CleanupHandle, CleanupConfigError> {
        Ok(Self::new(dispatcher, period)?.start())
    }
}

/// Handle to a running cleanup loop.
///
/// Dropping the handle leaves the loop running; call
/// [`CleanupHandle::shutdown`] to stop it.
#[derive(Debug)]
pub struct CleanupHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl CleanupHandle {
    /// Stop the loop and wait for it to exit.
    ///
    /// # Errors
    /// Returns the join error if the loop panicked or was aborted.
    pub async fn shutdown(self) -> Result<(), tokio::task::JoinError> {
        self.cancel.cancel();
        self.task.await
    }

    /// Check if the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
