//! Pushover notification settings.
//!
//! Mirrors the `notifications.pushover` section of the server configuration.
//! Values are passed through as given; nothing here validates credentials,
//! priorities or rates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Enclosing `notifications` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Pushover settings
    pub pushover: PushoverConfig,
}

/// Pushover settings consumed by the dispatcher.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushoverConfig {
    /// Whether rule-match notifications are sent at all
    pub enabled: bool,
    /// Pushover application API token
    pub app_token: String,
    /// Pushover user or group key
    pub user_key: String,
    /// Maximum notifications per domain per 5 minutes
    pub rate_limit_per_5min: u32,
    /// Maximum notifications per minute across all domains
    pub global_rate_limit_per_min: u32,
    /// Message priority, -2 to 2. Zero is not sent.
    pub priority: i32,
    /// Notification sound. Empty is not sent.
    pub sound: String,
}

impl Default for PushoverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            app_token: String::new(),
            user_key: String::new(),
            rate_limit_per_5min: 1,
            global_rate_limit_per_min: 1,
            priority: 0,
            sound: String::new(),
        }
    }
}

impl fmt::Debug for PushoverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushoverConfig")
            .field("enabled", &self.enabled)
            .field("app_token", &redact(&self.app_token))
            .field("user_key", &redact(&self.user_key))
            .field("rate_limit_per_5min", &self.rate_limit_per_5min)
            .field("global_rate_limit_per_min", &self.global_rate_limit_per_min)
            .field("priority", &self.priority)
            .field("sound", &self.sound)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}
