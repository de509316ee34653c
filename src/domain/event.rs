//! Notification events and their human-readable rendering.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::net::IpAddr;

/// Why the filter produced its result for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// No rule matched.
    NotFilteredNotFound,
    /// An allowlist rule matched.
    NotFilteredAllowList,
    /// Filtering failed.
    NotFilteredError,
    /// A blocklist rule matched.
    FilteredBlockList,
    /// The safe-browsing service flagged the host.
    FilteredSafeBrowsing,
    /// The parental-control service flagged the host.
    FilteredParental,
    /// The query was malformed.
    FilteredInvalid,
    /// Safe search rewrote the query.
    FilteredSafeSearch,
    /// The host belongs to a blocked service.
    FilteredBlockedService,
    /// A configured DNS rewrite matched.
    Rewritten,
    /// The answer came from the system hosts file.
    RewrittenAutoHosts,
    /// A `$dnsrewrite` filtering rule matched.
    RewrittenRule,
}

impl Reason {
    /// Stable identifier used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::NotFilteredNotFound => "not_filtered_not_found",
            Reason::NotFilteredAllowList => "not_filtered_allowlist",
            Reason::NotFilteredError => "not_filtered_error",
            Reason::FilteredBlockList => "filtered_blocklist",
            Reason::FilteredSafeBrowsing => "filtered_safebrowsing",
            Reason::FilteredParental => "filtered_parental",
            Reason::FilteredInvalid => "filtered_invalid",
            Reason::FilteredSafeSearch => "filtered_safesearch",
            Reason::FilteredBlockedService => "filtered_blocked_service",
            Reason::Rewritten => "rewritten",
            Reason::RewrittenAutoHosts => "rewritten_autohosts",
            Reason::RewrittenRule => "rewritten_rule",
        }
    }

    /// Title suffix for a notification triggered with this reason.
    pub fn headline(&self) -> &'static str {
        match self {
            Reason::FilteredBlockList => "Domain Blocked",
            Reason::NotFilteredAllowList => "Domain Allowed",
            Reason::Rewritten | Reason::RewrittenRule => "Domain Rewritten",
            _ => "Custom Rule Match",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rule match worth notifying about.
///
/// Built by the producer once the dispatcher has admitted the domain, then
/// handed off to the background sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    /// Matched domain name
    pub domain: String,
    /// Text of the matched rule
    pub rule_text: String,
    /// Filtering reason
    pub reason: Reason,
    /// Address of the querying client
    pub client_ip: IpAddr,
    /// Client identifier, when the query carried one
    pub client_id: Option<String>,
    /// When the match happened
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    /// Describe the querying client.
    ///
    /// Empty identifiers are treated as absent.
    ///
    /// # Example
    /// ```
    /// use rulematch_notify::{NotificationEvent, Reason};
    /// use chrono::Utc;
    ///
    /// let mut event = NotificationEvent {
    ///     domain: "ads.example".to_string(),
    ///     rule_text: "||ads.example^".to_string(),
    ///     reason: Reason::FilteredBlockList,
    ///     client_ip: "192.168.1.20".parse().unwrap(),
    ///     client_id: None,
    ///     timestamp: Utc::now(),
    /// };
    /// assert_eq!(event.client_descriptor(), "192.168.1.20");
    ///
    /// event.client_id = Some("laptop".to_string());
    /// assert_eq!(event.client_descriptor(), "laptop (192.168.1.20)");
    /// ```
    pub fn client_descriptor(&self) -> String {
        match self.client_id.as_deref() {
            Some(id) if !id.is_empty() => format!("{} ({})", id, self.client_ip),
            _ => self.client_ip.to_string(),
        }
    }

    /// Notification title, prefixed with the product name.
    pub fn title(&self, prefix: &str) -> String {
        format!("{}: {}", prefix, self.reason.headline())
    }

    /// Notification body.
    pub fn message(&self) -> String {
        format!(
            "Domain: {}\nClient: {}\nTime: {}",
            self.domain,
            self.client_descriptor(),
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }
}
