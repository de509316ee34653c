//! Glue between the filtering pipeline and the dispatcher.
//!
//! The resolver calls [`Dispatcher::process_match`] with whatever the filter
//! returned for a query. Everything after that is fire-and-forget.

use crate::application::dispatcher::Dispatcher;
use crate::domain::admission::{Admission, LimitScope};
use crate::domain::event::{NotificationEvent, Reason};
use chrono::Utc;
use std::net::IpAddr;
use tracing::debug;

/// A filtering rule that matched a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRule {
    /// Rule text as written in the filter list
    pub text: String,
}

impl MatchedRule {
    /// Create a rule from its text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Filter result for one query, as seen by the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// Queried host
    pub host: String,
    /// Rules that matched, in filter order
    pub rules: Vec<MatchedRule>,
    /// Why the filter decided as it did
    pub reason: Reason,
    /// Address of the querying client
    pub client_ip: IpAddr,
    /// Client identifier, when the query carried one
    pub client_id: Option<String>,
}

/// What happened to a rule match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Nothing matched, so nothing was considered
    NoRules,
    /// A rate limit denied the notification
    RateLimited(LimitScope),
    /// The notification was handed to a background task
    Dispatched,
}

impl Dispatcher {
    /// Notify about a filter result if both rate limits allow it.
    ///
    /// Only the first matched rule is reported, even when several matched.
    pub fn process_match(&self, matched: &RuleMatch) -> MatchOutcome {
        let Some(rule) = matched.rules.first() else {
            return MatchOutcome::NoRules;
        };

        if let Admission::Blocked(scope) = self.should_notify(&matched.host) {
            debug!(
                domain = %matched.host,
                limit_type = %scope,
                "notification rate limited"
            );
            return MatchOutcome::RateLimited(scope);
        }

        let event = NotificationEvent {
            domain: matched.host.clone(),
            rule_text: rule.text.clone(),
            reason: matched.reason,
            client_ip: matched.client_ip,
            client_id: matched.client_id.clone(),
            timestamp: Utc::now(),
        };

        debug!(
            domain = %event.domain,
            rule = %event.rule_text,
            reason = %event.reason,
            "sending pushover notification"
        );

        self.send_async(event);
        MatchOutcome::Dispatched
    }
}
