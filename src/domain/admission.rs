//! Outcome of a two-tier admission check.

use std::fmt;

/// Which rate-limit tier denied an admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitScope {
    /// The per-domain window was still closed.
    Domain,
    /// The process-wide window was still closed.
    Global,
}

impl LimitScope {
    /// Short label used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitScope::Domain => "domain",
            LimitScope::Global => "global",
        }
    }
}

impl fmt::Display for LimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision about whether a notification may be sent.
///
/// Denial is a normal outcome, not an error. The scope is reported for
/// observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Both tiers admitted the notification.
    Admitted,
    /// A tier denied the notification.
    Blocked(LimitScope),
}

impl Admission {
    /// Check if the notification was admitted.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }

    /// The tier that denied the notification, if any.
    pub fn blocked_by(&self) -> Option<LimitScope> {
        match self {
            Admission::Admitted => None,
            Admission::Blocked(scope) => Some(*scope),
        }
    }
}
