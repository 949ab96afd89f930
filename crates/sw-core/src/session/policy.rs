use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session lifecycle policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPolicy {
    /// Seconds in `ResolvingProfile` before the fallback login control is
    /// surfaced.
    pub fallback_timeout_secs: u64,
    /// Seconds in `ResolvingProfile` before a logout is forced.
    pub watchdog_timeout_secs: u64,
    /// Seconds after account creation during which the account counts as
    /// new for the onboarding decision.
    pub new_account_window_secs: i64,
    /// Whether onboarding dismissal is persisted per account across
    /// sessions. When false, dismissal lives in memory for the current
    /// session only.
    pub persist_onboarding_dismissal: bool,
}

impl SessionPolicy {
    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_secs(self.fallback_timeout_secs)
    }

    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_secs(self.watchdog_timeout_secs)
    }

    pub fn new_account_window(&self) -> ChronoDuration {
        ChronoDuration::seconds(self.new_account_window_secs)
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            fallback_timeout_secs: 5,
            watchdog_timeout_secs: 10,
            new_account_window_secs: 5 * 60,
            persist_onboarding_dismissal: false,
        }
    }
}
