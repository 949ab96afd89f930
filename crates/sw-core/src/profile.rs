//! User profile domain model.
//!
//! A [`ProfileSnapshot`] is the controller-facing projection of the remote
//! user document. `None` at the call sites that carry it means "no profile
//! available": not-yet-fetched, fetch failed, and account deleted are all
//! indistinguishable from the controller's side and are treated the same.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::AccountId;

/// Snapshot of a user profile as resolved from the profile source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    /// Stable account identity, assigned once at account creation.
    pub account_id: AccountId,
    /// Whether the account's email address has been verified.
    pub is_verified: bool,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

impl ProfileSnapshot {
    pub fn new(account_id: impl Into<AccountId>, is_verified: bool, created_at: DateTime<Utc>) -> Self {
        Self {
            account_id: account_id.into(),
            is_verified,
            created_at,
        }
    }

    /// Whether the account counts as "new" at the given instant.
    ///
    /// The window is wall-clock relative to `now`, never to the time the
    /// snapshot was first observed, so callers must recompute it on every
    /// evaluation. A clock skew putting `created_at` in the future still
    /// counts as new.
    pub fn is_new_account(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now.signed_duration_since(self.created_at) < window
    }
}
