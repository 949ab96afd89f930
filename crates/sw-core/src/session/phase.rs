use serde::{Deserialize, Serialize};

/// Application session phase.
///
/// Design principle: this is a pure value derived from the input signals by
/// [`super::SessionStateMachine`]; presentation code reads it but never sets
/// it directly. Exactly one phase is current at any instant.
///
/// Phase derivation order (re-evaluated on every trigger):
/// ```text
///   no session ──────────────────────────────► LoggedOut
///   session, no profile yet ─────────────────► ResolvingProfile
///   profile, not verified ───────────────────► NeedsVerification
///   verified, new account, not dismissed ────► Onboarding
///   otherwise ───────────────────────────────► Active
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No authenticated session.
    LoggedOut,

    /// Session present, profile fetch outstanding or unresolved.
    ResolvingProfile,

    /// Profile resolved but the email address is not verified yet.
    NeedsVerification,

    /// Verified account inside the new-account window, onboarding not
    /// dismissed yet.
    Onboarding,

    /// Fully usable session.
    Active,
}

impl SessionPhase {
    /// Check if an authenticated session backs this phase.
    pub fn is_authenticated(self) -> bool {
        !matches!(self, Self::LoggedOut)
    }

    /// Check if a resolved profile backs this phase.
    pub fn has_profile(self) -> bool {
        matches!(
            self,
            Self::NeedsVerification | Self::Onboarding | Self::Active
        )
    }

    /// Check if this phase is waiting on the profile source.
    pub fn is_resolving(self) -> bool {
        matches!(self, Self::ResolvingProfile)
    }
}

impl Default for SessionPhase {
    fn default() -> Self {
        Self::LoggedOut
    }
}
