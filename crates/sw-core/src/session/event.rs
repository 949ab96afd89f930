use crate::profile::ProfileSnapshot;
use crate::session::action::TimeoutKind;

/// Events that drive the session phase machine.
///
/// Every inbound signal (auth-session change, profile resolution, user
/// command, timer expiry) is an explicit event so every entry point goes
/// through the same serialized evaluation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Auth provider reported a session appearing or disappearing
    /// (login, logout, token invalidation).
    SessionChanged { present: bool },

    /// The profile source completed a fetch attempt. `None` folds together
    /// not-found, fetch error, and deleted account; the machine cannot and
    /// does not distinguish them.
    ProfileResolved { snapshot: Option<ProfileSnapshot> },

    /// User completed or skipped onboarding.
    OnboardingDismissed,

    /// An armed timer expired.
    Timeout { kind: TimeoutKind },

    /// Explicit logout command (user action or watchdog recovery).
    ForceLogout,
}
