use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ids::AccountId;

/// Timer identity.
///
/// The two timers are armed together on entering profile resolution but are
/// independently cancellable: the fallback timer only affects what the
/// presentation layer shows, the watchdog forces a logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeoutKind {
    /// Surface the "return to login" control while still resolving.
    FallbackControl,
    /// Give up on profile resolution and force a logout.
    ResolveWatchdog,
}

/// Side effects produced by state transitions.
///
/// These are executed by the application-layer controller; the machine
/// itself stays pure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Issue a profile fetch to the profile source.
    FetchProfile,

    /// Issue a sign-out command to the session source.
    SignOut,

    /// Arm a timer that delivers `SessionEvent::Timeout { kind }` after
    /// the given duration.
    StartTimer { kind: TimeoutKind, after: Duration },

    /// Disarm a timer. Cancelling a non-armed timer is a no-op.
    CancelTimer { kind: TimeoutKind },

    /// Tell the presentation layer to show the fallback login control.
    ShowFallbackControl,

    /// Tell the presentation layer to hide the fallback login control.
    HideFallbackControl,

    /// Record the onboarding dismissal for this account. Only emitted when
    /// the policy enables persisted dismissal.
    PersistOnboardingDismissal { account_id: AccountId },
}
