//! Session phase state machine.
//!
//! Defines a pure transition function deriving the application phase from
//! the auth-session signal, the resolved profile, and onboarding dismissal.
//!
//! # Architecture
//!
//! ```text
//! Session/Profile/Timer/User events
//!   ↓
//! SessionController (sw-app, serializes delivery)
//!   ↓
//! SessionStateMachine (pure re-evaluation)
//!   ↓
//! SessionActions (executed by the controller)
//!   ↓
//! Auth provider / profile source / presentation side effects
//! ```
//!
//! The machine holds the last observed value of every input signal and
//! re-runs the same derivation on each event; no call site assigns a phase
//! directly. Wall-clock time is injected per call so the new-account window
//! is always evaluated fresh.

use chrono::{DateTime, Utc};

use crate::profile::ProfileSnapshot;
use crate::session::action::{SessionAction, TimeoutKind};
use crate::session::event::SessionEvent;
use crate::session::phase::SessionPhase;
use crate::session::policy::SessionPolicy;

/// Pure session phase machine.
///
/// Mutates only its own cached signals; every side effect is returned as a
/// [`SessionAction`] for the application layer to execute.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    policy: SessionPolicy,
    phase: SessionPhase,
    session_present: bool,
    profile: Option<ProfileSnapshot>,
    onboarding_dismissed: bool,
    fallback_visible: bool,
    /// Latch: resolution already started for the current stay in
    /// `ResolvingProfile`. Guards the at-most-one fetch (and timer arming)
    /// per phase entry; cleared on leaving the phase so every fresh entry
    /// re-arms.
    resolve_started: bool,
}

impl SessionStateMachine {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            policy,
            phase: SessionPhase::default(),
            session_present: false,
            profile: None,
            onboarding_dismissed: false,
            fallback_visible: false,
            resolve_started: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn fallback_control_visible(&self) -> bool {
        self.fallback_visible
    }

    pub fn profile(&self) -> Option<&ProfileSnapshot> {
        self.profile.as_ref()
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Apply one event and re-derive the phase.
    ///
    /// Returns the phase current after the event together with the side
    /// effects the transition requires, in execution order.
    pub fn handle_event(
        &mut self,
        event: SessionEvent,
        now: DateTime<Utc>,
    ) -> (SessionPhase, Vec<SessionAction>) {
        let mut actions = Vec::new();

        match event {
            SessionEvent::SessionChanged { present } => {
                self.session_present = present;
            }
            SessionEvent::ProfileResolved { snapshot } => {
                // A result arriving with no session is stale by definition;
                // it must not resurrect a phase.
                if !self.session_present {
                    return (self.phase, actions);
                }
                self.profile = snapshot;
            }
            SessionEvent::OnboardingDismissed => {
                if !self.onboarding_dismissed {
                    self.onboarding_dismissed = true;
                    if self.policy.persist_onboarding_dismissal {
                        if let Some(profile) = &self.profile {
                            actions.push(SessionAction::PersistOnboardingDismissal {
                                account_id: profile.account_id.clone(),
                            });
                        }
                    }
                }
            }
            SessionEvent::Timeout {
                kind: TimeoutKind::FallbackControl,
            } => {
                // Cosmetic only: surfaces the return-to-login control
                // without changing phase.
                if self.phase.is_resolving() && !self.fallback_visible {
                    self.fallback_visible = true;
                    actions.push(SessionAction::ShowFallbackControl);
                }
                return (self.phase, actions);
            }
            SessionEvent::Timeout {
                kind: TimeoutKind::ResolveWatchdog,
            } => {
                // Fatal recovery, not a retry: the session is closed and no
                // further fetch is attempted.
                if !self.phase.is_resolving() {
                    return (self.phase, actions);
                }
                self.close_session(&mut actions);
            }
            SessionEvent::ForceLogout => {
                self.close_session(&mut actions);
            }
        }

        let phase = self.reevaluate(now, &mut actions);
        (phase, actions)
    }

    fn close_session(&mut self, actions: &mut Vec<SessionAction>) {
        if self.session_present {
            actions.push(SessionAction::SignOut);
            self.session_present = false;
        }
    }

    /// The derivation rule. Runs against the current signals and appends
    /// the entry/exit side effects of any phase change.
    fn reevaluate(&mut self, now: DateTime<Utc>, actions: &mut Vec<SessionAction>) -> SessionPhase {
        let previous = self.phase;

        let next = if !self.session_present {
            SessionPhase::LoggedOut
        } else {
            match &self.profile {
                None => SessionPhase::ResolvingProfile,
                Some(profile) if !profile.is_verified => SessionPhase::NeedsVerification,
                Some(profile)
                    if profile.is_new_account(now, self.policy.new_account_window())
                        && !self.onboarding_dismissed =>
                {
                    SessionPhase::Onboarding
                }
                Some(_) => SessionPhase::Active,
            }
        };

        if previous.is_resolving() && !next.is_resolving() {
            self.resolve_started = false;
            actions.push(SessionAction::CancelTimer {
                kind: TimeoutKind::FallbackControl,
            });
            actions.push(SessionAction::CancelTimer {
                kind: TimeoutKind::ResolveWatchdog,
            });
            if self.fallback_visible {
                self.fallback_visible = false;
                actions.push(SessionAction::HideFallbackControl);
            }
        }

        if next.is_resolving() && !self.resolve_started {
            self.resolve_started = true;
            actions.push(SessionAction::StartTimer {
                kind: TimeoutKind::FallbackControl,
                after: self.policy.fallback_timeout(),
            });
            actions.push(SessionAction::StartTimer {
                kind: TimeoutKind::ResolveWatchdog,
                after: self.policy.watchdog_timeout(),
            });
            actions.push(SessionAction::FetchProfile);
        }

        if next == SessionPhase::LoggedOut {
            // Session-scoped signals reset with the session itself.
            self.profile = None;
            self.onboarding_dismissed = false;
        }

        self.phase = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::AccountId;
    use chrono::Duration;

    fn machine() -> SessionStateMachine {
        SessionStateMachine::new(SessionPolicy::default())
    }

    fn verified_profile(created_at: DateTime<Utc>) -> ProfileSnapshot {
        ProfileSnapshot::new("acct-1", true, created_at)
    }

    fn unverified_profile(created_at: DateTime<Utc>) -> ProfileSnapshot {
        ProfileSnapshot::new("acct-1", false, created_at)
    }

    fn login(machine: &mut SessionStateMachine, now: DateTime<Utc>) -> Vec<SessionAction> {
        let (phase, actions) =
            machine.handle_event(SessionEvent::SessionChanged { present: true }, now);
        assert_eq!(phase, SessionPhase::ResolvingProfile);
        actions
    }

    // =========================================================================
    // Derivation Rule Tests
    // =========================================================================

    #[test]
    fn test_login_enters_resolving_and_arms_timers_once() {
        let now = Utc::now();
        let mut machine = machine();

        let actions = login(&mut machine, now);
        assert_eq!(
            actions,
            vec![
                SessionAction::StartTimer {
                    kind: TimeoutKind::FallbackControl,
                    after: std::time::Duration::from_secs(5),
                },
                SessionAction::StartTimer {
                    kind: TimeoutKind::ResolveWatchdog,
                    after: std::time::Duration::from_secs(10),
                },
                SessionAction::FetchProfile,
            ]
        );

        // Re-delivering the same presence signal must not re-arm or re-fetch.
        let (phase, actions) =
            machine.handle_event(SessionEvent::SessionChanged { present: true }, now);
        assert_eq!(phase, SessionPhase::ResolvingProfile);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_session_loss_wins_over_any_phase() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);
        machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(now - Duration::hours(1))),
            },
            now,
        );
        assert_eq!(machine.phase(), SessionPhase::Active);

        let (phase, actions) =
            machine.handle_event(SessionEvent::SessionChanged { present: false }, now);
        assert_eq!(phase, SessionPhase::LoggedOut);
        // Already out of ResolvingProfile, so nothing to cancel.
        assert!(actions.is_empty());
        assert!(machine.profile().is_none());
    }

    #[test]
    fn test_session_loss_while_resolving_cancels_timers() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);

        let (phase, actions) =
            machine.handle_event(SessionEvent::SessionChanged { present: false }, now);
        assert_eq!(phase, SessionPhase::LoggedOut);
        assert_eq!(
            actions,
            vec![
                SessionAction::CancelTimer {
                    kind: TimeoutKind::FallbackControl,
                },
                SessionAction::CancelTimer {
                    kind: TimeoutKind::ResolveWatchdog,
                },
            ]
        );
    }

    #[test]
    fn test_unverified_profile_needs_verification() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);

        let (phase, _) = machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(unverified_profile(now)),
            },
            now,
        );
        assert_eq!(phase, SessionPhase::NeedsVerification);
    }

    #[test]
    fn test_new_verified_account_enters_onboarding() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);

        let (phase, _) = machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(now - Duration::minutes(4))),
            },
            now,
        );
        assert_eq!(phase, SessionPhase::Onboarding);
    }

    #[test]
    fn test_old_verified_account_skips_onboarding() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);

        let (phase, _) = machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(now - Duration::hours(1))),
            },
            now,
        );
        assert_eq!(phase, SessionPhase::Active);
    }

    #[test]
    fn test_profile_unavailable_stays_resolving_without_refetch() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);

        // Not-found / fetch error folds to None: phase stays ResolvingProfile
        // and no new fetch or timer is issued; the watchdog is the recovery.
        let (phase, actions) =
            machine.handle_event(SessionEvent::ProfileResolved { snapshot: None }, now);
        assert_eq!(phase, SessionPhase::ResolvingProfile);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_profile_loss_reenters_resolution_and_rearms() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);
        machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(now - Duration::hours(1))),
            },
            now,
        );
        assert_eq!(machine.phase(), SessionPhase::Active);

        // Remote document deleted: the source re-fires with nothing. This is
        // a fresh resolution visit, so both timers re-arm and one new fetch
        // goes out; the watchdog again bounds how long it can last.
        let (phase, actions) =
            machine.handle_event(SessionEvent::ProfileResolved { snapshot: None }, now);
        assert_eq!(phase, SessionPhase::ResolvingProfile);
        assert_eq!(
            actions,
            vec![
                SessionAction::StartTimer {
                    kind: TimeoutKind::FallbackControl,
                    after: std::time::Duration::from_secs(5),
                },
                SessionAction::StartTimer {
                    kind: TimeoutKind::ResolveWatchdog,
                    after: std::time::Duration::from_secs(10),
                },
                SessionAction::FetchProfile,
            ]
        );
    }

    // =========================================================================
    // New-Account Window Tests
    // =========================================================================

    #[test]
    fn test_window_reevaluated_when_verification_completes() {
        let created = Utc::now();
        let mut machine = machine();
        login(&mut machine, created);

        // New account, unverified: NeedsVerification.
        let (phase, _) = machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(unverified_profile(created)),
            },
            created,
        );
        assert_eq!(phase, SessionPhase::NeedsVerification);

        // The user lingers on the verification screen past the window. The
        // window is wall-clock relative to evaluation time, so verification
        // completing now lands in Active, not Onboarding.
        let later = created + Duration::minutes(6);
        let (phase, _) = machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(created)),
            },
            later,
        );
        assert_eq!(phase, SessionPhase::Active);
    }

    #[test]
    fn test_window_law_same_profile_different_instants() {
        let now = Utc::now();
        let profile = verified_profile(now - Duration::minutes(4));

        let mut machine = machine();
        login(&mut machine, now);
        let (phase, _) = machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(profile.clone()),
            },
            now,
        );
        assert_eq!(phase, SessionPhase::Onboarding);

        // Same profile data re-evaluated two minutes later (6 min after
        // creation), dismissal untouched: Active, not Onboarding.
        let (phase, _) = machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(profile),
            },
            now + Duration::minutes(2),
        );
        assert_eq!(phase, SessionPhase::Active);
    }

    // =========================================================================
    // Onboarding Dismissal Tests
    // =========================================================================

    #[test]
    fn test_dismissal_moves_to_active_and_is_one_way() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);
        machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(now)),
            },
            now,
        );
        assert_eq!(machine.phase(), SessionPhase::Onboarding);

        let (phase, actions) = machine.handle_event(SessionEvent::OnboardingDismissed, now);
        assert_eq!(phase, SessionPhase::Active);
        // Persistence disabled by default: in-memory only.
        assert!(actions.is_empty());

        // Re-resolving the same still-new profile must not re-enter
        // Onboarding within this session.
        let (phase, _) = machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(now)),
            },
            now,
        );
        assert_eq!(phase, SessionPhase::Active);
    }

    #[test]
    fn test_dismissal_resets_with_session() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);
        machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(now)),
            },
            now,
        );
        machine.handle_event(SessionEvent::OnboardingDismissed, now);
        machine.handle_event(SessionEvent::SessionChanged { present: false }, now);

        // A fresh session with a still-new account sees onboarding again:
        // dismissal is per-session when persistence is disabled.
        login(&mut machine, now);
        let (phase, _) = machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(now)),
            },
            now,
        );
        assert_eq!(phase, SessionPhase::Onboarding);
    }

    #[test]
    fn test_dismissal_emits_persist_action_when_enabled() {
        let now = Utc::now();
        let policy = SessionPolicy {
            persist_onboarding_dismissal: true,
            ..Default::default()
        };
        let mut machine = SessionStateMachine::new(policy);
        login(&mut machine, now);
        machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(now)),
            },
            now,
        );

        let (phase, actions) = machine.handle_event(SessionEvent::OnboardingDismissed, now);
        assert_eq!(phase, SessionPhase::Active);
        assert_eq!(
            actions,
            vec![SessionAction::PersistOnboardingDismissal {
                account_id: AccountId::from("acct-1"),
            }]
        );

        // Dismissing again is idempotent: no second persist.
        let (_, actions) = machine.handle_event(SessionEvent::OnboardingDismissed, now);
        assert!(actions.is_empty());
    }

    // =========================================================================
    // Timeout Tests
    // =========================================================================

    #[test]
    fn test_fallback_timeout_shows_control_without_phase_change() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);
        assert!(!machine.fallback_control_visible());

        let (phase, actions) = machine.handle_event(
            SessionEvent::Timeout {
                kind: TimeoutKind::FallbackControl,
            },
            now,
        );
        assert_eq!(phase, SessionPhase::ResolvingProfile);
        assert_eq!(actions, vec![SessionAction::ShowFallbackControl]);
        assert!(machine.fallback_control_visible());
    }

    #[test]
    fn test_watchdog_timeout_forces_logout_with_single_sign_out() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);
        machine.handle_event(
            SessionEvent::Timeout {
                kind: TimeoutKind::FallbackControl,
            },
            now,
        );

        let (phase, actions) = machine.handle_event(
            SessionEvent::Timeout {
                kind: TimeoutKind::ResolveWatchdog,
            },
            now,
        );
        assert_eq!(phase, SessionPhase::LoggedOut);
        assert_eq!(
            actions,
            vec![
                SessionAction::SignOut,
                SessionAction::CancelTimer {
                    kind: TimeoutKind::FallbackControl,
                },
                SessionAction::CancelTimer {
                    kind: TimeoutKind::ResolveWatchdog,
                },
                SessionAction::HideFallbackControl,
            ]
        );
        assert!(!machine.fallback_control_visible());

        // A straggling watchdog delivery after logout is ignored.
        let (phase, actions) = machine.handle_event(
            SessionEvent::Timeout {
                kind: TimeoutKind::ResolveWatchdog,
            },
            now,
        );
        assert_eq!(phase, SessionPhase::LoggedOut);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_stale_timer_after_resolution_is_ignored() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);
        machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(now - Duration::hours(1))),
            },
            now,
        );
        assert_eq!(machine.phase(), SessionPhase::Active);

        // Timers race their own cancellation; a late delivery is a no-op.
        let (phase, actions) = machine.handle_event(
            SessionEvent::Timeout {
                kind: TimeoutKind::FallbackControl,
            },
            now,
        );
        assert_eq!(phase, SessionPhase::Active);
        assert!(actions.is_empty());
        assert!(!machine.fallback_control_visible());
    }

    #[test]
    fn test_fallback_control_hidden_on_leaving_resolution() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);
        machine.handle_event(
            SessionEvent::Timeout {
                kind: TimeoutKind::FallbackControl,
            },
            now,
        );
        assert!(machine.fallback_control_visible());

        let (_, actions) = machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(now - Duration::hours(1))),
            },
            now,
        );
        assert!(actions.contains(&SessionAction::HideFallbackControl));
        assert!(!machine.fallback_control_visible());
    }

    // =========================================================================
    // Forced Logout and Stale Result Tests
    // =========================================================================

    #[test]
    fn test_force_logout_from_active() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);
        machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(now - Duration::hours(1))),
            },
            now,
        );

        let (phase, actions) = machine.handle_event(SessionEvent::ForceLogout, now);
        assert_eq!(phase, SessionPhase::LoggedOut);
        assert_eq!(actions, vec![SessionAction::SignOut]);
    }

    #[test]
    fn test_force_logout_when_already_logged_out_is_noop() {
        let now = Utc::now();
        let mut machine = machine();
        let (phase, actions) = machine.handle_event(SessionEvent::ForceLogout, now);
        assert_eq!(phase, SessionPhase::LoggedOut);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_resolution_arrives_after_logout_is_discarded() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);
        machine.handle_event(SessionEvent::ForceLogout, now);

        // The in-flight fetch resolves afterwards; it must not change phase.
        let (phase, actions) = machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: Some(verified_profile(now)),
            },
            now,
        );
        assert_eq!(phase, SessionPhase::LoggedOut);
        assert!(actions.is_empty());
        assert!(machine.profile().is_none());
    }

    #[test]
    fn test_idempotent_resolution_in_same_session() {
        let now = Utc::now();
        let mut machine = machine();
        login(&mut machine, now);

        let snapshot = Some(verified_profile(now - Duration::hours(1)));
        let (first, _) = machine.handle_event(
            SessionEvent::ProfileResolved {
                snapshot: snapshot.clone(),
            },
            now,
        );
        let (second, actions) =
            machine.handle_event(SessionEvent::ProfileResolved { snapshot }, now);
        assert_eq!(first, second);
        assert!(actions.is_empty());
    }
}
