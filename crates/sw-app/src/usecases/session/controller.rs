//! Session lifecycle controller.
//!
//! This module coordinates the session phase machine and its side effects:
//! it serializes signal deliveries from the auth provider and the profile
//! source onto one evaluation path, owns the resolution timers, and tags
//! every outstanding profile fetch with the session epoch active when it
//! was issued so results for a dead session are discarded.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use sw_core::ports::{
    ClockPort, OnboardingStatePort, ProfileSourcePort, SessionEventPort, SessionSourcePort,
};
use sw_core::profile::ProfileSnapshot;
use sw_core::session::{
    SessionAction, SessionEvent, SessionFault, SessionPhase, SessionPolicy, SessionStateMachine,
    TimeoutKind,
};

use super::context::SessionContext;

/// Controller that drives the session phase machine and executes its
/// side effects. Created once per application run; cheap to clone, all
/// clones share the same state.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    context: SessionContext,

    /// Session generation counter. Bumped on every entry into `LoggedOut`;
    /// profile fetches carry the epoch they were issued under.
    epoch: AtomicU64,
    timers: Mutex<HashMap<TimeoutKind, AbortHandle>>,

    session_source: Arc<dyn SessionSourcePort>,
    profile_source: Arc<dyn ProfileSourcePort>,
    clock: Arc<dyn ClockPort>,
    events: Arc<dyn SessionEventPort>,
    onboarding_state: Arc<dyn OnboardingStatePort>,
}

/// Helper for constructing the controller with explicit dependency fields.
pub struct SessionControllerDeps {
    pub policy: SessionPolicy,
    pub session_source: Arc<dyn SessionSourcePort>,
    pub profile_source: Arc<dyn ProfileSourcePort>,
    pub clock: Arc<dyn ClockPort>,
    pub events: Arc<dyn SessionEventPort>,
    pub onboarding_state: Arc<dyn OnboardingStatePort>,
}

impl SessionController {
    pub fn new(deps: SessionControllerDeps) -> Self {
        let SessionControllerDeps {
            policy,
            session_source,
            profile_source,
            clock,
            events,
            onboarding_state,
        } = deps;

        Self {
            inner: Arc::new(ControllerInner {
                context: SessionContext::new(SessionStateMachine::new(policy)),
                epoch: AtomicU64::new(0),
                timers: Mutex::new(HashMap::new()),
                session_source,
                profile_source,
                clock,
                events,
                onboarding_state,
            }),
        }
    }

    /// Subscribe to the session source and start forwarding presence
    /// changes into the evaluation path.
    pub fn start(&self) {
        let mut presence = self.inner.session_source.subscribe();
        let controller = self.clone();
        tokio::spawn(async move {
            while let Some(present) = presence.recv().await {
                controller
                    .dispatch(SessionEvent::SessionChanged { present })
                    .await;
            }
            debug!("session source subscription closed");
        });
    }

    pub async fn current_phase(&self) -> SessionPhase {
        self.inner.context.phase().await
    }

    pub async fn fallback_control_visible(&self) -> bool {
        self.inner.context.fallback_control_visible().await
    }

    /// User completed or skipped onboarding.
    pub async fn dismiss_onboarding(&self) {
        self.dispatch(SessionEvent::OnboardingDismissed).await;
    }

    /// Synchronously returns to `LoggedOut` and asks the auth provider to
    /// terminate the session. Any in-flight fetch is invalidated before
    /// this returns.
    pub async fn force_logout(&self) {
        self.dispatch(SessionEvent::ForceLogout).await;
    }

    /// Deliver a profile resolution pushed from outside the controller's
    /// own fetch, e.g. a refresh after the user verifies their email. Tagged
    /// with the current epoch, so a concurrent logout still invalidates it.
    pub async fn notify_profile_resolved(&self, snapshot: Option<ProfileSnapshot>) {
        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        self.resolve_profile(epoch, snapshot).await;
    }

    /// Current session epoch, for diagnostics.
    pub fn session_epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    /// Boxed rather than `async fn`: the timer tasks spawned while
    /// executing actions call back into dispatch, and the resulting cycle
    /// through `tokio::spawn` makes an unboxed future type unresolvable.
    fn dispatch(&self, event: SessionEvent) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            // Serialize concurrent trigger deliveries. The whole transition +
            // action execution runs under this guard.
            let _dispatch_guard = self.inner.context.acquire_dispatch_lock().await;
            self.dispatch_locked(event).await;
        })
    }

    async fn dispatch_locked(&self, event: SessionEvent) {
        let span = info_span!("usecase.session_controller.dispatch", event = ?event);
        async {
            let now = self.inner.clock.now();
            let (previous, phase, actions) = {
                let mut machine = self.inner.context.machine().await;
                let previous = machine.phase();
                let (phase, actions) = machine.handle_event(event, now);
                (previous, phase, actions)
            };

            if phase != previous {
                info!(from = ?previous, to = ?phase, "session phase transition");
                if phase == SessionPhase::LoggedOut {
                    // Invalidate outstanding fetches before any side effect
                    // runs, so a late resolution cannot resurrect the session.
                    self.inner.epoch.fetch_add(1, Ordering::SeqCst);
                }
            }

            self.execute_actions(actions).await;

            if phase != previous {
                self.inner.events.emit_phase_changed(phase).await;
            }
        }
        .instrument(span)
        .await
    }

    async fn execute_actions(&self, actions: Vec<SessionAction>) {
        for action in actions {
            debug!(?action, "session executing action");
            match action {
                SessionAction::FetchProfile => {
                    self.spawn_fetch();
                }
                SessionAction::SignOut => {
                    if let Err(err) = self.inner.session_source.sign_out().await {
                        // Fire-and-forget: the provider is eventually
                        // consistent and the phase is already LoggedOut.
                        warn!(error = %err, "sign-out command failed");
                    }
                }
                SessionAction::StartTimer { kind, after } => {
                    self.start_timer(kind, after).await;
                }
                SessionAction::CancelTimer { kind } => {
                    self.cancel_timer(kind).await;
                }
                SessionAction::ShowFallbackControl => {
                    warn!(
                        fault = %SessionFault::FetchTimeout { kind: TimeoutKind::FallbackControl },
                        "profile resolution slow, surfacing fallback control"
                    );
                    self.inner.events.emit_fallback_control(true).await;
                }
                SessionAction::HideFallbackControl => {
                    self.inner.events.emit_fallback_control(false).await;
                }
                SessionAction::PersistOnboardingDismissal { account_id } => {
                    if let Err(err) = self.inner.onboarding_state.set_dismissed(&account_id).await
                    {
                        warn!(error = %err, %account_id, "failed to persist onboarding dismissal");
                    }
                }
            }
        }
    }

    fn spawn_fetch(&self) {
        let issued_epoch = self.inner.epoch.load(Ordering::SeqCst);
        let controller = self.clone();
        tokio::spawn(async move {
            let snapshot = match controller.inner.profile_source.fetch().await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    // Not-found and fetch errors are equivalent for phase
                    // purposes; the watchdog handles the never-resolves case.
                    warn!(
                        error = %err,
                        fault = %SessionFault::ProfileUnavailable,
                        "profile fetch failed"
                    );
                    None
                }
            };
            controller.resolve_profile(issued_epoch, snapshot).await;
        });
    }

    /// Deliver a fetch result, dropping it if its epoch is no longer
    /// current.
    async fn resolve_profile(&self, issued_epoch: u64, snapshot: Option<ProfileSnapshot>) {
        let _dispatch_guard = self.inner.context.acquire_dispatch_lock().await;

        let current_epoch = self.inner.epoch.load(Ordering::SeqCst);
        if issued_epoch != current_epoch {
            warn!(
                fault = %SessionFault::StaleResult { issued_epoch, current_epoch },
                "discarding stale profile result"
            );
            return;
        }

        let replay_dismissal = match &snapshot {
            Some(profile) => self.persisted_dismissal(profile).await,
            None => false,
        };

        // A dismissal recorded in an earlier session is applied before the
        // profile lands, so presentation never sees a transient Onboarding
        // phase on its way to Active.
        if replay_dismissal {
            self.dispatch_locked(SessionEvent::OnboardingDismissed).await;
        }
        self.dispatch_locked(SessionEvent::ProfileResolved { snapshot })
            .await;
    }

    /// Whether a previously persisted dismissal applies to this account.
    async fn persisted_dismissal(&self, profile: &ProfileSnapshot) -> bool {
        {
            let machine = self.inner.context.machine().await;
            if !machine.policy().persist_onboarding_dismissal {
                return false;
            }
        }
        match self
            .inner
            .onboarding_state
            .is_dismissed(&profile.account_id)
            .await
        {
            Ok(dismissed) => dismissed,
            Err(err) => {
                warn!(
                    error = %err,
                    account_id = %profile.account_id,
                    "failed to load persisted onboarding dismissal"
                );
                false
            }
        }
    }

    async fn start_timer(&self, kind: TimeoutKind, after: std::time::Duration) {
        let controller = self.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // Drop our own abort handle first so the cancellation this
            // timeout triggers cannot abort the dispatch mid-flight.
            controller.remove_timer(kind).await;
            controller.dispatch(SessionEvent::Timeout { kind }).await;
        });

        let mut timers = self.inner.timers.lock().await;
        if let Some(previous) = timers.insert(kind, task.abort_handle()) {
            previous.abort();
        }
    }

    async fn cancel_timer(&self, kind: TimeoutKind) {
        // Cancelling a non-armed timer is a no-op.
        if let Some(handle) = self.remove_timer(kind).await {
            handle.abort();
        }
    }

    async fn remove_timer(&self, kind: TimeoutKind) -> Option<AbortHandle> {
        let mut timers = self.inner.timers.lock().await;
        timers.remove(&kind)
    }
}
