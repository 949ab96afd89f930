use tokio::sync::Mutex;

use sw_core::session::{SessionPhase, SessionStateMachine};

/// Shared session context containing the phase machine and dispatch lock.
///
/// This context is shared between [`super::SessionController`] and the tasks
/// it spawns to ensure consistent state access and proper serialization of
/// dispatch calls.
///
/// ## Lock Ordering
/// When acquiring both locks, acquire `dispatch_lock` first, then `machine`.
/// - `dispatch_lock`: Used only for dispatch operations to serialize
///   concurrent trigger deliveries. Ensures the entire transition +
///   action-execution + emission runs atomically.
/// - `machine`: Used for both reading (`phase`) and writing (during
///   dispatch). NOT acquired with `dispatch_lock` for plain reads.
pub struct SessionContext {
    /// The phase machine holding the current input signals and phase.
    machine: Mutex<SessionStateMachine>,
    /// Serializes dispatch calls to prevent concurrent transition/action races.
    dispatch_lock: Mutex<()>,
}

impl SessionContext {
    pub fn new(machine: SessionStateMachine) -> Self {
        Self {
            machine: Mutex::new(machine),
            dispatch_lock: Mutex::new(()),
        }
    }

    /// Current phase. Lightweight read that does NOT acquire `dispatch_lock`.
    pub async fn phase(&self) -> SessionPhase {
        self.machine.lock().await.phase()
    }

    /// Current fallback-control visibility. Lightweight read.
    pub async fn fallback_control_visible(&self) -> bool {
        self.machine.lock().await.fallback_control_visible()
    }

    /// Acquires the dispatch lock for serializing concurrent dispatch calls.
    pub async fn acquire_dispatch_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.dispatch_lock.lock().await
    }

    /// Exclusive access to the machine. Only call after acquiring
    /// `dispatch_lock`.
    pub async fn machine(&self) -> tokio::sync::MutexGuard<'_, SessionStateMachine> {
        self.machine.lock().await
    }
}
