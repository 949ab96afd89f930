//! Session event port
//!
//! Outbound notifications to the presentation layer. Implementations bridge
//! to whatever eventing the UI shell uses; emission failures are a
//! presentation concern and never feed back into phase derivation.

use async_trait::async_trait;

use crate::session::SessionPhase;

#[async_trait]
pub trait SessionEventPort: Send + Sync {
    /// Phase changed. Emitted once per actual change, never for re-derived
    /// identical phases.
    async fn emit_phase_changed(&self, phase: SessionPhase);

    /// Fallback login control visibility changed.
    async fn emit_fallback_control(&self, visible: bool);
}
