//! Session lifecycle domain module.
//!
//! This module defines the session phase state machine: the single authority
//! that derives the application phase from the auth-session signal, the
//! resolved profile, and onboarding dismissal. Runtime behaviors like timer
//! scheduling and fetch issuing are handled by the application layer (sw-app);
//! the machine only emits them as actions.

pub mod action;
pub mod event;
pub mod fault;
pub mod phase;
pub mod policy;
pub mod state_machine;

pub use action::{SessionAction, TimeoutKind};
pub use event::SessionEvent;
pub use fault::SessionFault;
pub use phase::SessionPhase;
pub use policy::SessionPolicy;
pub use state_machine::SessionStateMachine;
