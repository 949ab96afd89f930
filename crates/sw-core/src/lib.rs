//! # sw-core
//!
//! Core domain models and business logic for SkillSwap.
//!
//! This crate contains pure business logic without any infrastructure dependencies.

// Public module exports
pub mod ids;
pub mod ports;
pub mod profile;
pub mod session;

// Re-export commonly used types at the crate root
pub use ids::AccountId;
pub use profile::ProfileSnapshot;
pub use session::{
    SessionAction, SessionEvent, SessionFault, SessionPhase, SessionPolicy, SessionStateMachine,
    TimeoutKind,
};
