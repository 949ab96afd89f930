//! SkillSwap Application Orchestration Layer
//!
//! This crate contains the session lifecycle controller and runtime
//! orchestration: timer scheduling, epoch-tagged profile fetches, and
//! serialized delivery of the signals that drive the phase machine.

pub mod usecases;

pub use usecases::session::{SessionContext, SessionController, SessionControllerDeps};
