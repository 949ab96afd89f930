//! Session lifecycle use cases.

pub mod context;
pub mod controller;

pub use context::SessionContext;
pub use controller::{SessionController, SessionControllerDeps};
