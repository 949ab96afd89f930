//! Port interfaces for the application layer
//!
//! Ports define the contract between the session lifecycle logic (use cases)
//! and infrastructure implementations. This follows Hexagonal Architecture
//! principles, allowing the core business logic to remain independent of
//! the auth provider and document database SDKs.

mod clock;
pub mod onboarding;
pub mod profile_source;
pub mod session_event;
pub mod session_source;

pub use clock::ClockPort;
pub use onboarding::OnboardingStatePort;
pub use profile_source::ProfileSourcePort;
pub use session_event::SessionEventPort;
pub use session_source::SessionSourcePort;
