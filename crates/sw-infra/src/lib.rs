//! Infrastructure adapters for SkillSwap.

pub mod onboarding_state;
pub mod time;

pub use onboarding_state::FileOnboardingStateRepository;
pub use time::SystemClock;
