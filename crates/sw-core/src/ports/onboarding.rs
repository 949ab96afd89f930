//! Onboarding dismissal port
//!
//! This port defines the contract for persisting per-account onboarding
//! dismissal. It is only consulted when the session policy enables
//! persisted dismissal; the default keeps dismissal in memory per session.

use async_trait::async_trait;

use crate::ids::AccountId;

#[async_trait]
pub trait OnboardingStatePort: Send + Sync {
    /// Whether this account has dismissed onboarding before.
    async fn is_dismissed(&self, account_id: &AccountId) -> anyhow::Result<bool>;

    /// Record that this account dismissed onboarding.
    async fn set_dismissed(&self, account_id: &AccountId) -> anyhow::Result<()>;

    /// Clear all recorded dismissals (for testing or re-onboarding).
    async fn reset(&self) -> anyhow::Result<()>;
}
