//! Session source port
//!
//! The auth provider's session signal: a push stream of "session present"
//! booleans plus a fire-and-forget sign-out command. The provider is assumed
//! eventually consistent: a sign-out issued here surfaces later as a
//! `false` presence push.

use async_trait::async_trait;
use tokio::sync::mpsc;

#[async_trait]
pub trait SessionSourcePort: Send + Sync {
    /// Subscribe to session presence changes. Deliveries may come from any
    /// asynchronous context; the subscriber is responsible for serializing
    /// them.
    fn subscribe(&self) -> mpsc::Receiver<bool>;

    /// Ask the provider to terminate the current session.
    async fn sign_out(&self) -> anyhow::Result<()>;
}
