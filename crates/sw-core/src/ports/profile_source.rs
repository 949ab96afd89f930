//! Profile source port
//!
//! Opaque asynchronous profile fetch against the remote user document. The
//! call may take unbounded time or never resolve; the caller owns watchdog
//! recovery. `Ok(None)` and `Err(..)` are equivalent for phase purposes
//! (profile unavailable); the distinction only matters for logging.

use async_trait::async_trait;

use crate::profile::ProfileSnapshot;

#[async_trait]
pub trait ProfileSourcePort: Send + Sync {
    /// Fetch the profile for the currently authenticated account.
    async fn fetch(&self) -> anyhow::Result<Option<ProfileSnapshot>>;
}
