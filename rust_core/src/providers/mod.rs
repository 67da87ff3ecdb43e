//! Broadcast provider abstraction
//!
//! Defines the BroadcastProvider trait the reconciliation loop polls for the
//! current set of live broadcasts. Each provider applies its own fixed filter
//! upstream.

use crate::error::QueryError;
use crate::models::BroadcastRecord;
use async_trait::async_trait;

pub mod twitch;

pub use twitch::TwitchBroadcastProvider;

#[async_trait]
pub trait BroadcastProvider: Send + Sync {
    /// Broadcasts live right now, in the order the upstream returned them.
    async fn query(&self) -> Result<Vec<BroadcastRecord>, QueryError>;

    /// Provider name for logging and debugging
    fn provider_name(&self) -> &str;
}
