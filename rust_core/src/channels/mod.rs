//! Notification channel abstraction
//!
//! A channel posts rich notifications and retracts them by message id. It holds
//! no knowledge of which broadcast a message belongs to.

use crate::error::ChannelError;
use crate::models::{MessageId, NotificationEmbed};
use async_trait::async_trait;

pub mod discord;

pub use discord::DiscordNotificationChannel;

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Post one notification. Returns the ids of every message created for it.
    async fn post(&self, embed: &NotificationEmbed) -> Result<Vec<MessageId>, ChannelError>;

    /// Delete one previously posted message.
    async fn delete(&self, message_id: &MessageId) -> Result<(), ChannelError>;
}
