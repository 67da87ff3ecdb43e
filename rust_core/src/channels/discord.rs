//! Discord notification channel bound to one text channel.

use super::NotificationChannel;
use crate::clients::discord::DiscordClient;
use crate::error::ChannelError;
use crate::models::{MessageId, NotificationEmbed};
use async_trait::async_trait;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct DiscordNotificationChannel {
    client: DiscordClient,
    channel_id: String,
    connected: AtomicBool,
}

impl DiscordNotificationChannel {
    pub fn new(client: DiscordClient, channel_id: impl Into<String>) -> Self {
        Self {
            client,
            channel_id: channel_id.into(),
            connected: AtomicBool::new(false),
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Open the session: check the token, then check the target channel exists
    /// and accepts messages.
    pub async fn connect(&self) -> Result<(), ChannelError> {
        let user = self.client.current_user().await?;
        let channel = self.client.get_channel(&self.channel_id).await?;
        if !channel.is_text() {
            return Err(ChannelError::NotTextChannel(self.channel_id.clone()));
        }

        self.connected.store(true, Ordering::SeqCst);
        info!(
            "Discord session open as {} ({}), posting to #{} ({})",
            user.username,
            user.id,
            channel.name.as_deref().unwrap_or("?"),
            self.channel_id
        );
        Ok(())
    }

    /// Close the session. Later posts and deletes fail with `NotConnected`.
    pub fn close(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!("Discord session closed");
        }
    }

    fn ensure_connected(&self) -> Result<(), ChannelError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ChannelError::NotConnected)
        }
    }
}

#[async_trait]
impl NotificationChannel for DiscordNotificationChannel {
    async fn post(&self, embed: &NotificationEmbed) -> Result<Vec<MessageId>, ChannelError> {
        self.ensure_connected()?;
        let id = self.client.create_embed_message(&self.channel_id, embed).await?;
        Ok(vec![id])
    }

    async fn delete(&self, message_id: &MessageId) -> Result<(), ChannelError> {
        self.ensure_connected()?;
        self.client.delete_message(&self.channel_id, message_id).await
    }
}
