//! Discord REST client.
//!
//! Only the handful of endpoints the notifier needs: identify the bot, look up
//! a channel, create a message with an embed, delete a message.

use crate::error::ChannelError;
use crate::models::{MessageId, NotificationEmbed};
use log::info;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DISCORD_API: &str = "https://discord.com/api/v10";

/// Channel types messages can be posted to (guild text, announcement).
const POSTABLE_CHANNEL_TYPES: [u8; 2] = [0, 5];

#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    base_url: String,
    bot_token: String,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the token.
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordChannel {
    pub id: String,
    #[serde(rename = "type")]
    pub channel_type: u8,
    #[serde(default)]
    pub name: Option<String>,
}

impl DiscordChannel {
    pub fn is_text(&self) -> bool {
        POSTABLE_CHANNEL_TYPES.contains(&self.channel_type)
    }
}

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: MessageId,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    embeds: [&'a NotificationEmbed; 1],
}

impl DiscordClient {
    pub fn new(bot_token: String) -> Self {
        Self::with_base_url(bot_token, DISCORD_API.to_string())
    }

    pub fn with_base_url(bot_token: String, base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_token,
        }
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bot {}", self.bot_token))
            .header("Accept", "application/json")
    }

    /// `GET /users/@me`; fails if the token is rejected.
    pub async fn current_user(&self) -> Result<BotUser, ChannelError> {
        let url = format!("{}/users/@me", self.base_url);
        let resp = self.authed(self.client.get(&url)).send().await?;
        let resp = ensure_success(resp).await?;
        resp.json()
            .await
            .map_err(|e| ChannelError::Decode(format!("user: {}", e)))
    }

    /// `GET /channels/{id}`.
    pub async fn get_channel(&self, channel_id: &str) -> Result<DiscordChannel, ChannelError> {
        let url = format!("{}/channels/{}", self.base_url, channel_id);
        let resp = self.authed(self.client.get(&url)).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ChannelError::ChannelNotFound(channel_id.to_string()));
        }
        let resp = ensure_success(resp).await?;
        resp.json()
            .await
            .map_err(|e| ChannelError::Decode(format!("channel: {}", e)))
    }

    /// `POST /channels/{id}/messages` with a single embed.
    pub async fn create_embed_message(
        &self,
        channel_id: &str,
        embed: &NotificationEmbed,
    ) -> Result<MessageId, ChannelError> {
        let url = format!("{}/channels/{}/messages", self.base_url, channel_id);
        let body = CreateMessageRequest { embeds: [embed] };
        let resp = self.authed(self.client.post(&url)).json(&body).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ChannelError::ChannelNotFound(channel_id.to_string()));
        }
        let resp = ensure_success(resp).await?;
        let created: CreatedMessage = resp
            .json()
            .await
            .map_err(|e| ChannelError::Decode(format!("created message: {}", e)))?;
        info!("Created Discord message {} in channel {}", created.id, channel_id);
        Ok(created.id)
    }

    /// `DELETE /channels/{id}/messages/{message_id}`.
    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ChannelError> {
        let url = format!("{}/channels/{}/messages/{}", self.base_url, channel_id, message_id);
        let resp = self.authed(self.client.delete(&url)).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ChannelError::MessageNotFound(message_id.to_string()));
        }
        ensure_success(resp).await?;
        Ok(())
    }
}

async fn ensure_success(resp: Response) -> Result<Response, ChannelError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_else(|_| "Unknown error".to_string());
    Err(ChannelError::Status { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmbedAuthor, EmbedFooter, EmbedImage};

    #[test]
    fn test_channel_type_classification() {
        let parse = |json: &str| serde_json::from_str::<DiscordChannel>(json).unwrap();

        assert!(parse(r#"{"id": "1", "type": 0, "name": "streams"}"#).is_text());
        assert!(parse(r#"{"id": "1", "type": 5}"#).is_text());
        assert!(!parse(r#"{"id": "1", "type": 2, "name": "voice"}"#).is_text());
        assert!(!parse(r#"{"id": "1", "type": 4}"#).is_text());
    }

    #[test]
    fn test_create_message_body_wraps_embed() {
        let embed = NotificationEmbed {
            title: "Runner is live".to_string(),
            url: "https://www.twitch.tv/runner/".to_string(),
            color: 1369976,
            timestamp: "2024-05-01T12:00:00Z".parse().unwrap(),
            footer: EmbedFooter {
                text: "footer".to_string(),
                icon_url: "icon".to_string(),
            },
            thumbnail: EmbedImage {
                url: "thumb".to_string(),
            },
            author: EmbedAuthor {
                name: "Runner".to_string(),
                url: "https://www.twitch.tv/runner/".to_string(),
                icon_url: "icon".to_string(),
            },
        };

        let body = serde_json::to_value(CreateMessageRequest { embeds: [&embed] }).unwrap();
        let embeds = body["embeds"].as_array().unwrap();
        assert_eq!(embeds.len(), 1);
        assert_eq!(embeds[0]["title"], "Runner is live");
    }

    #[test]
    fn test_debug_hides_token() {
        let client = DiscordClient::new("super-secret".to_string());
        assert!(!format!("{:?}", client).contains("super-secret"));
    }

    #[tokio::test]
    #[ignore] // Requires network and DISCORD_BOT_TOKEN
    async fn test_current_user() {
        let token = std::env::var("DISCORD_BOT_TOKEN").unwrap_or_default();
        let client = DiscordClient::new(token);
        match client.current_user().await {
            Ok(user) => println!("Bot user: {} ({})", user.username, user.id),
            Err(e) => println!("Warning: Could not identify bot: {}", e),
        }
    }
}
