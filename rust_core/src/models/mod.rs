// Shared models for Streamwatch services
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a posted chat message.
pub type MessageId = String;

// ============================================================================
// Broadcasts
// ============================================================================

/// Snapshot of one live broadcast at query time.
///
/// Two records with the same `id` describe the same logical broadcast even if
/// other fields (title, viewer count, refreshed timestamps) have drifted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastRecord {
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    /// Broadcaster display name.
    pub user_name: String,
    pub game_id: String,
    pub game_name: String,
    pub title: String,
    pub viewer_count: u64,
    pub started_at: DateTime<Utc>,
    pub language: String,
    pub thumbnail_url: String,
    /// Classification tags, used to tell variant content from base content.
    pub tags: Vec<String>,
}

impl BroadcastRecord {
    /// Minimal record, mostly useful for tests and fixtures.
    pub fn new(id: impl Into<String>, user_name: impl Into<String>) -> Self {
        let user_name = user_name.into();
        Self {
            id: id.into(),
            user_id: String::new(),
            user_login: user_name.to_lowercase(),
            user_name,
            game_id: String::new(),
            game_name: String::new(),
            title: String::new(),
            viewer_count: 0,
            started_at: Utc::now(),
            language: String::new(),
            thumbnail_url: String::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Channel URL on the streaming platform.
    pub fn channel_url(&self) -> String {
        let login = if self.user_login.is_empty() {
            &self.user_name
        } else {
            &self.user_login
        };
        format!("https://www.twitch.tv/{}/", login)
    }
}

// ============================================================================
// Notification payloads (Discord embed shape)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEmbed {
    pub title: String,
    pub url: String,
    pub color: u32,
    pub timestamp: DateTime<Utc>,
    pub footer: EmbedFooter,
    pub thumbnail: EmbedImage,
    pub author: EmbedAuthor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: String,
    pub icon_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_tag_ignores_case() {
        let record = BroadcastRecord::new("s1", "Runner").with_tags(&["Randomizer", "English"]);
        assert!(record.has_tag("randomizer"));
        assert!(!record.has_tag("speedrun"));
    }

    #[test]
    fn test_channel_url_prefers_login() {
        let mut record = BroadcastRecord::new("s1", "CoolRunner");
        assert_eq!(record.channel_url(), "https://www.twitch.tv/coolrunner/");

        record.user_login.clear();
        assert_eq!(record.channel_url(), "https://www.twitch.tv/CoolRunner/");
    }

    #[test]
    fn test_embed_serializes_discord_shape() {
        let embed = NotificationEmbed {
            title: "t".to_string(),
            url: "u".to_string(),
            color: 1369976,
            timestamp: "2024-01-01T00:00:00Z".parse().unwrap(),
            footer: EmbedFooter {
                text: "f".to_string(),
                icon_url: "fi".to_string(),
            },
            thumbnail: EmbedImage {
                url: "th".to_string(),
            },
            author: EmbedAuthor {
                name: "a".to_string(),
                url: "au".to_string(),
                icon_url: "ai".to_string(),
            },
        };

        let value = serde_json::to_value(&embed).unwrap();
        assert_eq!(value["color"], 1369976);
        assert_eq!(value["footer"]["icon_url"], "fi");
        assert_eq!(value["author"]["name"], "a");
        assert_eq!(value["timestamp"], "2024-01-01T00:00:00Z");
    }
}
