//! Twitch Broadcast Provider
//!
//! Wraps the Helix client with a fixed game filter.

use super::BroadcastProvider;
use crate::clients::twitch::{StreamQuery, TwitchClient, MAX_PAGE_SIZE};
use crate::error::QueryError;
use crate::models::BroadcastRecord;
use async_trait::async_trait;
use log::warn;

/// Illusion of Gaia on Twitch.
pub const DEFAULT_GAME_ID: &str = "4761";

pub struct TwitchBroadcastProvider {
    client: TwitchClient,
    query: StreamQuery,
}

impl TwitchBroadcastProvider {
    pub fn new(client: TwitchClient, game_id: impl Into<String>) -> Self {
        Self {
            client,
            query: StreamQuery {
                game_id: game_id.into(),
                first: MAX_PAGE_SIZE,
            },
        }
    }

    pub fn game_id(&self) -> &str {
        &self.query.game_id
    }
}

#[async_trait]
impl BroadcastProvider for TwitchBroadcastProvider {
    async fn query(&self) -> Result<Vec<BroadcastRecord>, QueryError> {
        let records = self.client.get_streams(&self.query).await?;

        // Only the first page is fetched.
        if records.len() >= self.query.first {
            warn!(
                "Twitch returned a full page of {} streams for game {}; further pages are not fetched",
                records.len(),
                self.query.game_id
            );
        }

        Ok(records)
    }

    fn provider_name(&self) -> &str {
        "twitch"
    }
}
