//! Reconciliation engine.
//!
//! Keeps the posted notifications in step with the live broadcast set. Each
//! tick queries the provider once, retracts notifications for broadcasts that
//! ended, then announces broadcasts that started. All deletes of a tick finish
//! before its first post.

use std::collections::{HashMap, HashSet};

use log::{info, warn};
use streamwatch_core::models::MessageId;
use streamwatch_core::{BroadcastProvider, NotificationChannel, QueryError};

use crate::config::Config;
use crate::formatters;

/// What to do with an ended broadcast whose messages could not all be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPolicy {
    /// Drop the entry regardless of delete outcomes.
    #[default]
    Forget,
    /// Keep the entry with only the messages whose delete failed, and retry
    /// them next tick. Messages already gone upstream are not retried.
    RetainFailed,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub variant_tag: String,
    pub game_name: String,
    pub cleanup_policy: CleanupPolicy,
}

impl From<&Config> for EngineSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            variant_tag: cfg.variant_tag.clone(),
            game_name: cfg.twitch_game_name.clone(),
            cleanup_policy: cfg.cleanup_policy,
        }
    }
}

/// Outcome of one successful tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Broadcasts returned by the query.
    pub fetched: usize,
    /// Broadcast ids whose notifications were retracted this tick.
    pub ended: Vec<String>,
    /// Broadcast ids announced this tick.
    pub started: Vec<String>,
    pub deletes_attempted: usize,
    pub delete_failures: usize,
    pub post_failures: usize,
}

impl TickReport {
    pub fn is_quiet(&self) -> bool {
        self.ended.is_empty() && self.started.is_empty() && self.post_failures == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub ticks: u64,
    pub query_failures: u64,
    pub posts: u64,
    pub post_failures: u64,
    pub deletes: u64,
    pub delete_failures: u64,
}

pub struct ReconciliationEngine<P, C> {
    provider: P,
    channel: C,
    settings: EngineSettings,
    /// Broadcast id -> ids of the messages that announced it.
    active: HashMap<String, Vec<MessageId>>,
    stats: EngineStats,
}

impl<P, C> ReconciliationEngine<P, C>
where
    P: BroadcastProvider,
    C: NotificationChannel,
{
    pub fn new(provider: P, channel: C, settings: EngineSettings) -> Self {
        Self {
            provider,
            channel,
            settings,
            active: HashMap::new(),
            stats: EngineStats::default(),
        }
    }

    pub fn active(&self) -> &HashMap<String, Vec<MessageId>> {
        &self.active
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Run one reconciliation pass.
    ///
    /// A failed query leaves the mapping untouched and issues no channel calls.
    pub async fn tick(&mut self) -> Result<TickReport, QueryError> {
        self.stats.ticks += 1;

        let current = match self.provider.query().await {
            Ok(records) => records,
            Err(e) => {
                self.stats.query_failures += 1;
                return Err(e);
            }
        };

        let mut report = TickReport {
            fetched: current.len(),
            ..Default::default()
        };

        let current_ids: HashSet<&str> = current.iter().map(|r| r.id.as_str()).collect();
        let ended: Vec<String> = self
            .active
            .keys()
            .filter(|id| !current_ids.contains(id.as_str()))
            .cloned()
            .collect();

        for broadcast_id in ended {
            self.retract(broadcast_id, &mut report).await;
        }

        for record in &current {
            if self.active.contains_key(&record.id) {
                continue;
            }

            let embed =
                formatters::build_embed(record, &self.settings.variant_tag, &self.settings.game_name);
            match self.channel.post(&embed).await {
                Ok(message_ids) => {
                    info!(
                        "Announced broadcast {} by {} ({} message(s))",
                        record.id,
                        record.user_name,
                        message_ids.len()
                    );
                    self.stats.posts += 1;
                    self.active.insert(record.id.clone(), message_ids);
                    report.started.push(record.id.clone());
                }
                Err(e) => {
                    warn!(
                        "Failed to announce broadcast {} by {}: {}",
                        record.id, record.user_name, e
                    );
                    self.stats.post_failures += 1;
                    report.post_failures += 1;
                }
            }
        }

        Ok(report)
    }

    async fn retract(&mut self, broadcast_id: String, report: &mut TickReport) {
        let Some(message_ids) = self.active.remove(&broadcast_id) else {
            return;
        };

        let mut undeleted = Vec::new();
        for message_id in message_ids {
            report.deletes_attempted += 1;
            match self.channel.delete(&message_id).await {
                Ok(()) => self.stats.deletes += 1,
                Err(e) => {
                    warn!(
                        "Failed to delete message {} for ended broadcast {}: {}",
                        message_id, broadcast_id, e
                    );
                    self.stats.delete_failures += 1;
                    report.delete_failures += 1;
                    if !e.is_not_found() {
                        undeleted.push(message_id);
                    }
                }
            }
        }

        if self.settings.cleanup_policy == CleanupPolicy::RetainFailed && !undeleted.is_empty() {
            warn!(
                "Keeping broadcast {} with {} undeleted message(s) for retry",
                broadcast_id,
                undeleted.len()
            );
            self.active.insert(broadcast_id, undeleted);
            return;
        }

        info!("Retracted notifications for ended broadcast {}", broadcast_id);
        report.ended.push(broadcast_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use streamwatch_core::{BroadcastRecord, ChannelError, NotificationEmbed};

    struct FixedProvider(Vec<BroadcastRecord>);

    #[async_trait]
    impl BroadcastProvider for FixedProvider {
        async fn query(&self) -> Result<Vec<BroadcastRecord>, QueryError> {
            Ok(self.0.clone())
        }

        fn provider_name(&self) -> &str {
            "fixed"
        }
    }

    #[derive(Default)]
    struct CountingChannel {
        posted_titles: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationChannel for CountingChannel {
        async fn post(&self, embed: &NotificationEmbed) -> Result<Vec<MessageId>, ChannelError> {
            let mut titles = self.posted_titles.lock().unwrap();
            titles.push(embed.title.clone());
            Ok(vec![format!("m{}", titles.len())])
        }

        async fn delete(&self, _message_id: &MessageId) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    fn settings() -> EngineSettings {
        EngineSettings {
            variant_tag: "randomizer".to_string(),
            game_name: "Illusion of Gaia".to_string(),
            cleanup_policy: CleanupPolicy::Forget,
        }
    }

    #[tokio::test]
    async fn test_posts_use_variant_styling() {
        let provider = FixedProvider(vec![
            BroadcastRecord::new("s1", "Rando").with_tags(&["Randomizer"]),
            BroadcastRecord::new("s2", "Vanilla"),
        ]);
        let mut engine = ReconciliationEngine::new(provider, CountingChannel::default(), settings());

        let report = engine.tick().await.unwrap();
        assert_eq!(report.started, vec!["s1".to_string(), "s2".to_string()]);

        let titles = engine.channel().posted_titles.lock().unwrap().clone();
        assert_eq!(titles[0], "Rando is playing the randomizer! Check it out!");
        assert!(titles[1].starts_with("Vanilla is playing Illusion of Gaia!"));
    }

    #[tokio::test]
    async fn test_duplicate_ids_in_one_query_post_once() {
        let provider = FixedProvider(vec![
            BroadcastRecord::new("s1", "Runner"),
            BroadcastRecord::new("s1", "Runner"),
        ]);
        let mut engine = ReconciliationEngine::new(provider, CountingChannel::default(), settings());

        let report = engine.tick().await.unwrap();
        assert_eq!(report.fetched, 2);
        assert_eq!(report.started, vec!["s1".to_string()]);
        assert_eq!(engine.channel().posted_titles.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_steady_state_is_quiet() {
        let provider = FixedProvider(vec![BroadcastRecord::new("s1", "Runner")]);
        let mut engine = ReconciliationEngine::new(provider, CountingChannel::default(), settings());

        assert!(!engine.tick().await.unwrap().is_quiet());
        assert!(engine.tick().await.unwrap().is_quiet());
        assert_eq!(engine.stats().ticks, 2);
        assert_eq!(engine.stats().posts, 1);
    }

    #[test]
    fn test_settings_from_config() {
        let cfg = Config::from_lookup(|key| match key {
            "TWITCH_IOGRANDOMIZER_TAG" => Some("tag-1".to_string()),
            "TWITCH_CLIENT_ID" => Some("id".to_string()),
            "DISCORD_CHANNEL_ID" => Some("1".to_string()),
            "DISCORD_BOT_TOKEN" => Some("t".to_string()),
            "CLEANUP_POLICY" => Some("retain".to_string()),
            _ => None,
        })
        .unwrap();

        let settings = EngineSettings::from(&cfg);
        assert_eq!(settings.variant_tag, "tag-1");
        assert_eq!(settings.game_name, "Illusion of Gaia");
        assert_eq!(settings.cleanup_policy, CleanupPolicy::RetainFailed);
    }
}
