use std::env;
use std::time::Duration;

use streamwatch_core::providers::twitch::DEFAULT_GAME_ID;

use crate::engine::CleanupPolicy;

/// Startup configuration problem. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environmental variable: {0}")]
    Missing(&'static str),

    #[error("Invalid {key}: {value} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_bot_token: String,
    pub discord_channel_id: String,
    pub discord_api_base_url: String,

    pub twitch_client_id: String,
    pub twitch_client_secret: Option<String>,
    pub twitch_access_token: Option<String>,
    pub twitch_api_base_url: String,
    pub twitch_game_id: String,
    pub twitch_game_name: String,
    /// Tag that marks variant (randomizer) broadcasts; styling only.
    pub variant_tag: String,

    pub poll_interval: Duration,
    pub cleanup_policy: CleanupPolicy,
    pub stats_log_every_ticks: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let variant_tag = required("TWITCH_IOGRANDOMIZER_TAG")?;
        let twitch_client_id = required("TWITCH_CLIENT_ID")?;
        let discord_channel_id = required("DISCORD_CHANNEL_ID")?;
        let discord_bot_token = required("DISCORD_BOT_TOKEN")?;

        let poll_interval_ms = parse_u64("POLL_INTERVAL_MS", get("POLL_INTERVAL_MS"), 10_000)?;
        if poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "POLL_INTERVAL_MS",
                value: "0".to_string(),
                reason: "must be greater than zero",
            });
        }

        let cleanup_policy = match get("CLEANUP_POLICY") {
            None => CleanupPolicy::default(),
            Some(raw) => parse_cleanup_policy(&raw)?,
        };

        let stats_log_every_ticks =
            parse_u64("STATS_LOG_EVERY_TICKS", get("STATS_LOG_EVERY_TICKS"), 30)?.max(1);

        Ok(Self {
            discord_bot_token,
            discord_channel_id,
            discord_api_base_url: get("DISCORD_API_BASE_URL")
                .unwrap_or_else(|| "https://discord.com/api/v10".to_string()),
            twitch_client_id,
            twitch_client_secret: get("TWITCH_CLIENT_SECRET"),
            twitch_access_token: get("TWITCH_ACCESS_TOKEN"),
            twitch_api_base_url: get("TWITCH_API_BASE_URL")
                .unwrap_or_else(|| "https://api.twitch.tv".to_string()),
            twitch_game_id: get("TWITCH_GAME_ID").unwrap_or_else(|| DEFAULT_GAME_ID.to_string()),
            twitch_game_name: get("TWITCH_GAME_NAME")
                .unwrap_or_else(|| "Illusion of Gaia".to_string()),
            variant_tag,
            poll_interval: Duration::from_millis(poll_interval_ms),
            cleanup_policy,
            stats_log_every_ticks,
        })
    }
}

fn parse_u64(key: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected integer",
        }),
    }
}

fn parse_cleanup_policy(raw: &str) -> Result<CleanupPolicy, ConfigError> {
    match raw.to_lowercase().as_str() {
        "forget" => Ok(CleanupPolicy::Forget),
        "retain" | "retain_failed" => Ok(CleanupPolicy::RetainFailed),
        _ => Err(ConfigError::Invalid {
            key: "CLEANUP_POLICY",
            value: raw.to_string(),
            reason: "expected forget|retain",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("TWITCH_IOGRANDOMIZER_TAG", "randomizer"),
        ("TWITCH_CLIENT_ID", "client-id"),
        ("DISCORD_CHANNEL_ID", "1234"),
        ("DISCORD_BOT_TOKEN", "bot-token"),
    ];

    #[test]
    fn test_defaults() {
        let cfg = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_millis(10_000));
        assert_eq!(cfg.cleanup_policy, CleanupPolicy::Forget);
        assert_eq!(cfg.twitch_game_id, "4761");
        assert_eq!(cfg.twitch_game_name, "Illusion of Gaia");
        assert_eq!(cfg.variant_tag, "randomizer");
        assert!(cfg.twitch_client_secret.is_none());
        assert_eq!(cfg.stats_log_every_ticks, 30);
    }

    #[test]
    fn test_each_required_key_is_enforced() {
        for (missing, _) in REQUIRED {
            let pairs: Vec<(&str, &str)> = REQUIRED.iter().copied().filter(|(k, _)| *k != missing).collect();
            let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
            match err {
                ConfigError::Missing(key) => assert_eq!(key, missing),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs[3] = ("DISCORD_BOT_TOKEN", "   ");
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(err.to_string(), "Missing environmental variable: DISCORD_BOT_TOKEN");
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("POLL_INTERVAL_MS", "2500"));
        pairs.push(("CLEANUP_POLICY", "Retain"));
        pairs.push(("TWITCH_CLIENT_SECRET", "secret"));
        pairs.push(("TWITCH_GAME_ID", "999"));

        let cfg = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_millis(2500));
        assert_eq!(cfg.cleanup_policy, CleanupPolicy::RetainFailed);
        assert_eq!(cfg.twitch_client_secret.as_deref(), Some("secret"));
        assert_eq!(cfg.twitch_game_id, "999");
    }

    #[test]
    fn test_invalid_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("POLL_INTERVAL_MS", "soon"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::Invalid { key: "POLL_INTERVAL_MS", .. })
        ));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("POLL_INTERVAL_MS", "0"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CLEANUP_POLICY", "sometimes"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::Invalid { key: "CLEANUP_POLICY", .. })
        ));
    }
}
