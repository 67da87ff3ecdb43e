pub mod discord;
pub mod twitch;

// Re-export commonly used types
pub use discord::{BotUser, DiscordChannel, DiscordClient};
pub use twitch::{StreamQuery, TwitchAuth, TwitchClient};
