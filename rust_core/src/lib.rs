//! Streamwatch Core - stream discovery and chat notification plumbing.
//!
//! This module provides:
//! - Broadcast models and the Discord embed payload shape
//! - Typed errors for the query and channel seams
//! - Twitch Helix and Discord REST clients
//! - The `BroadcastProvider` and `NotificationChannel` traits with their
//!   Twitch and Discord implementations
//! - An API circuit breaker shared by the HTTP clients

pub mod channels;
pub mod circuit_breaker;
pub mod clients;
pub mod error;
pub mod models;
pub mod providers;

pub use channels::NotificationChannel;
pub use error::{ChannelError, QueryError};
pub use models::{BroadcastRecord, MessageId, NotificationEmbed};
pub use providers::BroadcastProvider;
