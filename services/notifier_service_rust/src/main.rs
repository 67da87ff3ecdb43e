use anyhow::{Context, Result};
use dotenv::dotenv;
use log::{error, info};
use notifier_service_rust::config::Config;
use notifier_service_rust::engine::{EngineSettings, ReconciliationEngine};
use notifier_service_rust::runner::run_until;
use streamwatch_core::channels::DiscordNotificationChannel;
use streamwatch_core::clients::{DiscordClient, TwitchAuth, TwitchClient};
use streamwatch_core::providers::TwitchBroadcastProvider;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    info!("Starting Stream Notifier Service...");

    // Fails before any network activity.
    let cfg = Config::from_env().context("Invalid configuration")?;
    info!(
        "Config: game={} ({}) channel={} interval={}ms cleanup={:?}",
        cfg.twitch_game_name,
        cfg.twitch_game_id,
        cfg.discord_channel_id,
        cfg.poll_interval.as_millis(),
        cfg.cleanup_policy,
    );

    let twitch_auth = match (&cfg.twitch_client_secret, &cfg.twitch_access_token) {
        (Some(secret), _) => TwitchAuth::ClientCredentials {
            client_secret: secret.clone(),
        },
        (None, Some(token)) => TwitchAuth::Static(token.clone()),
        (None, None) => TwitchAuth::ClientIdOnly,
    };
    let twitch = TwitchClient::with_base_url(
        cfg.twitch_client_id.clone(),
        twitch_auth,
        cfg.twitch_api_base_url.clone(),
    );
    let provider = TwitchBroadcastProvider::new(twitch, cfg.twitch_game_id.clone());

    let discord = DiscordClient::with_base_url(
        cfg.discord_bot_token.clone(),
        cfg.discord_api_base_url.clone(),
    );
    let channel = DiscordNotificationChannel::new(discord, cfg.discord_channel_id.clone());
    channel
        .connect()
        .await
        .context("Failed to open Discord session")?;

    let settings = EngineSettings::from(&cfg);
    let mut engine = ReconciliationEngine::new(provider, channel, settings);

    run_until(
        &mut engine,
        cfg.poll_interval,
        cfg.stats_log_every_ticks,
        shutdown_signal(),
    )
    .await;

    info!("Stopping bot...");
    engine.channel().close();
    info!(
        "Stopped with {} broadcast(s) still announced",
        engine.active().len()
    );

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(err) => {
                error!("Unable to listen for shutdown signal: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM");
            }
            Err(err) => {
                error!("Unable to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
