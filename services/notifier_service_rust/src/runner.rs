use std::future::Future;
use std::time::Duration;

use log::{info, warn};
use streamwatch_core::{BroadcastProvider, NotificationChannel};

use crate::engine::ReconciliationEngine;

/// Drive the engine until `shutdown` resolves.
///
/// Ticks run back to back with `interval` of sleep between the end of one tick
/// and the start of the next, so ticks never overlap. An in-flight tick is
/// never cancelled; shutdown is observed between ticks.
pub async fn run_until<P, C, F>(
    engine: &mut ReconciliationEngine<P, C>,
    interval: Duration,
    stats_log_every_ticks: u64,
    shutdown: F,
) where
    P: BroadcastProvider,
    C: NotificationChannel,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let stats_every = stats_log_every_ticks.max(1);

    info!(
        "Polling {} every {}ms",
        engine.provider().provider_name(),
        interval.as_millis()
    );

    loop {
        match engine.tick().await {
            Ok(report) if !report.is_quiet() => info!(
                "Tick: live={} started={} ended={} delete_failures={} post_failures={}",
                report.fetched,
                report.started.len(),
                report.ended.len(),
                report.delete_failures,
                report.post_failures
            ),
            Ok(_) => {}
            Err(e) => warn!("Skipping tick, broadcast query failed: {}", e),
        }

        let stats = engine.stats();
        if stats.ticks % stats_every == 0 {
            info!(
                "Notifier stats: ticks={} query_failures={} active={} posts={} post_failures={} deletes={} delete_failures={}",
                stats.ticks,
                stats.query_failures,
                engine.active().len(),
                stats.posts,
                stats.post_failures,
                stats.deletes,
                stats.delete_failures
            );
        }

        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown requested, polling stopped");
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
