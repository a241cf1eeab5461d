//! Periodic background jobs: scoring and autosave.
//!
//! Both run as independent tokio tasks on a fixed period and stop as soon as
//! the shared [`ShutdownState`] fires. Neither holds the registry lock across
//! its expensive phase: scoring scans terrain off a snapshot of centers, and
//! autosave writes a cloned snapshot.

use crate::engine::IslandEngine;
use crate::persistence::SaveOutcome;
use crate::shutdown::ShutdownState;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Starts the scoring job.
pub fn spawn_score_task(engine: IslandEngine, shutdown: ShutdownState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = engine.config().scoring.interval();
        let mut interval = ticker(period);
        info!("📊 Island score job started (every {:?})", period);

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = interval.tick() => {
                    match engine.scores().run_cycle(engine.registry()).await {
                        Ok(updated) => debug!("📊 Scored {} islands", updated),
                        Err(e) => error!("❌ Score cycle failed: {}", e),
                    }
                }
            }
        }
        info!("📊 Island score job stopped");
    })
}

/// Starts the autosave job. Cycles with nothing to write are skipped.
pub fn spawn_autosave_task(engine: IslandEngine, shutdown: ShutdownState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = engine.config().persistence.autosave_interval();
        let mut interval = ticker(period);
        info!("💾 Island autosave job started (every {:?})", period);

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = interval.tick() => {
                    match engine.save(false).await {
                        Ok(SaveOutcome::Saved { islands }) => info!("💾 Island data autosaved ({} islands)", islands),
                        Ok(SaveOutcome::Skipped) => debug!("💾 Autosave skipped, nothing changed"),
                        Err(e) => error!("❌ Autosave failed, keeping in-memory state: {}", e),
                    }
                }
            }
        }
        info!("💾 Island autosave job stopped");
    })
}
