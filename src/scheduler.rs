// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::pipeline::Orchestrator;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval_secs: u64,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            interval_secs: 30 * 60,
        }
    }
}

/// Spawn the periodic ingestion loop. The first tick fires immediately, so
/// a fresh process ingests right away. A cycle that overruns the interval
/// delays the next tick instead of stacking a second cycle; the cycle gate
/// inside the orchestrator additionally serializes against manual runs.
/// No cycle outcome, good or bad, ever stops the loop.
pub fn spawn_cycle_scheduler(cfg: SchedulerCfg, orchestrator: Arc<Orchestrator>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(cfg.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let stored = orchestrator.run_cycle().await;
            info!(target: "scheduler", stored, "scheduled ingestion cycle finished");
        }
    })
}
