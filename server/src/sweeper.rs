use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::services::LuckyDraw;

/// Runs the result sweep on a fixed interval inside the API process. Safe to
/// run alongside external sweeps: resolution is idempotent per raffle.
pub fn spawn_sweeper(lucky_draw: LuckyDraw, every: Duration) -> JoinHandle<()> {
    info!(interval_secs = every.as_secs(), "Starting in-process result sweeper");

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Err(err) = lucky_draw.run_sweep().await {
                error!(error = %err, "Result sweep failed");
            }
        }
    })
}
