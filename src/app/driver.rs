//! Session driver - the periodic task that advances the turn clock

use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::util::time::Timer;

use super::AppState;

/// Run the driver loop until the task is dropped
pub async fn run(state: AppState) {
    let period_ms = state.config.tick_interval_ms.max(1);
    info!(
        tick_interval_ms = period_ms,
        turn_ms = state.config.turn_ms,
        "Driver started"
    );

    let mut tick_interval = interval(Duration::from_millis(period_ms));
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tick_interval.tick().await;

        let timer = Timer::new();
        state.tick();

        let elapsed = timer.elapsed_ms();
        if elapsed > period_ms {
            warn!(elapsed_ms = elapsed, "Driver tick overran its interval");
        }
    }
}
