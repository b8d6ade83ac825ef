//! Shared clock tick background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::state::AppState;

/// Drive every running clock from one periodic tick so all displays are
/// recomputed from the same "now" sample. The task is spawned when the
/// first clock starts and exits when the running set empties; AppState
/// aborts it directly when a pause or reset empties the set.
pub async fn clock_tick_task(state: Arc<AppState>) {
    debug!("Starting clock tick task ({}ms interval)", state.tick_interval_ms);

    let mut ticker = interval(Duration::from_millis(state.tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        if !state.tick_once() {
            // An expiry drained the running set. Exit unless a clock was
            // started between the tick and this check.
            if state.finish_ticker() {
                break;
            }
        }
    }
}
