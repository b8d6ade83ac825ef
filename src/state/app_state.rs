//! Main application state management

use std::sync::{Arc, Mutex};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::tasks::clock_tick_task;
use super::{ClockEvent, ClockSnapshot, TimerBoard};

/// Application state shared between the HTTP handlers and the tick task.
/// The board is the only mutable core; the tick-task handle exists exactly
/// while the board has running clocks.
#[derive(Debug)]
pub struct AppState {
    /// The clock roster and coordination logic
    pub board: Mutex<TimerBoard>,
    /// Shared tick interval in milliseconds
    pub tick_interval_ms: u64,
    /// Server metadata
    pub start_time: tokio::time::Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Clock change notifications (running/paused/expired/reset/low-time)
    pub event_tx: broadcast::Sender<ClockEvent>,
    /// Board snapshot published after every mutation
    pub board_update_tx: watch::Sender<Vec<ClockSnapshot>>,
    /// Keep the receivers alive to prevent channel closure
    _event_rx: broadcast::Receiver<ClockEvent>,
    _board_update_rx: watch::Receiver<Vec<ClockSnapshot>>,
    /// Handle of the shared tick task; Some iff clocks are running
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    /// Create a new AppState around a freshly built board
    pub fn new(port: u16, host: String, board: TimerBoard, tick_interval_ms: u64) -> Self {
        let (event_tx, event_rx) = broadcast::channel(100);
        let (board_update_tx, board_update_rx) = watch::channel(board.snapshot());

        Self {
            board: Mutex::new(board),
            tick_interval_ms,
            start_time: tokio::time::Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            event_tx,
            board_update_tx,
            _event_rx: event_rx,
            _board_update_rx: board_update_rx,
            ticker: Mutex::new(None),
        }
    }

    /// Milliseconds since server start. Monotonic; every clock computation
    /// uses this as its "now".
    pub fn now_ms(&self) -> i64 {
        self.start_time.elapsed().as_millis() as i64
    }

    /// Run one board mutation, publish its events and the fresh snapshot,
    /// then reconcile the tick task with the running set.
    fn apply<F>(self: &Arc<Self>, action: &str, op: F) -> Result<Vec<ClockSnapshot>, String>
    where
        F: FnOnce(&mut TimerBoard, i64) -> Vec<ClockEvent>,
    {
        let now_ms = self.now_ms();
        let mut board = self.board.lock()
            .map_err(|e| format!("Failed to lock board: {}", e))?;

        let events = op(&mut board, now_ms);
        let snapshot = board.snapshot();
        let has_running = board.has_running();
        drop(board); // Release the lock early

        // Update last action tracking
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        self.publish(events, snapshot.clone());
        self.sync_ticker(has_running)?;

        Ok(snapshot)
    }

    /// Start one clock by slot name
    pub fn start_clock(self: &Arc<Self>, slot: &str) -> Result<Vec<ClockSnapshot>, String> {
        let idx = self.resolve_slot(slot)?;
        self.apply("start", |board, now| board.start(idx, now))
    }

    /// Pause one clock by slot name
    pub fn pause_clock(self: &Arc<Self>, slot: &str) -> Result<Vec<ClockSnapshot>, String> {
        let idx = self.resolve_slot(slot)?;
        self.apply("pause", |board, now| board.pause(idx, now))
    }

    /// Reset one clock by slot name
    pub fn reset_clock(self: &Arc<Self>, slot: &str) -> Result<Vec<ClockSnapshot>, String> {
        let idx = self.resolve_slot(slot)?;
        self.apply("reset", |board, _| board.reset(idx))
    }

    /// Pause every running clock
    pub fn pause_all(self: &Arc<Self>) -> Result<Vec<ClockSnapshot>, String> {
        self.apply("pause-all", |board, now| board.pause_all(now))
    }

    /// Restart every paused clock
    pub fn resume_all(self: &Arc<Self>) -> Result<Vec<ClockSnapshot>, String> {
        self.apply("resume-all", |board, now| board.resume_all(now))
    }

    /// Reset the whole roster
    pub fn reset_all(self: &Arc<Self>) -> Result<Vec<ClockSnapshot>, String> {
        self.apply("reset-all", |board, _| board.reset_all())
    }

    /// Toggle the jammer auto-handover rule
    pub fn set_handover(self: &Arc<Self>, enabled: bool) -> Result<Vec<ClockSnapshot>, String> {
        let action = if enabled { "handover-on" } else { "handover-off" };
        self.apply(action, |board, _| {
            board.set_handover_enabled(enabled);
            Vec::new()
        })
    }

    /// One pass of the shared tick. Returns whether any clock is still
    /// running afterwards.
    pub fn tick_once(&self) -> bool {
        let now_ms = self.now_ms();
        let mut board = match self.board.lock() {
            Ok(board) => board,
            Err(e) => {
                warn!("Failed to lock board for tick: {}", e);
                return false;
            }
        };
        let events = board.tick(now_ms);
        let snapshot = board.snapshot();
        let has_running = board.has_running();
        drop(board);

        self.publish(events, snapshot);
        has_running
    }

    /// Called by the tick task when a tick left the running set empty.
    /// Returns true if the task should exit; a clock started in the gap
    /// keeps the ticker alive instead.
    pub fn finish_ticker(&self) -> bool {
        let mut ticker = match self.ticker.lock() {
            Ok(ticker) => ticker,
            Err(_) => return true,
        };
        let still_running = self.board.lock().map(|b| b.has_running()).unwrap_or(false);
        if still_running {
            return false;
        }
        ticker.take();
        debug!("Tick task stopped, no clocks running");
        true
    }

    /// Whether the shared tick task is currently live
    pub fn ticker_active(&self) -> bool {
        self.ticker.lock().map(|t| t.is_some()).unwrap_or(false)
    }

    /// Get the current board snapshot
    pub fn get_snapshot(&self) -> Result<Vec<ClockSnapshot>, String> {
        self.board.lock()
            .map(|board| board.snapshot())
            .map_err(|e| format!("Failed to lock board: {}", e))
    }

    /// Whether jammer auto-handover is currently enabled
    pub fn handover_enabled(&self) -> Result<bool, String> {
        self.board.lock()
            .map(|board| board.handover_enabled())
            .map_err(|e| format!("Failed to lock board: {}", e))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    fn resolve_slot(&self, slot: &str) -> Result<usize, String> {
        let board = self.board.lock()
            .map_err(|e| format!("Failed to lock board: {}", e))?;
        board.slot_index(slot)
            .ok_or_else(|| format!("Unknown clock slot: {}", slot))
    }

    fn publish(&self, events: Vec<ClockEvent>, snapshot: Vec<ClockSnapshot>) {
        for event in events {
            if let Err(e) = self.event_tx.send(event) {
                warn!("Failed to send clock event: {}", e);
            }
        }
        if let Err(e) = self.board_update_tx.send(snapshot) {
            warn!("Failed to send board update: {}", e);
        }
    }

    /// Keep the tick-task handle in lockstep with the running set: spawn on
    /// the first running clock, abort when the set empties. At most one
    /// live task per AppState.
    fn sync_ticker(self: &Arc<Self>, has_running: bool) -> Result<(), String> {
        let mut ticker = self.ticker.lock()
            .map_err(|e| format!("Failed to lock ticker handle: {}", e))?;

        if has_running {
            if ticker.is_none() {
                let state = Arc::clone(self);
                *ticker = Some(tokio::spawn(async move {
                    clock_tick_task(state).await;
                }));
                debug!("Tick task started at {}ms interval", self.tick_interval_ms);
            }
        } else if let Some(handle) = ticker.take() {
            handle.abort();
            debug!("Tick task aborted, no clocks running");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ClockEventKind, ClockStatus, TimerBoard};
    use std::time::Duration;
    use tokio::time::sleep;

    fn state(initial_ms: i64) -> Arc<AppState> {
        let board = TimerBoard::new(2, 3, initial_ms, true);
        Arc::new(AppState::new(0, "127.0.0.1".to_string(), board, 50))
    }

    fn status_of(snapshot: &[ClockSnapshot], slot: &str) -> ClockStatus {
        snapshot.iter().find(|c| c.slot == slot).unwrap().status
    }

    fn remaining_of(snapshot: &[ClockSnapshot], slot: &str) -> i64 {
        snapshot.iter().find(|c| c.slot == slot).unwrap().remaining_ms
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_exists_iff_clocks_run() {
        let state = state(30_000);
        assert!(!state.ticker_active());

        state.start_clock("team1-blocker1").unwrap();
        assert!(state.ticker_active());

        state.start_clock("team1-blocker2").unwrap();
        assert!(state.ticker_active());

        state.pause_clock("team1-blocker1").unwrap();
        assert!(state.ticker_active());

        state.pause_clock("team1-blocker2").unwrap();
        assert!(!state.ticker_active());

        state.resume_all().unwrap();
        assert!(state.ticker_active());

        state.reset_all().unwrap();
        assert!(!state.ticker_active());
    }

    #[tokio::test(start_paused = true)]
    async fn clock_expires_after_its_full_duration() {
        let state = state(5_000);
        state.start_clock("team1-jammer").unwrap();

        sleep(Duration::from_millis(5_200)).await;

        let snapshot = state.get_snapshot().unwrap();
        assert_eq!(status_of(&snapshot, "team1-jammer"), ClockStatus::Expired);
        assert_eq!(remaining_of(&snapshot, "team1-jammer"), 0);
        let display = &snapshot.iter().find(|c| c.slot == "team1-jammer").unwrap().display;
        assert_eq!(display, "\u{2800}00.00\u{2800}");

        // expiry emptied the running set, so the tick task wound down
        sleep(Duration::from_millis(200)).await;
        assert!(!state.ticker_active());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_and_resume_continues() {
        let state = state(5_000);
        state.start_clock("team2-blocker3").unwrap();

        sleep(Duration::from_millis(1_230)).await;
        let snapshot = state.pause_clock("team2-blocker3").unwrap();
        let frozen = remaining_of(&snapshot, "team2-blocker3");
        assert!((frozen - 3_770).abs() <= 50, "frozen at {}ms", frozen);

        // time passing while paused changes nothing
        sleep(Duration::from_millis(2_000)).await;
        let snapshot = state.get_snapshot().unwrap();
        assert_eq!(remaining_of(&snapshot, "team2-blocker3"), frozen);

        state.start_clock("team2-blocker3").unwrap();
        sleep(Duration::from_millis(1_000)).await;
        let snapshot = state.get_snapshot().unwrap();
        let remaining = remaining_of(&snapshot, "team2-blocker3");
        assert!(
            (remaining - (frozen - 1_000)).abs() <= 50,
            "resumed clock at {}ms",
            remaining
        );
    }

    #[tokio::test(start_paused = true)]
    async fn events_are_broadcast_for_transitions() {
        let state = state(5_000);
        let mut rx = state.event_tx.subscribe();

        state.start_clock("team1-blocker1").unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.slot, "team1-blocker1");
        assert_eq!(event.kind, ClockEventKind::Started);

        sleep(Duration::from_millis(5_200)).await;
        // a 5s clock is below the low-time threshold from its first tick,
        // so the low-time event precedes the expiry
        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, ClockEventKind::LowTime);
        loop {
            let event = rx.recv().await.unwrap();
            if event.kind == ClockEventKind::Expired {
                assert_eq!(event.slot, "team1-blocker1");
                break;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_slot_is_rejected() {
        let state = state(30_000);
        assert!(state.start_clock("team9-jammer").is_err());
        assert!(!state.ticker_active());
    }
}
