//! Timer board: the roster of clocks plus the shared-tick coordination logic

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use super::clock::{Clock, ClockEvent, ClockEventKind, ClockRole, ClockStatus};

/// Display-ready view of one clock slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub slot: String,
    pub role: ClockRole,
    pub status: ClockStatus,
    pub remaining_ms: i64,
    pub display: String,
}

/// The full set of officiating clocks for a bout. Owns the roster, tracks
/// which clocks are running so one shared tick can recompute them all from
/// the same "now" sample, and applies the jammer handover rule.
///
/// All operations take an explicit `now_ms` so the board never reads a
/// clock source itself; callers are expected to serialize access (the
/// service wraps the board in a mutex).
#[derive(Debug)]
pub struct TimerBoard {
    clocks: Vec<Clock>,
    running: HashSet<usize>,
    active_jammer: Option<usize>,
    handover_enabled: bool,
    initial_ms: i64,
}

impl TimerBoard {
    /// Build the roster: per team, `blockers` Blocker slots and one Jammer
    /// slot. Slots are created once and live for the whole session.
    pub fn new(teams: usize, blockers: usize, initial_ms: i64, handover_enabled: bool) -> Self {
        let mut clocks = Vec::with_capacity(teams * (blockers + 1));
        for team in 1..=teams {
            for blocker in 1..=blockers {
                clocks.push(Clock::new(
                    format!("team{team}-blocker{blocker}"),
                    ClockRole::Blocker,
                    initial_ms,
                ));
            }
            clocks.push(Clock::new(
                format!("team{team}-jammer"),
                ClockRole::Jammer,
                initial_ms,
            ));
        }
        Self {
            clocks,
            running: HashSet::new(),
            active_jammer: None,
            handover_enabled,
            initial_ms,
        }
    }

    /// Look up a roster slot by its identifier
    pub fn slot_index(&self, slot: &str) -> Option<usize> {
        self.clocks.iter().position(|c| c.label() == slot)
    }

    pub fn has_running(&self) -> bool {
        !self.running.is_empty()
    }

    pub fn handover_enabled(&self) -> bool {
        self.handover_enabled
    }

    pub fn set_handover_enabled(&mut self, enabled: bool) {
        info!("Jammer auto-handover {}", if enabled { "enabled" } else { "disabled" });
        self.handover_enabled = enabled;
    }

    /// Start one clock. Jammer-tagged clocks go through the handover rule
    /// before joining the running set.
    pub fn start(&mut self, idx: usize, now_ms: i64) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        if !self.clocks[idx].start(now_ms) {
            return events;
        }
        if self.handover_enabled && self.clocks[idx].role() == ClockRole::Jammer {
            self.handover(idx, now_ms);
        }
        self.running.insert(idx);
        debug!("Clock {} started, {} running", self.clocks[idx].label(), self.running.len());
        events.push(self.event(idx, ClockEventKind::Started));
        events
    }

    /// Pause one clock, freezing its remaining time
    pub fn pause(&mut self, idx: usize, now_ms: i64) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        if self.clocks[idx].status() != ClockStatus::Running {
            return events;
        }
        self.running.remove(&idx);
        self.clocks[idx].pause(now_ms);
        if self.active_jammer == Some(idx) {
            self.active_jammer = None;
        }
        debug!("Clock {} paused at {}ms", self.clocks[idx].label(), self.clocks[idx].remaining_ms());
        events.push(self.event(idx, ClockEventKind::Paused));
        events
    }

    /// Reset one clock to its initial duration. Safe in every state.
    pub fn reset(&mut self, idx: usize) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        self.running.remove(&idx);
        if self.active_jammer == Some(idx) {
            self.active_jammer = None;
        }
        if self.clocks[idx].reset() {
            events.push(self.event(idx, ClockEventKind::Reset));
        }
        events
    }

    /// One shared tick: recompute every running clock from the same sample.
    /// Clocks that hit zero expire and leave the running set here.
    pub fn tick(&mut self, now_ms: i64) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        let mut members: Vec<usize> = self.running.iter().copied().collect();
        members.sort_unstable();
        for idx in members {
            if let Some(kind) = self.clocks[idx].recompute(now_ms) {
                if kind == ClockEventKind::Expired {
                    self.running.remove(&idx);
                    if self.active_jammer == Some(idx) {
                        self.active_jammer = None;
                    }
                    info!("Clock {} expired", self.clocks[idx].label());
                }
                events.push(self.event(idx, kind));
            }
        }
        events
    }

    /// Pause every running clock. The running set is snapshotted first
    /// because each pause removes its clock from it.
    pub fn pause_all(&mut self, now_ms: i64) -> Vec<ClockEvent> {
        let mut members: Vec<usize> = self.running.iter().copied().collect();
        members.sort_unstable();
        let mut events = Vec::new();
        for idx in members {
            events.extend(self.pause(idx, now_ms));
        }
        events
    }

    /// Restart every paused clock in the roster, running clocks untouched
    pub fn resume_all(&mut self, now_ms: i64) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        for idx in 0..self.clocks.len() {
            if self.clocks[idx].status() == ClockStatus::Paused {
                events.extend(self.start(idx, now_ms));
            }
        }
        events
    }

    /// Reset the whole roster regardless of state
    pub fn reset_all(&mut self) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        for idx in 0..self.clocks.len() {
            events.extend(self.reset(idx));
        }
        events
    }

    pub fn snapshot(&self) -> Vec<ClockSnapshot> {
        self.clocks
            .iter()
            .map(|c| ClockSnapshot {
                slot: c.label().to_string(),
                role: c.role(),
                status: c.status(),
                remaining_ms: c.remaining_ms(),
                display: c.display_text(),
            })
            .collect()
    }

    /// At most one jammer clock is conceptually live. The first jammer of a
    /// sequence just becomes the active one; any later jammer start cuts the
    /// previous jammer off at `now` and inherits its *elapsed* time as the
    /// new countdown budget. The superseded clock stays in the running set
    /// until its own next recompute notices it is out of time, so it gets
    /// one final tick of display update before expiring.
    fn handover(&mut self, idx: usize, now_ms: i64) {
        match self.active_jammer {
            None => self.active_jammer = Some(idx),
            Some(prev) if prev == idx => {}
            Some(prev) => {
                let elapsed = self.initial_ms - self.clocks[prev].remaining_ms();
                info!(
                    "Jammer handover: {} -> {} carrying {}ms elapsed",
                    self.clocks[prev].label(),
                    self.clocks[idx].label(),
                    elapsed
                );
                self.clocks[prev].force_stop(now_ms);
                self.clocks[idx].set_target(now_ms + elapsed);
                self.active_jammer = Some(idx);
            }
        }
    }

    fn event(&self, idx: usize, kind: ClockEventKind) -> ClockEvent {
        ClockEvent {
            slot: self.clocks[idx].label().to_string(),
            kind,
        }
    }

    #[cfg(test)]
    fn status_of(&self, slot: &str) -> ClockStatus {
        self.clocks[self.slot_index(slot).unwrap()].status()
    }

    #[cfg(test)]
    fn remaining_of(&self, slot: &str) -> i64 {
        self.clocks[self.slot_index(slot).unwrap()].remaining_ms()
    }

    #[cfg(test)]
    fn is_running_member(&self, slot: &str) -> bool {
        self.running.contains(&self.slot_index(slot).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> TimerBoard {
        TimerBoard::new(2, 3, 30_000, true)
    }

    #[test]
    fn roster_has_one_jammer_and_three_blockers_per_team() {
        let b = board();
        let snap = b.snapshot();
        assert_eq!(snap.len(), 8);
        assert_eq!(snap.iter().filter(|c| c.role == ClockRole::Jammer).count(), 2);
        assert!(b.slot_index("team2-blocker3").is_some());
        assert!(b.slot_index("team3-jammer").is_none());
    }

    #[test]
    fn running_set_tracks_running_status() {
        let mut b = board();
        let idx = b.slot_index("team1-blocker1").unwrap();
        b.start(idx, 0);
        assert!(b.is_running_member("team1-blocker1"));
        assert!(b.has_running());
        b.pause(idx, 1_000);
        assert!(!b.is_running_member("team1-blocker1"));
        assert!(!b.has_running());
    }

    #[test]
    fn expiry_clamps_and_leaves_running_set() {
        let mut b = TimerBoard::new(1, 1, 5_000, false);
        let idx = b.slot_index("team1-blocker1").unwrap();
        b.start(idx, 0);
        let events = b.tick(5_100);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ClockEventKind::Expired);
        assert_eq!(b.status_of("team1-blocker1"), ClockStatus::Expired);
        assert_eq!(b.remaining_of("team1-blocker1"), 0);
        assert!(!b.is_running_member("team1-blocker1"));
        assert!(!b.has_running());
    }

    #[test]
    fn first_jammer_start_does_not_transfer() {
        let mut b = board();
        let j1 = b.slot_index("team1-jammer").unwrap();
        b.start(j1, 0);
        b.tick(1_000);
        assert_eq!(b.remaining_of("team1-jammer"), 29_000);
    }

    #[test]
    fn jammer_handover_transfers_elapsed_time() {
        let mut b = board();
        let j1 = b.slot_index("team1-jammer").unwrap();
        let j2 = b.slot_index("team2-jammer").unwrap();
        b.start(j1, 0);
        b.tick(10_000); // team1 jammer has consumed 10s, 20s remain
        b.start(j2, 10_000);
        // the superseded jammer is cut off but stays running until its tick
        assert_eq!(b.status_of("team1-jammer"), ClockStatus::Running);
        assert!(b.is_running_member("team1-jammer"));
        let events = b.tick(10_050);
        assert!(events
            .iter()
            .any(|e| e.slot == "team1-jammer" && e.kind == ClockEventKind::Expired));
        assert_eq!(b.status_of("team1-jammer"), ClockStatus::Expired);
        // the new jammer inherited the 10s the old one consumed
        assert_eq!(b.remaining_of("team2-jammer"), 9_950);
        b.tick(12_000);
        assert_eq!(b.remaining_of("team2-jammer"), 8_000);
    }

    #[test]
    fn handover_with_spent_budget_expires_new_jammer_immediately() {
        let mut b = board();
        let j1 = b.slot_index("team1-jammer").unwrap();
        let j2 = b.slot_index("team2-jammer").unwrap();
        b.start(j1, 0);
        // zero elapsed on the previous jammer puts the handover target
        // exactly at "now"
        b.tick(0);
        b.start(j2, 0);
        let events = b.tick(50);
        assert!(events
            .iter()
            .any(|e| e.slot == "team2-jammer" && e.kind == ClockEventKind::Expired));
    }

    #[test]
    fn handover_disabled_lets_both_jammers_run() {
        let mut b = TimerBoard::new(2, 3, 30_000, false);
        let j1 = b.slot_index("team1-jammer").unwrap();
        let j2 = b.slot_index("team2-jammer").unwrap();
        b.start(j1, 0);
        b.start(j2, 5_000);
        b.tick(10_000);
        assert_eq!(b.status_of("team1-jammer"), ClockStatus::Running);
        assert_eq!(b.status_of("team2-jammer"), ClockStatus::Running);
        assert_eq!(b.remaining_of("team1-jammer"), 20_000);
        assert_eq!(b.remaining_of("team2-jammer"), 25_000);
    }

    #[test]
    fn pausing_the_active_jammer_ends_the_sequence() {
        let mut b = board();
        let j1 = b.slot_index("team1-jammer").unwrap();
        let j2 = b.slot_index("team2-jammer").unwrap();
        b.start(j1, 0);
        b.tick(5_000);
        b.pause(j1, 5_000);
        // team2 jammer starts a fresh sequence: no transfer from the paused one
        b.start(j2, 8_000);
        b.tick(9_000);
        assert_eq!(b.remaining_of("team2-jammer"), 29_000);
        assert_eq!(b.status_of("team1-jammer"), ClockStatus::Paused);
        assert_eq!(b.remaining_of("team1-jammer"), 25_000);
    }

    #[test]
    fn pause_all_only_touches_running_clocks() {
        let mut b = board();
        let b1 = b.slot_index("team1-blocker1").unwrap();
        let b2 = b.slot_index("team1-blocker2").unwrap();
        let b3 = b.slot_index("team2-blocker1").unwrap();
        b.start(b1, 5_000);
        b.start(b2, 0);
        b.pause(b2, 1_000);
        b.start(b3, 0);
        b.tick(30_500); // b3 ran its full 30s and expires here
        let events = b.pause_all(31_000);
        // only b1 was still running; b2 stays paused where it was, b3 expired
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].slot, "team1-blocker1");
        assert_eq!(b.remaining_of("team1-blocker1"), 4_000);
        assert_eq!(b.status_of("team1-blocker2"), ClockStatus::Paused);
        assert_eq!(b.remaining_of("team1-blocker2"), 29_000);
        assert_eq!(b.status_of("team2-blocker1"), ClockStatus::Expired);
        assert!(!b.has_running());
    }

    #[test]
    fn resume_all_only_touches_paused_clocks() {
        let mut b = board();
        let b1 = b.slot_index("team1-blocker1").unwrap();
        let b2 = b.slot_index("team1-blocker2").unwrap();
        b.start(b1, 0);
        b.start(b2, 0);
        b.pause(b2, 4_000);
        let events = b.resume_all(10_000);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].slot, "team1-blocker2");
        b.tick(11_000);
        // resumed from 26s remaining, not restarted
        assert_eq!(b.remaining_of("team1-blocker2"), 25_000);
        // the clock that never paused kept its original target
        assert_eq!(b.remaining_of("team1-blocker1"), 19_000);
    }

    #[test]
    fn reset_all_returns_every_clock_to_initial() {
        let mut b = board();
        let b1 = b.slot_index("team1-blocker1").unwrap();
        let b2 = b.slot_index("team1-blocker2").unwrap();
        let j1 = b.slot_index("team1-jammer").unwrap();
        b.start(b1, 15_000); // still running at the tick below
        b.start(b2, 0);
        b.pause(b2, 2_000); // paused
        b.start(j1, 0);
        b.tick(31_000); // jammer expired; team1-blocker3 never left Reset
        b.reset_all();
        for snap in b.snapshot() {
            assert_eq!(snap.status, ClockStatus::Reset);
            assert_eq!(snap.remaining_ms, 30_000);
        }
        assert!(!b.has_running());
    }

    #[test]
    fn reset_is_safe_on_a_clock_that_never_ran() {
        let mut b = board();
        let idx = b.slot_index("team2-jammer").unwrap();
        assert!(b.reset(idx).is_empty());
        assert_eq!(b.status_of("team2-jammer"), ClockStatus::Reset);
    }
}
