//! Single countdown clock state machine

use serde::{Deserialize, Serialize};

/// Threshold below which a running clock signals its final-countdown state
pub const LOW_TIME_MS: i64 = 11_000;

/// Blank placeholder occupying the sign column of non-negative displays
pub const SIGN_PAD: char = '\u{2800}';

/// Role a clock slot plays on the track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockRole {
    Jammer,
    Blocker,
}

/// Lifecycle status of a single clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockStatus {
    Reset,
    Running,
    Paused,
    Expired,
}

/// Change notification kinds published on the event channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClockEventKind {
    Started,
    Paused,
    Reset,
    Expired,
    LowTime,
}

/// A change notification for one clock slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockEvent {
    pub slot: String,
    pub kind: ClockEventKind,
}

/// One countdown timer. `remaining_ms` is authoritative only while the clock
/// is not running; while running the truth is `end_at_ms - now` and is folded
/// back into `remaining_ms` on every recompute.
#[derive(Debug, Clone)]
pub struct Clock {
    label: String,
    role: ClockRole,
    initial_ms: i64,
    remaining_ms: i64,
    end_at_ms: Option<i64>,
    status: ClockStatus,
    low_signaled: bool,
}

impl Clock {
    /// Create a clock in the Reset state with its full initial duration
    pub fn new(label: impl Into<String>, role: ClockRole, initial_ms: i64) -> Self {
        Self {
            label: label.into(),
            role,
            initial_ms,
            remaining_ms: initial_ms,
            end_at_ms: None,
            status: ClockStatus::Reset,
            low_signaled: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn role(&self) -> ClockRole {
        self.role
    }

    pub fn status(&self) -> ClockStatus {
        self.status
    }

    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }

    pub fn initial_ms(&self) -> i64 {
        self.initial_ms
    }

    /// Begin (or resume) counting down from the current remaining time.
    /// Returns false if the clock was already running. An expired clock
    /// cannot restart without a reset.
    pub fn start(&mut self, now_ms: i64) -> bool {
        if self.status == ClockStatus::Running || self.status == ClockStatus::Expired {
            return false;
        }
        self.end_at_ms = Some(now_ms + self.remaining_ms);
        self.status = ClockStatus::Running;
        true
    }

    /// Freeze the countdown. Runs one final recomputation so the stored
    /// remaining time reflects the pause instant. Returns false unless the
    /// clock was running.
    pub fn pause(&mut self, now_ms: i64) -> bool {
        if self.status != ClockStatus::Running {
            return false;
        }
        if let Some(end) = self.end_at_ms {
            self.remaining_ms = end - now_ms;
        }
        self.end_at_ms = None;
        self.status = ClockStatus::Paused;
        true
    }

    /// Restore the initial duration. Returns false if already Reset.
    pub fn reset(&mut self) -> bool {
        if self.status == ClockStatus::Reset {
            return false;
        }
        self.remaining_ms = self.initial_ms;
        self.end_at_ms = None;
        self.status = ClockStatus::Reset;
        self.low_signaled = false;
        true
    }

    /// Refresh `remaining_ms` from the target end instant. Only meaningful
    /// while running; a result at or below zero clamps to zero and expires
    /// the clock. Crossing the low-time threshold is reported exactly once
    /// per run (the latch clears on reset).
    pub fn recompute(&mut self, now_ms: i64) -> Option<ClockEventKind> {
        let end = match self.end_at_ms {
            Some(end) if self.status == ClockStatus::Running => end,
            _ => return None,
        };
        self.remaining_ms = end - now_ms;
        if self.remaining_ms <= 0 {
            self.remaining_ms = 0;
            self.end_at_ms = None;
            self.status = ClockStatus::Expired;
            return Some(ClockEventKind::Expired);
        }
        if self.remaining_ms < LOW_TIME_MS && !self.low_signaled {
            self.low_signaled = true;
            return Some(ClockEventKind::LowTime);
        }
        None
    }

    /// Cut the countdown off at `now_ms` so the next recompute expires it.
    /// Used by the jammer handover; no-op unless running.
    pub fn force_stop(&mut self, now_ms: i64) {
        if self.status == ClockStatus::Running {
            self.end_at_ms = Some(now_ms);
        }
    }

    /// Rewrite the target end instant of a running clock. Used by the jammer
    /// handover to graft the previous jammer's elapsed time onto this one.
    pub fn set_target(&mut self, end_at_ms: i64) {
        if self.status == ClockStatus::Running {
            self.end_at_ms = Some(end_at_ms);
        }
    }

    /// Display-ready remaining time
    pub fn display_text(&self) -> String {
        format_ms(self.remaining_ms)
    }
}

/// Format milliseconds as a fixed-width `SS.HH` string. The sign column
/// carries a braille blank for non-negative values so the digits never
/// shift; negative input should not survive past one tick but renders
/// with a `-` so it is visible if it does.
pub fn format_ms(time_ms: i64) -> String {
    let (sign, ms) = if time_ms < 0 {
        ('-', -time_ms)
    } else {
        (SIGN_PAD, time_ms)
    };
    let secs = (ms % 60_000) / 1_000;
    let hundredths = (ms % 1_000) / 10;
    format!("{sign}{secs:02}.{hundredths:02}{SIGN_PAD}")
}
