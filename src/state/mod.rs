//! State management module
//!
//! This module contains the clock state machine, the timer board that
//! coordinates running clocks, and the shared application state.

pub mod app_state;
pub mod board;
pub mod clock;

// Re-export main types
pub use app_state::AppState;
pub use board::{ClockSnapshot, TimerBoard};
pub use clock::{Clock, ClockEvent, ClockEventKind, ClockRole, ClockStatus};
