//! Derby Timer - A state-managed HTTP server for officiating timers
//!
//! This library provides a roster of independently controllable countdown
//! clocks (jammer and blocker slots per team), a coordinator that drives all
//! running clocks from one shared tick, bulk pause/resume/reset operations,
//! and the jammer auto-handover rule.

pub mod config;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, TimerBoard};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
