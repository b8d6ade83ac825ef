//! Configuration and CLI argument handling

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "derby-timer")]
#[command(about = "A state-managed HTTP server for multi-clock roller derby officiating timers")]
#[command(version = "1.1.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Initial clock duration in milliseconds
    #[arg(short, long, default_value = "30000")]
    pub duration: i64,

    /// Shared tick interval in milliseconds
    #[arg(long, default_value = "50")]
    pub tick: u64,

    /// Number of teams on the roster
    #[arg(long, default_value = "2")]
    pub teams: usize,

    /// Blocker clock slots per team (each team also gets one jammer slot)
    #[arg(long, default_value = "3")]
    pub blockers: usize,

    /// Disable the jammer auto-handover rule at startup
    #[arg(long)]
    pub no_handover: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Whether the jammer auto-handover rule starts enabled
    pub fn handover_enabled(&self) -> bool {
        !self.no_handover
    }
}
