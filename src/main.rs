//! Derby Timer - A state-managed HTTP server for officiating timers
//!
//! This is the main entry point for the derby-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use derby_timer::{
    config::Config,
    state::{AppState, TimerBoard},
    api::create_router,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("derby_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting derby-timer server v1.1.0");
    info!(
        "Configuration: host={}, port={}, duration={}ms, tick={}ms, teams={}, blockers={}, handover={}",
        config.host, config.port, config.duration, config.tick,
        config.teams, config.blockers, config.handover_enabled()
    );

    // Build the clock roster and application state. The tick task is not
    // spawned here; it comes and goes with the running set.
    let board = TimerBoard::new(
        config.teams,
        config.blockers,
        config.duration,
        config.handover_enabled(),
    );
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        board,
        config.tick,
    ));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /clock/:slot/start - Start or resume a clock");
    info!("  POST /clock/:slot/pause - Pause a clock");
    info!("  POST /clock/:slot/reset - Reset a clock");
    info!("  POST /pause-all         - Pause all running clocks");
    info!("  POST /resume-all        - Resume all paused clocks");
    info!("  POST /reset-all         - Reset every clock");
    info!("  POST /handover/on       - Enable jammer auto-handover");
    info!("  POST /handover/off      - Disable jammer auto-handover");
    info!("  GET  /status            - Board status and timer details");
    info!("  GET  /health            - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
