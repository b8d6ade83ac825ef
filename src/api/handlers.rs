//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

use crate::state::AppState;
use super::responses::{ApiResponse, HealthResponse, StatusResponse};

/// Handle POST /clock/:slot/start - Start (or resume) one clock
pub async fn clock_start_handler(
    Path(slot): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.start_clock(&slot) {
        Ok(clocks) => {
            info!("Start requested for clock {}", slot);
            Ok(Json(ApiResponse::ok(format!("Clock {} started", slot), clocks)))
        }
        Err(e) => {
            error!("Failed to start clock {}: {}", slot, e);
            Err(StatusCode::NOT_FOUND)
        }
    }
}

/// Handle POST /clock/:slot/pause - Pause one clock
pub async fn clock_pause_handler(
    Path(slot): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.pause_clock(&slot) {
        Ok(clocks) => {
            info!("Pause requested for clock {}", slot);
            Ok(Json(ApiResponse::ok(format!("Clock {} paused", slot), clocks)))
        }
        Err(e) => {
            error!("Failed to pause clock {}: {}", slot, e);
            Err(StatusCode::NOT_FOUND)
        }
    }
}

/// Handle POST /clock/:slot/reset - Reset one clock to its initial duration
pub async fn clock_reset_handler(
    Path(slot): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.reset_clock(&slot) {
        Ok(clocks) => {
            info!("Reset requested for clock {}", slot);
            Ok(Json(ApiResponse::ok(format!("Clock {} reset", slot), clocks)))
        }
        Err(e) => {
            error!("Failed to reset clock {}: {}", slot, e);
            Err(StatusCode::NOT_FOUND)
        }
    }
}

/// Handle POST /pause-all - Pause every running clock
pub async fn pause_all_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.pause_all() {
        Ok(clocks) => {
            info!("Pause-all requested");
            Ok(Json(ApiResponse::ok("All running clocks paused".to_string(), clocks)))
        }
        Err(e) => {
            error!("Failed to pause all clocks: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /resume-all - Restart every paused clock
pub async fn resume_all_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.resume_all() {
        Ok(clocks) => {
            info!("Resume-all requested");
            Ok(Json(ApiResponse::ok("All paused clocks resumed".to_string(), clocks)))
        }
        Err(e) => {
            error!("Failed to resume all clocks: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /reset-all - Reset the whole roster
pub async fn reset_all_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.reset_all() {
        Ok(clocks) => {
            info!("Reset-all requested");
            Ok(Json(ApiResponse::ok("All clocks reset".to_string(), clocks)))
        }
        Err(e) => {
            error!("Failed to reset all clocks: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /handover/on - Enable jammer auto-handover
pub async fn handover_on_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.set_handover(true) {
        Ok(clocks) => {
            info!("Jammer auto-handover enabled via API");
            Ok(Json(ApiResponse::ok("Jammer auto-handover enabled".to_string(), clocks)))
        }
        Err(e) => {
            error!("Failed to enable handover: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /handover/off - Disable jammer auto-handover
pub async fn handover_off_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.set_handover(false) {
        Ok(clocks) => {
            info!("Jammer auto-handover disabled via API");
            Ok(Json(ApiResponse::ok("Jammer auto-handover disabled".to_string(), clocks)))
        }
        Err(e) => {
            error!("Failed to disable handover: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return the full board status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let clocks = match state.get_snapshot() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to get board snapshot: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let handover_enabled = match state.handover_enabled() {
        Ok(h) => h,
        Err(e) => {
            error!("Failed to get handover flag: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        clocks,
        handover_enabled,
        ticker_active: state.ticker_active(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
