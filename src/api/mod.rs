//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/clock/:slot/start", post(clock_start_handler))
        .route("/clock/:slot/pause", post(clock_pause_handler))
        .route("/clock/:slot/reset", post(clock_reset_handler))
        .route("/pause-all", post(pause_all_handler))
        .route("/resume-all", post(resume_all_handler))
        .route("/reset-all", post(reset_all_handler))
        .route("/handover/on", post(handover_on_handler))
        .route("/handover/off", post(handover_off_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
