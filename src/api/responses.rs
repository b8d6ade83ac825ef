//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::ClockSnapshot;

/// API response structure for clock operation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub clocks: Vec<ClockSnapshot>,
}

impl ApiResponse {
    /// Create an ok response
    pub fn ok(message: String, clocks: Vec<ClockSnapshot>) -> Self {
        Self {
            status: "ok".to_string(),
            message,
            timestamp: Utc::now(),
            clocks,
        }
    }
}

/// Full board status with coordinator information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub clocks: Vec<ClockSnapshot>,
    pub handover_enabled: bool,
    pub ticker_active: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: "1.1.0".to_string(),
        }
    }
}
