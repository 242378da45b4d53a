//! Health check handlers for liveness and readiness probes.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// Health status response for probes.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthStatus {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Liveness probe handler.
pub async fn health_live() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthStatus::ok()))
}

/// Readiness probe handler. The wrapper has no warm-up state beyond its
/// startup configuration, so readiness follows liveness.
pub async fn health_ready() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthStatus::ok()))
}
