//! Liveness probe endpoint.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

/// Fixed status literal reported by `/health`.
pub const HEALTHY: &str = "healthy";

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: HEALTHY.to_string(),
        }
    }
}

/// `GET /health` — always returns 200 OK with `{"status": "healthy"}`.
///
/// No dependencies, never blocks, safe as a Docker / Kubernetes liveness
/// probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse::default()))
}
