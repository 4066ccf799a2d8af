//! Deployment information endpoint (`GET /info`).
//!
//! Reports the normalized running version and a `deployed_at` timestamp.
//! Both are computed per request: the version sources are re-read every
//! time and the timestamp is the current UTC wall clock, not process start.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::{api::AppState, error::AppError};

/// Body of `GET /info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoResponse {
    pub version: String,
    /// RFC 3339, UTC, second precision (`2024-05-01T12:00:00Z`).
    pub deployed_at: String,
}

impl InfoResponse {
    pub fn new(version: String, now: DateTime<Utc>) -> Self {
        Self {
            version,
            deployed_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// `GET /info` — normalized version plus the current UTC timestamp.
///
/// Example response:
/// ```json
/// { "version": "1.189.0", "deployed_at": "2024-05-01T12:00:00Z" }
/// ```
///
/// The body is serialized up front so an encoding failure turns into a 500
/// for this caller only, instead of a half-written 200.
pub async fn info(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let payload = InfoResponse::new(state.version.resolve().await, Utc::now());
    let body = serde_json::to_vec(&payload)?;

    info!(version = %payload.version, "served /info");

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}
