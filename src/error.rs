//! Error types.
//!
//! - [`AppError`]: per-request failures inside axum handlers. Wraps
//!   [`anyhow::Error`] and renders as `500 Internal Server Error` with a JSON
//!   body, so a handler can return `Result<T, AppError>` and use `?` freely.
//!   One bad response never affects other requests or the process.
//! - [`ServerError`]: listener lifecycle failures surfaced to `main`.

use std::{io, net::SocketAddr};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Wraps [`anyhow::Error`] so it can be returned from axum handlers.
///
/// Anything that implements `Into<anyhow::Error>` (`serde_json::Error`,
/// `io::Error`, ...) converts via the blanket [`From`] impl.
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal server error" })),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

/// Failures of the HTTP listener itself.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listener could not be bound. Fatal at startup.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The accept loop terminated with an I/O error.
    #[error("server error: {0}")]
    Serve(#[from] io::Error),

    /// The serving task panicked or was cancelled unexpectedly.
    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
