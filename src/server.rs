//! Listener lifecycle: bind, serve, graceful shutdown.
//!
//! ```text
//! Starting ──bind──▶ Serving ──signal──▶ ShuttingDown ──drained / deadline──▶ Stopped
//! ```
//!
//! On the shutdown signal the accept loop stops immediately and in-flight
//! requests get up to `grace_period` to finish. If they are still running
//! when the deadline passes the accept task is aborted and the outcome is
//! reported as [`ShutdownOutcome::Forced`]. Connection tasks spawned by
//! `axum::serve` are not cancelled by that abort; their work is abandoned
//! when the process exits, which `main` does immediately on a forced
//! outcome. Either way [`Server::run`] returns, so a slow request can never
//! hang the process.

use std::{
    fmt,
    future::{Future, IntoFuture},
    net::SocketAddr,
    time::Duration,
};

use axum::Router;
use tokio::{net::TcpListener, signal, sync::watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::ServerError;

/// Where the server is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Serving,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Starting => "starting",
            Self::Serving => "serving",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
        })
    }
}

/// How the server stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every in-flight request completed within the grace period.
    Graceful,
    /// The grace period elapsed first. Requests still running on their
    /// connection tasks are abandoned once the caller exits the process.
    Forced,
}

/// A bound listener plus the app it will serve.
pub struct Server {
    listener: TcpListener,
    app: Router,
    grace_period: Duration,
    phase: watch::Sender<Phase>,
}

impl Server {
    /// Bind `addr`. Failure here is fatal for the process.
    pub async fn bind(
        addr: SocketAddr,
        app: Router,
        grace_period: Duration,
    ) -> Result<Self, ServerError> {
        let (phase, _) = watch::channel(Phase::Starting);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            app,
            grace_period,
            phase,
        })
    }

    /// Actual bound address (resolves port `0` in tests).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Subscribe to lifecycle transitions.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Serve until `shutdown` resolves, then drain within the grace period.
    pub async fn run<S>(self, shutdown: S) -> Result<ShutdownOutcome, ServerError>
    where
        S: Future<Output = ()> + Send,
    {
        let Self {
            listener,
            app,
            grace_period,
            phase,
        } = self;

        let token = CancellationToken::new();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(token.clone().cancelled_owned())
            .into_future();
        let mut task = tokio::spawn(serve);
        transition(&phase, Phase::Serving);

        tokio::select! {
            joined = &mut task => {
                // Accept loop ended without a signal: that's always an error.
                transition(&phase, Phase::Stopped);
                joined??;
                return Err(ServerError::Serve(std::io::Error::other(
                    "server exited before shutdown was requested",
                )));
            }
            _ = shutdown => {}
        }

        transition(&phase, Phase::ShuttingDown);
        info!(
            grace_secs = grace_period.as_secs_f64(),
            "stopped accepting connections, draining in-flight requests"
        );
        token.cancel();

        let outcome = match tokio::time::timeout(grace_period, &mut task).await {
            Ok(joined) => {
                joined??;
                ShutdownOutcome::Graceful
            }
            Err(_) => {
                task.abort();
                error!(
                    grace_secs = grace_period.as_secs_f64(),
                    "grace period elapsed with requests still in flight, forcing shutdown"
                );
                ShutdownOutcome::Forced
            }
        };

        transition(&phase, Phase::Stopped);
        Ok(outcome)
    }
}

fn transition(phase: &watch::Sender<Phase>, next: Phase) {
    phase.send_replace(next);
    tracing::debug!(phase = %next, "lifecycle transition");
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
