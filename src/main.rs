use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

mod api;
mod config;
mod error;
mod healthcheck;
mod server;
mod version;

use config::Config;
use server::{shutdown_signal, Server, ShutdownOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Docker HEALTHCHECK entry point: hit /health and exit immediately.
    if std::env::args().nth(1).as_deref() == Some("--healthcheck") {
        let port = healthcheck::port_or_default(Config::from_env());
        std::process::exit(healthcheck::run(port).await);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deploy_info=info,tower_http=warn".into()),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let addr = config.listen_addr();
    let state = Arc::new(api::AppState::new(config.version.clone()));
    let app = api::app(state, config.request_timeout);

    let server = Server::bind(addr, app, config.grace_period)
        .await
        .context("failed to start server")?;

    info!(
        addr = %server.local_addr()?,
        version_file = %config.version.file().display(),
        grace_secs = config.grace_period.as_secs(),
        "deploy-info listening"
    );

    match server.run(shutdown_signal()).await? {
        ShutdownOutcome::Graceful => {
            info!("server stopped");
            Ok(())
        }
        ShutdownOutcome::Forced => {
            error!("server stopped after forced shutdown");
            std::process::exit(1);
        }
    }
}
