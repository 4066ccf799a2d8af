//! `deploy-info --healthcheck`: probe our own `/health` and exit.
//!
//! Lets a Docker `HEALTHCHECK` run the service binary itself instead of
//! shipping curl or wget in the image.

use std::time::Duration;

use anyhow::Context;

use crate::config::Config;

/// Probe timeout. Docker's default healthcheck timeout is 30 s; stay well below.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Port to probe. A config error is reported on stderr and the default port
/// is used instead, so a bad `PORT` is visible in the healthcheck output.
pub fn port_or_default(config: anyhow::Result<Config>) -> u16 {
    match config {
        Ok(config) => config.port,
        Err(e) => {
            let port = Config::default().port;
            eprintln!("healthcheck: {e:#}; probing default port {port}");
            port
        }
    }
}

/// URL of the local liveness endpoint for `port`.
pub fn health_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}/health")
}

/// `GET url` and report whether it answered 2xx.
///
/// Transport errors (refused, timeout) are returned as `Err`; callers
/// treat both `Err` and `Ok(false)` as unhealthy.
pub async fn probe(url: &str) -> anyhow::Result<bool> {
    let client = reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .context("building healthcheck client")?;
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {url}"))?;
    Ok(resp.status().is_success())
}

/// Run the probe against `port` and return the process exit code:
/// 0 healthy, 1 otherwise.
pub async fn run(port: u16) -> i32 {
    let url = health_url(port);
    match probe(&url).await {
        Ok(true) => 0,
        Ok(false) => {
            eprintln!("healthcheck: {url} returned a non-success status");
            1
        }
        Err(e) => {
            eprintln!("healthcheck: {e:#}");
            1
        }
    }
}
