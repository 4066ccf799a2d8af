//! Process configuration for deploy-info.
//!
//! Everything is read from the environment once at startup and validated
//! before the listener is bound. A malformed value (e.g. `PORT=eighty`) is a
//! startup error rather than a silent fallback to the default; an unset or
//! empty value means "use the default".
//!
//! | Variable               | Default |
//! |------------------------|---------|
//! | `PORT`                 | `8080`  |
//! | `SHUTDOWN_GRACE_SECS`  | `30`    |
//! | `REQUEST_TIMEOUT_SECS` | `15`    |
//!
//! The `VERSION` override is deliberately *not* part of [`Config`]: it is
//! re-read on every `/info` request (see [`crate::version`]).

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;

use crate::version::VersionSource;

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port for the HTTP listener (default: 8080).
    pub port: u16,

    /// How long in-flight requests may run after a shutdown signal before the
    /// server is forcibly stopped (default: 30 s).
    pub grace_period: Duration,

    /// Upper bound for a single request; exceeding it yields `408 Request Timeout`
    /// (default: 15 s).
    pub request_timeout: Duration,

    /// Where the served version comes from.
    pub version: VersionSource,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: defaults::port(),
            grace_period: Duration::from_secs(defaults::grace_secs()),
            request_timeout: Duration::from_secs(defaults::request_timeout_secs()),
            version: VersionSource::default(),
        }
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    ///
    /// Tests pass a closure over a fixed map instead of touching process env.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or(&lookup, "PORT", defaults::port())?;
        let grace_secs = parse_or(&lookup, "SHUTDOWN_GRACE_SECS", defaults::grace_secs())?;
        let timeout_secs = parse_or(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            defaults::request_timeout_secs(),
        )?;

        let config = Self {
            port,
            grace_period: Duration::from_secs(grace_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            version: VersionSource::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.request_timeout.is_zero(),
            "REQUEST_TIMEOUT_SECS must be greater than zero"
        );
        Ok(())
    }

    /// Address the listener binds to: all interfaces on [`Config::port`].
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

/// Parse `key` with `T::from_str`, treating an unset or empty value as `default`.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid {key} value `{raw}`")),
        None => Ok(default),
    }
}

mod defaults {
    pub fn port() -> u16 { 8080 }
    pub fn grace_secs() -> u64 { 30 }
    pub fn request_timeout_secs() -> u64 { 15 }
}
