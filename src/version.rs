//! Version resolution for the `/info` endpoint.
//!
//! The served version comes from one of two sources, in order:
//!
//! 1. The `VERSION` environment variable, taken verbatim when non-empty.
//! 2. A `VERSION` file in the working directory, whitespace-trimmed.
//!
//! Whichever wins is then normalized by stripping a trailing `-SNAPSHOT`
//! marker. When neither source is available the sentinel [`UNKNOWN_VERSION`]
//! is served instead; missing configuration is never an error response.
//!
//! Sources are read on every call. Nothing is cached, so an operator can bump
//! the env var (on restart) or rewrite the file (live) and the next request
//! sees the new value.

use std::{
    future::Future,
    io,
    path::{Path, PathBuf},
};

use tracing::warn;

/// Environment variable consulted first.
pub const VERSION_ENV: &str = "VERSION";

/// Fallback file, relative to the process working directory.
pub const VERSION_FILE: &str = "VERSION";

/// Served when neither the override nor the file yields a value.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Build-qualifier marker removed during normalization.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Strip trailing `-SNAPSHOT` markers from `raw`.
///
/// Only end-anchored matches are removed, so `1.0-SNAPSHOT-beta` is returned
/// untouched. Repeated trailing markers are all removed, which keeps
/// `normalize(normalize(s)) == normalize(s)` for every input.
pub fn normalize(raw: &str) -> &str {
    let mut version = raw;
    while let Some(stripped) = version.strip_suffix(SNAPSHOT_SUFFIX) {
        version = stripped;
    }
    version
}

/// Resolve the served version from an explicit snapshot of its sources.
///
/// `override_value` wins when it is `Some` and non-empty. Otherwise
/// `read_file` is awaited; any I/O error collapses to [`UNKNOWN_VERSION`].
/// The file is never touched when the override wins.
pub async fn resolve_version<F, Fut>(override_value: Option<&str>, read_file: F) -> String
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = io::Result<String>>,
{
    if let Some(value) = override_value.filter(|v| !v.is_empty()) {
        return normalize(value).to_owned();
    }

    match read_file().await {
        Ok(contents) => normalize(contents.trim()).to_owned(),
        Err(e) => {
            warn!(error = %e, "could not read version file, serving \"unknown\"");
            UNKNOWN_VERSION.to_owned()
        }
    }
}

/// The live version sources of this process: an env var and a file path.
///
/// Cheap to clone; held in the shared handler state.
#[derive(Debug, Clone)]
pub struct VersionSource {
    env_key: String,
    file: PathBuf,
}

impl Default for VersionSource {
    fn default() -> Self {
        Self::new(VERSION_ENV, VERSION_FILE)
    }
}

impl VersionSource {
    pub fn new(env_key: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            env_key: env_key.into(),
            file: file.into(),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Read both sources now and return the normalized version.
    pub async fn resolve(&self) -> String {
        let override_value = std::env::var(&self.env_key).ok();
        resolve_version(override_value.as_deref(), || {
            tokio::fs::read_to_string(&self.file)
        })
        .await
    }
}
