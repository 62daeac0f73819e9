//! Configuration for the MemcacheDB client

use serde::Deserialize;
use std::time::Duration;

/// Client configuration.
///
/// All fields have defaults matching the historical client behavior, so a
/// `ClientConfig::default()` is a working single-threaded, failover-enabled
/// configuration with a 500 ms I/O timeout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix for every key on the wire: `<namespace>:<key>`. `None` means
    /// keys are sent verbatim.
    pub namespace: Option<String>,

    /// When true, all mutating operations fail with `ReadOnly`.
    pub readonly: bool,

    /// Selects the threading mode: `false` pins the client to the
    /// constructing thread, `true` serializes all traffic through one
    /// client-wide mutex.
    pub multithread: bool,

    /// When false, a dead primary server fails the request immediately
    /// instead of rehashing onto another server.
    pub failover: bool,

    /// Per-I/O deadline in seconds. `None` (or 0) disables socket timeouts.
    pub timeout: Option<f64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            readonly: false,
            multithread: false,
            failover: true,
            timeout: Some(0.5),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::McdbError::Config(format!("Failed to read config file: {e}"))
        })?;

        toml::from_str(&contents)
            .map_err(|e| crate::McdbError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables or use defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(ns) = std::env::var("MCDB_NAMESPACE") {
            config.namespace = Some(ns);
        }

        if let Ok(v) = std::env::var("MCDB_READONLY") {
            config.readonly = v.to_lowercase() == "true" || v == "1";
        }

        if let Ok(v) = std::env::var("MCDB_MULTITHREAD") {
            config.multithread = v.to_lowercase() == "true" || v == "1";
        }

        if let Ok(v) = std::env::var("MCDB_FAILOVER") {
            config.failover = v.to_lowercase() == "true" || v == "1";
        }

        if let Ok(v) = std::env::var("MCDB_TIMEOUT") {
            if let Ok(secs) = v.parse::<f64>() {
                config.timeout = Some(secs);
            }
        }

        config
    }

    /// The per-I/O deadline as a `Duration`. `None` and non-positive values
    /// disable socket timeouts.
    pub(crate) fn io_timeout(&self) -> crate::Result<Option<Duration>> {
        match self.timeout {
            None => Ok(None),
            Some(secs) if secs <= 0.0 => Ok(None),
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(Some)
                .map_err(|e| crate::McdbError::Config(format!("invalid timeout: {e}"))),
        }
    }
}
