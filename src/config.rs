//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::lifecycle::PollPolicy;

/// Environment variable overriding `backend.base_url`.
pub const BACKEND_URL_ENV: &str = "PLAYGROUND_BACKEND_URL";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PLAYGROUND_CONFIG";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Where the prediction proxy lives.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Polling cadence.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Default selections.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Prediction proxy connection settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the proxy.
    pub base_url: String,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:3000".to_string(), request_timeout_secs: 60 }
    }
}

/// Polling settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between status requests.
    pub interval_ms: u64,
    /// Give up after this long.
    pub timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 1500, timeout_secs: 300 }
    }
}

/// Default parameter values from config file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Model used when `--model` is not given.
    pub model: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { model: "nano-banana".to_string() }
    }
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents).map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Get the proxy base URL, preferring the environment variable.
    #[must_use]
    pub fn backend_url(&self) -> String {
        resolve_backend_url(&self.backend, std::env::var(BACKEND_URL_ENV).ok())
    }

    /// HTTP request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_secs)
    }

    /// Polling cadence as a lifecycle policy.
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.polling.interval_ms),
            timeout: Duration::from_secs(self.polling.timeout_secs),
        }
    }
}

fn resolve_backend_url(backend: &BackendConfig, env_value: Option<String>) -> String {
    env_value.filter(|v| !v.trim().is_empty()).unwrap_or_else(|| backend.base_url.clone())
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `PLAYGROUND_CONFIG` environment variable
/// 3. `~/.config/imagen-playground/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/imagen-playground/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/imagen-playground/config.toml")
    } else {
        PathBuf::from("imagen-playground.toml")
    }
}
