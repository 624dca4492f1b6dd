// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration management.
//!
//! Configuration is stored in `.tack/config.toml`. Every section is optional
//! and falls back to defaults, so an empty file is a valid configuration:
//!
//! ```toml
//! [backend]
//! url = "wss://crm.example.com/sync"
//!
//! [retry]
//! max_attempts = 5
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

const WORK_DIR_NAME: &str = ".tack";
const CONFIG_FILE_NAME: &str = "config.toml";
const PENDING_FILE_NAME: &str = "pending.jsonl";
const FAILED_FILE_NAME: &str = "failed.jsonl";
const LOG_FILE_NAME: &str = "tack.log";

/// Default backend address, matching `tack-remote`'s default bind.
pub const DEFAULT_BACKEND_URL: &str = "ws://localhost:7890";

/// Project configuration stored in `.tack/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub update: UpdateConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Where operations are replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// WebSocket URL (`ws://` or `wss://`).
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Max time to wait for the backend's answer to one replay (seconds).
    #[serde(default = "default_reply_timeout_secs")]
    pub reply_timeout_secs: u64,
}

/// Reachability probing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// Interval between probes (milliseconds).
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    /// Max time for one TCP connect probe (milliseconds).
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

/// Retry and dead-letter policy for transient replay failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts before an operation is moved to the failed list (0 = unlimited).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First auto-retry delay (milliseconds).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound of the auto-retry delay (seconds).
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

/// New-release detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Release marker file naming the installed version. Relative paths are
    /// resolved against the project root. Unset disables update detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<PathBuf>,
}

/// Client notifications sent after a successful sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Shell command receiving each notification as JSON on stdin.
    /// Unset means notifications are only logged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_reply_timeout_secs() -> u64 {
    10
}

fn default_probe_interval_ms() -> u64 {
    5_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

fn default_max_attempts() -> u32 {
    10
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_secs() -> u64 {
    60
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            url: default_backend_url(),
            reply_timeout_secs: default_reply_timeout_secs(),
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        ConnectivityConfig {
            probe_interval_ms: default_probe_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl BackendConfig {
    /// Returns an error if the URL is not a WebSocket URL or the reply
    /// timeout is zero.
    pub fn validate(&self) -> Result<()> {
        validate_backend_url(&self.url)?;
        require_nonzero("backend.reply_timeout_secs", self.reply_timeout_secs)
    }

    /// Returns the `host:port` the reachability probe connects to.
    pub fn probe_addr(&self) -> Result<String> {
        let (rest, default_port) = if let Some(rest) = self.url.strip_prefix("wss://") {
            (rest, 443)
        } else if let Some(rest) = self.url.strip_prefix("ws://") {
            (rest, 80)
        } else {
            return Err(Error::InvalidBackendUrl(self.url.clone()));
        };

        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let authority = authority.rsplit('@').next().unwrap_or_default();
        if authority.is_empty() {
            return Err(Error::InvalidBackendUrl(self.url.clone()));
        }

        // A port follows the last ':' unless that colon sits inside an IPv6 literal
        let has_port = authority
            .rsplit_once(':')
            .is_some_and(|(_, port)| !port.contains(']') && port.parse::<u16>().is_ok());
        if has_port {
            Ok(authority.to_string())
        } else {
            Ok(format!("{authority}:{default_port}"))
        }
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }
}

impl ConnectivityConfig {
    pub fn validate(&self) -> Result<()> {
        require_nonzero("connectivity.probe_interval_ms", self.probe_interval_ms)?;
        require_nonzero("connectivity.probe_timeout_ms", self.probe_timeout_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl RetryConfig {
    /// `max_attempts` may be zero (unlimited); the delays may not.
    pub fn validate(&self) -> Result<()> {
        require_nonzero("retry.initial_delay_ms", self.initial_delay_ms)?;
        require_nonzero("retry.max_delay_secs", self.max_delay_secs)
    }
}

fn require_nonzero(key: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(Error::Config(format!("{key} must be greater than zero")));
    }
    Ok(())
}

/// Validates a backend URL.
pub fn validate_backend_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("ws://")
        .or_else(|| url.strip_prefix("wss://"));
    match rest {
        Some(rest) if !rest.is_empty() && !rest.starts_with('/') => Ok(()),
        _ => Err(Error::InvalidBackendUrl(url.to_string())),
    }
}

impl Config {
    /// Creates a config pointing at the given backend.
    pub fn new(backend_url: &str) -> Result<Self> {
        validate_backend_url(backend_url)?;
        Ok(Config {
            backend: BackendConfig {
                url: backend_url.to_string(),
                ..BackendConfig::default()
            },
            ..Config::default()
        })
    }

    /// Loads configuration from the given `.tack/` directory.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {e}")))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<()> {
        self.backend.validate()?;
        self.connectivity.validate()?;
        self.retry.validate()
    }

    /// Saves configuration to the given `.tack/` directory.
    pub fn save(&self, work_dir: &Path) -> Result<()> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Resolves the release marker path, if update detection is enabled.
    pub fn marker_path(&self, work_dir: &Path) -> Option<PathBuf> {
        let marker = self.update.marker.as_ref()?;
        if marker.is_absolute() {
            Some(marker.clone())
        } else {
            Some(work_dir.parent().unwrap_or(work_dir).join(marker))
        }
    }
}

/// Find the .tack directory by walking up from the current directory
pub fn find_work_dir() -> Result<PathBuf> {
    find_work_dir_from(&std::env::current_dir()?)
}

/// Find the .tack directory by walking up from `start`
pub fn find_work_dir_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let work_dir = current.join(WORK_DIR_NAME);
        if work_dir.is_dir() {
            return Ok(work_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Initialize a new .tack directory at the given path
pub fn init_work_dir(path: &Path, backend_url: &str) -> Result<PathBuf> {
    let work_dir = path.join(WORK_DIR_NAME);

    if work_dir.join(CONFIG_FILE_NAME).exists() {
        return Err(Error::AlreadyInitialized(work_dir.display().to_string()));
    }

    let config = Config::new(backend_url)?;
    fs::create_dir_all(&work_dir)?;
    config.save(&work_dir)?;

    Ok(work_dir)
}

/// Path of the pending operation queue.
pub fn pending_path(work_dir: &Path) -> PathBuf {
    work_dir.join(PENDING_FILE_NAME)
}

/// Path of the failed (dead-letter) list.
pub fn failed_path(work_dir: &Path) -> PathBuf {
    work_dir.join(FAILED_FILE_NAME)
}

/// Path of the `watch --log-file` log.
pub fn log_path(work_dir: &Path) -> PathBuf {
    work_dir.join(LOG_FILE_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
