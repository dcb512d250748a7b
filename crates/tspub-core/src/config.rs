//! Configuration module
//!
//! Operator settings are read from a YAML file (`settings.yml` by default) and
//! can be overridden through environment variables, optionally loaded from a
//! `.env` file.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{PublishError, PublishResult};

// Common constants
pub const DEFAULT_SETTINGS_FILE: &str = "settings.yml";
const DEFAULT_SERVER: &str = "https://api.turbosquid.com";
const UPLOAD_TIMEOUT_SECS: u64 = 90;
const POLL_MAX_INTERVAL_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const MAX_CONCURRENT_UPLOADS: usize = 1;

/// What the pipeline does when a file, preview or certification fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run at the first failure.
    #[default]
    Halt,
    /// Record the failure and continue with the next item. Publishing is refused.
    Skip,
}

impl FromStr for FailurePolicy {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "halt" => Ok(FailurePolicy::Halt),
            "skip" => Ok(FailurePolicy::Skip),
            _ => Err(PublishError::Config(format!("Invalid failure policy: {}", s))),
        }
    }
}

impl Display for FailurePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FailurePolicy::Halt => write!(f, "halt"),
            FailurePolicy::Skip => write!(f, "skip"),
        }
    }
}

/// Operator settings for a publishing run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Marketplace API token
    #[serde(default)]
    pub token: String,
    /// Base URL of the publishing API
    #[serde(default = "default_server")]
    pub server: String,
    /// Log raw responses of every remote call
    #[serde(default)]
    pub debug: bool,
    /// Seconds to wait for an upload job to finish processing
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout: u64,
    /// Upper bound of a single wait between two status polls, in seconds
    #[serde(default = "default_poll_max_interval")]
    pub poll_max_interval: u64,
    /// Per-request HTTP timeout, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// Number of uploads allowed in flight at once (1 = sequential)
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,
    #[serde(default)]
    pub on_error: FailurePolicy,
    /// Custom endpoint for S3-compatible object stores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_endpoint: Option<String>,
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

fn default_upload_timeout() -> u64 {
    UPLOAD_TIMEOUT_SECS
}

fn default_poll_max_interval() -> u64 {
    POLL_MAX_INTERVAL_SECS
}

fn default_request_timeout() -> u64 {
    REQUEST_TIMEOUT_SECS
}

fn default_max_concurrent_uploads() -> usize {
    MAX_CONCURRENT_UPLOADS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: String::new(),
            server: default_server(),
            debug: false,
            upload_timeout: UPLOAD_TIMEOUT_SECS,
            poll_max_interval: POLL_MAX_INTERVAL_SECS,
            request_timeout: REQUEST_TIMEOUT_SECS,
            max_concurrent_uploads: MAX_CONCURRENT_UPLOADS,
            on_error: FailurePolicy::Halt,
            storage_endpoint: None,
        }
    }
}

impl Settings {
    /// Load settings from `path` (if it exists), apply environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> PublishResult<Self> {
        dotenvy::dotenv().ok();

        let path = path.as_ref();
        let mut settings = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        settings.apply_env()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a YAML settings file without overrides or validation.
    pub fn from_file(path: impl AsRef<Path>) -> PublishResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PublishError::Config(format!("Unable to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
            .map_err(|e| PublishError::Config(format!("{} is not properly formatted: {}", path.display(), e)))
    }

    pub fn from_yaml(raw: &str) -> PublishResult<Self> {
        // An empty document deserializes to unit, not to a mapping.
        if raw.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(raw).map_err(|e| PublishError::Config(e.to_string()))
    }

    /// Write settings back as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> PublishResult<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| PublishError::Config(format!("Unable to encode settings: {}", e)))?;
        std::fs::write(path, yaml).map_err(|e| {
            PublishError::Config(format!("Unable to write {}: {}", path.display(), e))
        })
    }

    fn apply_env(&mut self) -> PublishResult<()> {
        if let Some(token) = env::var("TSPUB_TOKEN").ok().filter(|s| !s.is_empty()) {
            self.token = token;
        }
        if let Some(server) = env::var("TSPUB_SERVER").ok().filter(|s| !s.is_empty()) {
            self.server = server;
        }
        if let Ok(debug) = env::var("TSPUB_DEBUG") {
            self.debug = debug.to_lowercase().parse().unwrap_or(self.debug);
        }
        if let Some(endpoint) = env::var("TSPUB_STORAGE_ENDPOINT").ok().filter(|s| !s.is_empty()) {
            self.storage_endpoint = Some(endpoint);
        }
        if let Ok(timeout) = env::var("TSPUB_UPLOAD_TIMEOUT") {
            self.upload_timeout = timeout.parse().map_err(|_| {
                PublishError::Config("TSPUB_UPLOAD_TIMEOUT must be a number of seconds".to_string())
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> PublishResult<()> {
        if self.token.trim().is_empty() {
            return Err(PublishError::Config(
                "settings must contain a valid API token (run `tspub init` or set TSPUB_TOKEN)"
                    .to_string(),
            ));
        }

        if !self.server.starts_with("http://") && !self.server.starts_with("https://") {
            return Err(PublishError::Config(format!(
                "server must be an http(s) URL, got {}",
                self.server
            )));
        }

        if self.upload_timeout == 0 {
            return Err(PublishError::Config(
                "upload_timeout must be greater than zero".to_string(),
            ));
        }

        if self.poll_max_interval == 0 {
            return Err(PublishError::Config(
                "poll_max_interval must be greater than zero".to_string(),
            ));
        }

        if self.max_concurrent_uploads == 0 {
            return Err(PublishError::Config(
                "max_concurrent_uploads must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout)
    }

    pub fn poll_max_interval(&self) -> Duration {
        Duration::from_secs(self.poll_max_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
