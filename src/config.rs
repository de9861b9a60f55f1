//! Configuration management for Agora
//!
//! This module handles loading, parsing, and validating configuration
//! from a YAML file, with an environment-variable path override.

use crate::error::{AgoraError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides the configuration file path
pub const CONFIG_PATH_ENV: &str = "AGORA_CONFIG";

/// Default configuration file path, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Main configuration structure for Agora
///
/// Holds the remote service endpoint and the timing knobs for polling
/// and upload status display.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote conversation service settings
    #[serde(default)]
    pub service: ServiceConfig,

    /// Session and polling behavior
    #[serde(default)]
    pub session: SessionConfig,

    /// Upload pipeline behavior
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Remote conversation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the conversation service API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request HTTP timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Session and polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Delay between accepted turns before the next poll (milliseconds)
    ///
    /// Paces the perceived typing rhythm and bounds the request rate
    /// to the remote service.
    #[serde(default = "default_turn_delay_ms")]
    pub turn_delay_ms: u64,
}

fn default_turn_delay_ms() -> u64 {
    2000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            turn_delay_ms: default_turn_delay_ms(),
        }
    }
}

impl SessionConfig {
    /// Turn delay as a [`Duration`]
    pub fn turn_delay(&self) -> Duration {
        Duration::from_millis(self.turn_delay_ms)
    }
}

/// Upload pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// How long the transient success status stays visible (milliseconds)
    #[serde(default = "default_status_display_ms")]
    pub status_display_ms: u64,
}

fn default_status_display_ms() -> u64 {
    5000
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            status_display_ms: default_status_display_ms(),
        }
    }
}

impl UploadConfig {
    /// Status display duration as a [`Duration`]
    pub fn status_display(&self) -> Duration {
        Duration::from_millis(self.status_display_ms)
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// The path is resolved in order: explicit `path` argument, the
    /// `AGORA_CONFIG` environment variable, then [`DEFAULT_CONFIG_PATH`].
    /// A missing file is not an error; defaults are used instead so the
    /// client works out of the box against a local service.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let resolved = match path {
            Some(p) => p.to_string(),
            None => std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
        };

        if !Path::new(&resolved).exists() {
            tracing::debug!("No config file at {}, using defaults", resolved);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&resolved)
            .map_err(|e| AgoraError::Config(format!("Failed to read {}: {}", resolved, e)))?;
        let config: Config = serde_yaml::from_str(&contents)
            .map_err(|e| AgoraError::Config(format!("Failed to parse {}: {}", resolved, e)))?;

        tracing::info!("Loaded configuration from {}", resolved);
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or not http(s), or if
    /// the HTTP timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.service.base_url.trim().is_empty() {
            return Err(AgoraError::Config("service.base_url must not be empty".to_string()).into());
        }
        if !self.service.base_url.starts_with("http://")
            && !self.service.base_url.starts_with("https://")
        {
            return Err(AgoraError::Config(format!(
                "service.base_url must be an http(s) URL, got: {}",
                self.service.base_url
            ))
            .into());
        }
        if self.service.timeout_seconds == 0 {
            return Err(
                AgoraError::Config("service.timeout_seconds must be positive".to_string()).into(),
            );
        }
        Ok(())
    }
}
