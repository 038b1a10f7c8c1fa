//! Configuration for FlowSync
//!
//! Values come from defaults, then a `.env` file if one exists, then the
//! process environment.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

use crate::data::ConfigError;

pub const ENV_API_URL: &str = "FLOWSYNC_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "FLOWSYNC_TIMEOUT_SECS";
pub const ENV_AUTH_TOKEN: &str = "FLOWSYNC_AUTH_TOKEN";
pub const ENV_LOG_LEVEL: &str = "FLOWSYNC_LOG_LEVEL";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSyncConfig {
    /// Base URL of the flow API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Request timeout handed to the transport
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bearer token for the flow API
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Log level used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_base_url() -> String {
    "http://localhost:3001/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FlowSyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
            auth_token: None,
            log_level: default_log_level(),
        }
    }
}

impl FlowSyncConfig {
    /// Load configuration from an optional `.env` file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config.api_base_url = url;
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            match timeout.parse::<u64>() {
                Ok(secs) => config.timeout_secs = secs,
                Err(_) => warn!("Invalid {} value: {}", ENV_TIMEOUT_SECS, timeout),
            }
        }

        if let Some(token) = lookup(ENV_AUTH_TOKEN).filter(|t| !t.is_empty()) {
            config.auth_token = Some(token);
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.log_level = level;
        }

        config.validate()?;

        if config.auth_token.is_none() {
            warn!("No {} provided - requests will be sent unauthenticated", ENV_AUTH_TOKEN);
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_API_URL));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_TIMEOUT_SECS,
                reason: "timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
