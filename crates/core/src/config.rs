// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker configuration.
//!
//! Field names follow the on-disk camelCase form (`pollingInterval`,
//! `provisionerId`, ...). `capacity` and `pollingInterval` are immutable for
//! the manager's lifetime; validation failures are fatal at construction.

use serde::Deserialize;
use thiserror::Error;

/// Errors from configuration parsing or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("capacity must be a positive integer")]
    InvalidCapacity,
    #[error("pollingInterval must be a positive integer")]
    InvalidPollingInterval,
    #[error("credentials.{0} must not be empty")]
    MissingCredential(&'static str),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level worker configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerConfig {
    /// Maximum concurrent runners.
    pub capacity: usize,
    /// Poll period in seconds.
    pub polling_interval: u64,
    /// Identity passed through to the queue service.
    pub provisioner_id: String,
    pub worker_group: String,
    pub worker_id: String,
    pub credentials: Credentials,
    #[serde(default)]
    pub queue_service: QueueServiceConfig,
    #[serde(default)]
    pub plugins: PluginConfig,
}

/// Queue credentials. Opaque to the core.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub client_id: String,
    pub access_token: String,
    #[serde(default)]
    pub certificate: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueServiceConfig {
    /// Claim-expiry safety margin in seconds, passed through to the queue
    /// service.
    #[serde(default)]
    pub expiration_offset: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    /// Plugin names to activate; order defines pipeline order.
    pub enabled: Vec<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enabled: vec!["success".to_string()],
        }
    }
}

impl WorkerConfig {
    /// Parse and validate the on-disk TOML form.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Construction-time validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        if self.polling_interval == 0 {
            return Err(ConfigError::InvalidPollingInterval);
        }
        if self.credentials.client_id.is_empty() {
            return Err(ConfigError::MissingCredential("clientId"));
        }
        if self.credentials.access_token.is_empty() {
            return Err(ConfigError::MissingCredential("accessToken"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
