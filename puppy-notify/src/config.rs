//! Host-facing settings for the hourly reminder worker.
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{
    DEFAULT_CHANNEL_DESCRIPTION, DEFAULT_CHANNEL_ID, DEFAULT_CHANNEL_NAME,
    DEFAULT_INTERVAL_MINUTES, DEFAULT_MAX_BACKOFF_SECS, DEFAULT_RETRY_BACKOFF_SECS,
    DEFAULT_STORE_NAMESPACE, DEFAULT_TITLE, DEFAULT_UNIQUE_WORK_NAME, FIRST_NOTIFICATION_ID,
    MIN_INTERVAL_MINUTES, MIN_RETRY_BACKOFF_SECS,
};

/// Errors raised when notifier configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("interval must be at least {min} minutes (got {value})")]
    IntervalTooShort { min: u32, value: u32 },
    #[error("retry backoff must be at least {min}s (got {value}s)")]
    BackoffTooShort { min: u64, value: u64 },
    #[error("retry backoff {backoff}s exceeds maximum {max}s")]
    BackoffExceedsMax { backoff: u64, max: u64 },
    #[error("config JSON parsing error: {0}")]
    Json(String),
}

/// Notifier configuration. Every field has a default, so `{}` is valid JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default = "NotifierConfig::default_store_namespace")]
    pub store_namespace: String,
    #[serde(default = "NotifierConfig::default_unique_work_name")]
    pub unique_work_name: String,
    #[serde(default = "NotifierConfig::default_channel_id")]
    pub channel_id: String,
    #[serde(default = "NotifierConfig::default_channel_name")]
    pub channel_name: String,
    #[serde(default = "NotifierConfig::default_channel_description")]
    pub channel_description: String,
    #[serde(default = "NotifierConfig::default_title")]
    pub title: String,
    #[serde(default = "NotifierConfig::default_first_notification_id")]
    pub first_notification_id: i64,
    #[serde(default = "NotifierConfig::default_interval_minutes")]
    pub interval_minutes: u32,
    #[serde(default = "NotifierConfig::default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    #[serde(default = "NotifierConfig::default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl NotifierConfig {
    fn default_store_namespace() -> String {
        DEFAULT_STORE_NAMESPACE.to_string()
    }

    fn default_unique_work_name() -> String {
        DEFAULT_UNIQUE_WORK_NAME.to_string()
    }

    fn default_channel_id() -> String {
        DEFAULT_CHANNEL_ID.to_string()
    }

    fn default_channel_name() -> String {
        DEFAULT_CHANNEL_NAME.to_string()
    }

    fn default_channel_description() -> String {
        DEFAULT_CHANNEL_DESCRIPTION.to_string()
    }

    fn default_title() -> String {
        DEFAULT_TITLE.to_string()
    }

    const fn default_first_notification_id() -> i64 {
        FIRST_NOTIFICATION_ID
    }

    const fn default_interval_minutes() -> u32 {
        DEFAULT_INTERVAL_MINUTES
    }

    const fn default_retry_backoff_secs() -> u64 {
        DEFAULT_RETRY_BACKOFF_SECS
    }

    const fn default_max_backoff_secs() -> u64 {
        DEFAULT_MAX_BACKOFF_SECS
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Json(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check field invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("store_namespace", &self.store_namespace),
            ("unique_work_name", &self.unique_work_name),
            ("channel_id", &self.channel_id),
            ("channel_name", &self.channel_name),
            ("title", &self.title),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty { field });
            }
        }
        if self.interval_minutes < MIN_INTERVAL_MINUTES {
            return Err(ConfigError::IntervalTooShort {
                min: MIN_INTERVAL_MINUTES,
                value: self.interval_minutes,
            });
        }
        if self.retry_backoff_secs < MIN_RETRY_BACKOFF_SECS {
            return Err(ConfigError::BackoffTooShort {
                min: MIN_RETRY_BACKOFF_SECS,
                value: self.retry_backoff_secs,
            });
        }
        if self.retry_backoff_secs > self.max_backoff_secs {
            return Err(ConfigError::BackoffExceedsMax {
                backoff: self.retry_backoff_secs,
                max: self.max_backoff_secs,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_minutes) * 60)
    }

    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    #[must_use]
    pub const fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            store_namespace: Self::default_store_namespace(),
            unique_work_name: Self::default_unique_work_name(),
            channel_id: Self::default_channel_id(),
            channel_name: Self::default_channel_name(),
            channel_description: Self::default_channel_description(),
            title: Self::default_title(),
            first_notification_id: Self::default_first_notification_id(),
            interval_minutes: Self::default_interval_minutes(),
            retry_backoff_secs: Self::default_retry_backoff_secs(),
            max_backoff_secs: Self::default_max_backoff_secs(),
        }
    }
}
