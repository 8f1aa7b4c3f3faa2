//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from flags, environment, files, or defaults.

use std::net::SocketAddr;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

const LOG_FORMATS: &[&str] = &["json", "text"];

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `database_url` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `addr` is not a socket address
    /// - `log_level` is empty
    /// - `log_format` is neither `json` nor `text`
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `retry_count` exceeds 10
    /// - `user_agent` is empty
    /// - `correios_base_url` is not an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "database_url".into(),
                hint: "Set CORREIOS_CEP_DATABASE_URL or pass --database-url".into(),
            });
        }

        if self.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid {
                field: "addr".into(),
                reason: format!("'{}' is not a valid socket address", self.addr),
            });
        }

        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "log_level".into(), reason: "must not be empty".into() });
        }

        if !LOG_FORMATS.iter().any(|f| f.eq_ignore_ascii_case(&self.log_format)) {
            return Err(ConfigError::Invalid { field: "log_format".into(), reason: "must be 'json' or 'text'".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.retry_count > 10 {
            return Err(ConfigError::Invalid { field: "retry_count".into(), reason: "must not exceed 10".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        match url::Url::parse(&self.correios_base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            _ => {
                return Err(ConfigError::Invalid {
                    field: "correios_base_url".into(),
                    reason: "must be an http(s) URL".into(),
                });
            }
        }

        Ok(())
    }
}
