//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Command-line overrides
//! 2. Environment variables (CORREIOS_CEP_*)
//! 3. TOML config file (if CORREIOS_CEP_CONFIG_FILE set)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "CORREIOS_CEP_";

/// Environment variable naming an optional TOML config file.
pub const CONFIG_FILE_ENV: &str = "CORREIOS_CEP_CONFIG_FILE";

/// Default Correios endpoint.
pub const DEFAULT_CORREIOS_BASE_URL: &str = "https://buscacepinter.correios.com.br";

/// Application configuration with layered loading.
///
/// Built once at startup and handed to each component constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database.
    ///
    /// Set via CORREIOS_CEP_DATABASE_URL or `--database-url`.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// HTTP bind address.
    ///
    /// Set via CORREIOS_CEP_ADDR or `--addr`.
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Log level directive (`error`, `warn`, `info`, `debug`, `trace`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format: `json` or `text`.
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Base URL of the Correios lookup service.
    #[serde(default = "default_correios_base_url")]
    pub correios_base_url: String,

    /// Timeout for requests to Correios, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries for transport-level failures when talking to Correios.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// User-Agent sent to Correios.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_database_url() -> String {
    "./correios-cep.sqlite".into()
}

fn default_addr() -> String {
    "0.0.0.0:8080".into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "json".into()
}

fn default_correios_base_url() -> String {
    DEFAULT_CORREIOS_BASE_URL.into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_retry_count() -> u32 {
    3
}

fn default_user_agent() -> String {
    concat!("correios-cep/", env!("CARGO_PKG_VERSION")).into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            addr: default_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            correios_base_url: default_correios_base_url(),
            timeout_ms: default_timeout_ms(),
            retry_count: default_retry_count(),
            user_agent: default_user_agent(),
        }
    }
}

/// Values given on the command line. `None` leaves lower layers untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<String>,
    /// Explicit config file; takes the place of CORREIOS_CEP_CONFIG_FILE.
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whether logs should be emitted as JSON.
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Load configuration from defaults, file and environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or parsed, or if
    /// validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(ConfigOverrides::default())
    }

    /// Load configuration with command-line overrides on top.
    ///
    /// Priority (highest wins):
    /// 1. `overrides`
    /// 2. Environment variables prefixed with `CORREIOS_CEP_`
    /// 3. TOML file from `overrides.config_file` or `CORREIOS_CEP_CONFIG_FILE`
    /// 4. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or parsed, or if
    /// validation fails after loading.
    pub fn load_with(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let config_file = overrides
            .config_file
            .clone()
            .or_else(|| std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from));

        let config: Self = Self::figment(config_file.as_deref(), &overrides)
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .ignore(&["CONFIG_FILE"])
                    .map(|key| key.as_str().to_lowercase().into()),
            )
            .merge(Serialized::defaults(overrides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database_url, "./correios-cep.sqlite");
        assert_eq!(config.addr, "0.0.0.0:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, "json");
        assert_eq!(config.correios_base_url, DEFAULT_CORREIOS_BASE_URL);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.retry_count, 3);
        assert!(config.user_agent.starts_with("correios-cep/"));
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_json_logs() {
        assert!(AppConfig::default().json_logs());
        let config = AppConfig { log_format: "text".into(), ..Default::default() };
        assert!(!config.json_logs());
    }

    #[test]
    fn test_env_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("CORREIOS_CEP_ADDR", "127.0.0.1:9000");
            jail.set_env("CORREIOS_CEP_RETRY_COUNT", "1");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.addr, "127.0.0.1:9000");
            assert_eq!(config.retry_count, 1);
            assert_eq!(config.log_level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_precedence_file_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "cep.toml",
                r#"
                    database_url = "/var/lib/cep.sqlite"
                    log_level = "warn"
                    addr = "127.0.0.1:7000"
                "#,
            )?;
            jail.set_env("CORREIOS_CEP_CONFIG_FILE", "cep.toml");
            jail.set_env("CORREIOS_CEP_LOG_LEVEL", "debug");

            let overrides = ConfigOverrides { addr: Some("127.0.0.1:7001".into()), ..Default::default() };
            let config = AppConfig::load_with(overrides).expect("config loads");

            assert_eq!(config.database_url, "/var/lib/cep.sqlite");
            assert_eq!(config.log_level, "debug");
            assert_eq!(config.addr, "127.0.0.1:7001");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.set_env("CORREIOS_CEP_LOG_FORMAT", "xml");
            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "log_format"));
            Ok(())
        });
    }
}
