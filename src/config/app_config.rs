use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::DomainError;

pub const DATABASE_URL_MISSING: &str =
    "Neither DATABASE_URL nor DATABASE_* environment variables set!";

/// Application configuration
///
/// Top-level keys come from flat environment variables (`APP_NAME`,
/// `JWT_SECRET_KEY`, `DATABASE_URL`, ...); nested sections use `__`
/// (`LOGGING__LEVEL`, `SCHEDULER__HOUR`, ...).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_name: String,
    pub app_version: String,
    pub jwt_secret_key: String,
    pub jwt_algorithm: String,
    pub database_url: Option<String>,
    pub database_user: Option<String>,
    pub database_password: Option<String>,
    pub database_host: Option<String>,
    pub database_port: Option<u16>,
    pub database_name: Option<String>,
    pub database_max_connections: u32,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub scheduler: SchedulerConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Daily job time, UTC
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub hour: u32,
    pub minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            jwt_secret_key: "change-me-in-production".to_string(),
            jwt_algorithm: "HS256".to_string(),
            database_url: None,
            database_user: None,
            database_password: None,
            database_host: None,
            database_port: None,
            database_name: None,
            database_max_connections: 10,
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            scheduler: SchedulerConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: 23,
            minute: 59,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Keys with a leading underscore would start with an empty path segment
        Self::load_from(
            std::env::vars()
                .filter(|(key, _)| !key.starts_with('_'))
                .collect(),
        )
    }

    /// Load from the given variables instead of the process environment
    pub fn load_from(vars: HashMap<String, String>) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .source(Some(vars)),
            )
            .build()?;

        config.try_deserialize()
    }

    /// `DATABASE_URL` when set, otherwise assembled from the `DATABASE_*` parts
    pub fn database_url(&self) -> Result<String, DomainError> {
        if let Some(url) = self.database_url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(url.to_string());
        }

        match (
            &self.database_user,
            &self.database_password,
            &self.database_host,
            self.database_port,
            &self.database_name,
        ) {
            (Some(user), Some(password), Some(host), Some(port), Some(name)) => Ok(format!(
                "postgres://{}:{}@{}:{}/{}",
                user, password, host, port, name
            )),
            _ => Err(DomainError::configuration(DATABASE_URL_MISSING)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> AppConfig {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        AppConfig::load_from(source).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]);
        assert_eq!(config.jwt_algorithm, "HS256");
        assert_eq!(config.scheduler.hour, 23);
        assert_eq!(config.scheduler.minute, 59);
        assert!(config.scheduler.enabled);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_flat_and_nested_variables() {
        let config = load(&[
            ("APP_NAME", "tappweb-test"),
            ("JWT_SECRET_KEY", "s3cret"),
            ("DATABASE_MAX_CONNECTIONS", "3"),
            ("LOGGING__FORMAT", "json"),
            ("SCHEDULER__HOUR", "6"),
            ("SCHEDULER__ENABLED", "false"),
        ]);

        assert_eq!(config.app_name, "tappweb-test");
        assert_eq!(config.jwt_secret_key, "s3cret");
        assert_eq!(config.database_max_connections, 3);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.scheduler.hour, 6);
        assert!(!config.scheduler.enabled);
    }

    #[test]
    fn test_database_url_wins() {
        let config = load(&[
            ("DATABASE_URL", "postgres://u:p@db:5432/app"),
            ("DATABASE_HOST", "ignored"),
        ]);
        assert_eq!(config.database_url().unwrap(), "postgres://u:p@db:5432/app");
    }

    #[test]
    fn test_database_url_from_parts() {
        let config = load(&[
            ("DATABASE_USER", "u"),
            ("DATABASE_PASSWORD", "p"),
            ("DATABASE_HOST", "db"),
            ("DATABASE_PORT", "5432"),
            ("DATABASE_NAME", "app"),
        ]);
        assert_eq!(config.database_url().unwrap(), "postgres://u:p@db:5432/app");
    }

    #[test]
    fn test_database_url_missing() {
        let config = load(&[("DATABASE_HOST", "db")]);
        let error = config.database_url().unwrap_err();
        assert_eq!(error.message(), DATABASE_URL_MISSING);
    }
}
