//! Runtime configuration.
//!
//! Values come from defaults overridden by `STOCKROOM__*` environment
//! variables (for example `STOCKROOM__PORT=9000`,
//! `STOCKROOM__DATABASE_URL=postgres://...`).

use chrono::Duration;
use config::{Config, Environment};
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

pub const ENV_PREFIX: &str = "STOCKROOM";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("bootstrap_admin_email and bootstrap_admin_password must be set together")]
    PartialBootstrap,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    /// Absent means in-memory stores.
    pub database_url: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub db_max_connections: u32,
    #[validate(range(min = 1, max = 720))]
    pub session_ttl_hours: i64,
    #[validate(email)]
    pub bootstrap_admin_email: Option<String>,
    #[validate(length(min = 6))]
    pub bootstrap_admin_password: Option<String>,
}

impl AppConfig {
    /// Defaults plus process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(Environment::with_prefix(ENV_PREFIX).separator("__"))
    }

    pub fn from_env(env: Environment) -> Result<Self, ConfigError> {
        let cfg: AppConfig = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("db_max_connections", 10)?
            .set_default("session_ttl_hours", 24)?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        cfg.validate()?;
        if cfg.bootstrap_admin_email.is_some() != cfg.bootstrap_admin_password.is_some() {
            return Err(ConfigError::PartialBootstrap);
        }
        Ok(cfg)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours)
    }

    /// `(email, password)` when both bootstrap values are configured.
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (&self.bootstrap_admin_email, &self.bootstrap_admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .source(Some(map))
    }

    #[test]
    fn defaults_apply_without_environment() {
        let cfg = AppConfig::from_env(env(&[])).unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
        assert_eq!(cfg.db_max_connections, 10);
        assert_eq!(cfg.session_ttl(), Duration::hours(24));
        assert!(cfg.database_url.is_none());
        assert!(cfg.bootstrap_admin().is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let cfg = AppConfig::from_env(env(&[
            ("STOCKROOM__PORT", "9000"),
            ("STOCKROOM__DATABASE_URL", "postgres://localhost/stockroom"),
            ("STOCKROOM__BOOTSTRAP_ADMIN_EMAIL", "root@example.com"),
            ("STOCKROOM__BOOTSTRAP_ADMIN_PASSWORD", "hunter22"),
        ]))
        .unwrap();

        assert_eq!(cfg.port, 9000);
        assert_eq!(
            cfg.database_url.as_deref(),
            Some("postgres://localhost/stockroom")
        );
        assert_eq!(cfg.bootstrap_admin(), Some(("root@example.com", "hunter22")));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = AppConfig::from_env(env(&[("STOCKROOM__SESSION_TTL_HOURS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn half_configured_bootstrap_is_rejected() {
        let err = AppConfig::from_env(env(&[("STOCKROOM__BOOTSTRAP_ADMIN_EMAIL", "root@example.com")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::PartialBootstrap));
    }
}
