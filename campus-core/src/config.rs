use std::env;
use std::str::FromStr;

use crate::errors::ConfigError;

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

/// Global configuration shared across the services.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub database_url: Option<String>,
    pub environment: Environment,
    pub node_name: String,
    pub http_bind: String,
    /// Offset applied to zone-less dates. `None` means the system local zone.
    pub local_utc_offset_minutes: Option<i32>,
    pub session_cookie: String,
}

impl CoreConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load(|suffix| match suffix {
            "DATABASE_URL" => "DATABASE_URL".to_string(),
            other => format!("CAMPUS_{other}"),
        })
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `ISSUES_`).
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        Self::load(|suffix| format!("{prefix}{suffix}"))
    }

    fn load(key: impl Fn(&str) -> String) -> Result<Self, ConfigError> {
        let database_url = env::var(key("DATABASE_URL"))
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let environment = env::var(key("ENV"))
            .map(|raw| Environment::from_str(&raw))
            .unwrap_or_default();

        let node_name = env::var(key("NODE_NAME")).unwrap_or_else(|_| "campus-node".to_string());
        let http_bind = env::var(key("HTTP_BIND")).unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let local_utc_offset_minutes = parse_optional::<i32>(&key("LOCAL_UTC_OFFSET_MINUTES"))?;

        if let Some(minutes) = local_utc_offset_minutes {
            if minutes.abs() >= 24 * 60 {
                return Err(ConfigError::Internal(format!(
                    "local UTC offset out of range: {minutes} minutes"
                )));
            }
        }

        let session_cookie = env::var(key("SESSION_COOKIE"))
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "campus_session".to_string());

        Ok(Self {
            database_url,
            environment,
            node_name,
            http_bind,
            local_utc_offset_minutes,
            session_cookie,
        })
    }

    /// Returns the Postgres URL if configured.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    /// Whether the service is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

fn parse_optional<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => T::from_str(value.trim())
            .map(Some)
            .map_err(|err| ConfigError::Internal(format!("invalid value for {key}: {err}"))),
        Err(_) => Ok(None),
    }
}
