use std::io;

use thiserror::Error;

/// Result type used across the Campus core crate.
pub type Result<T> = std::result::Result<T, CampusError>;

/// Canonical error representation shared by all services.
#[derive(Debug, Error)]
pub enum CampusError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("validation failed: {0}")]
    ValidationError(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("session store error: {0}")]
    SessionError(String),

    #[error("general error: {0}")]
    GeneralError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for CampusError {
    fn from(err: serde_json::Error) -> Self {
        CampusError::DeserializationError(err.to_string())
    }
}

impl From<sqlx::Error> for CampusError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CampusError::NotFound("row not found".to_string()),
            other => CampusError::DatabaseError(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for CampusError {
    fn from(err: anyhow::Error) -> Self {
        CampusError::GeneralError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ConfigError> for CampusError {
    fn from(value: ConfigError) -> Self {
        CampusError::ConfigError(value.to_string())
    }
}
