use campus_core::CampusError;
use thiserror::Error;

/// Errors raised by session backends and filter state encoding.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session backend failure: {0}")]
    Backend(String),
    #[error("failed to encode filter state: {0}")]
    Encode(String),
}

impl From<SessionError> for CampusError {
    fn from(value: SessionError) -> Self {
        CampusError::SessionError(value.to_string())
    }
}
