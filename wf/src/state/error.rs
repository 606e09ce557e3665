//! Session store errors

use thiserror::Error;

use crate::error::EngineError;

/// Errors from session operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
}

impl From<SessionError> for EngineError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => EngineError::SessionNotFound(id),
        }
    }
}
