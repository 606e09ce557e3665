//! Provider error types

use std::time::Duration;
use thiserror::Error;

/// Errors a provider can report for a single search
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Category '{0}' is not served by this provider")]
    Unsupported(String),

    #[error("Provider misconfigured: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            ProviderError::Timeout(_) => true,
            ProviderError::Network(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout(_) => true,
            ProviderError::Api { status, .. } => matches!(*status, 408 | 429) || *status >= 500,
            ProviderError::Network(_) => true,
            ProviderError::InvalidResponse(_) => false,
            ProviderError::Unsupported(_) => false,
            ProviderError::Config(_) => false,
            ProviderError::Json(_) => false,
        }
    }
}
