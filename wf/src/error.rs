//! Engine error types
//!
//! Only structural and input errors surface here. Provider failures are
//! absorbed by the scheduler into degraded task results.

use thiserror::Error;

use crate::domain::IntentKind;
use crate::graph::GraphError;

/// Errors that abort a planning request
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Intent kind '{0}' has no category mapping")]
    UnsupportedIntentKind(IntentKind),

    #[error("Invalid duration: '{0}'")]
    InvalidDuration(String),

    #[error("Session has no prior plan to modify")]
    NoPriorPlan,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Could not classify input: {0}")]
    UnclassifiableInput(String),

    #[error("Task graph error: {0}")]
    Graph(#[from] GraphError),
}

impl EngineError {
    /// Input-validation errors are never worth retrying
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EngineError::UnsupportedIntentKind(_)
                | EngineError::InvalidDuration(_)
                | EngineError::NoPriorPlan
                | EngineError::UnclassifiableInput(_)
        )
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
