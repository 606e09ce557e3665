//! Intent classification
//!
//! The engine consumes classifiers through the `IntentClassifier` trait;
//! `KeywordClassifier` is the built-in rule-based implementation.

mod keyword;

pub use keyword::KeywordClassifier;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Intent;
use crate::error::EngineError;

/// What the classifier knows about the conversation so far
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub last_intent: Option<Intent>,
}

impl SessionContext {
    pub fn new(last_intent: Option<Intent>) -> Self {
        Self { last_intent }
    }

    /// Subject of the previous request, if any
    pub fn last_subject(&self) -> Option<&str> {
        self.last_intent.as_ref().and_then(|i| i.subject.as_deref())
    }

    pub fn has_history(&self) -> bool {
        self.last_intent.is_some()
    }
}

/// Errors from classification
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Unclassifiable input: {0}")]
    Unclassifiable(String),

    #[error("Invalid classifier rule: {0}")]
    Rule(#[from] regex::Error),
}

impl From<ClassifyError> for EngineError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::Unclassifiable(text) => EngineError::UnclassifiableInput(text),
            other => EngineError::UnclassifiableInput(other.to_string()),
        }
    }
}

/// Turns free text into an Intent
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, raw_text: &str, context: &SessionContext) -> Result<Intent, ClassifyError>;
}
