//! Session domain type

use serde::{Deserialize, Serialize};

use super::{Intent, Plan};

/// Per-conversation state: the last committed intent and plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub last_intent: Intent,
    pub last_plan: Plan,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Last commit timestamp (Unix milliseconds)
    pub updated_at: i64,
}
