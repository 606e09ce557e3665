//! Intent domain type
//!
//! An Intent is the structured interpretation of one user request. It is
//! produced by an `IntentClassifier` and never mutated afterwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Category;

/// What the request asks the engine to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// Build a complete multi-day plan
    NewPlan,
    /// Look up data for one or more categories without planning
    Search,
    /// Change part of the session's existing plan
    Modify,
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewPlan => write!(f, "new_plan"),
            Self::Search => write!(f, "search"),
            Self::Modify => write!(f, "modify"),
        }
    }
}

/// Spending level hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Budget {
    Budget,
    #[default]
    MidRange,
    Luxury,
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Budget => write!(f, "budget"),
            Self::MidRange => write!(f, "mid-range"),
            Self::Luxury => write!(f, "luxury"),
        }
    }
}

/// Default party size when the request does not say
pub const DEFAULT_PARTY_SIZE: u32 = 2;

/// A classified user request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,

    /// Destination or other subject of the request
    pub subject: Option<String>,

    /// Departure city, needed for meaningful flight searches
    pub origin: Option<String>,

    /// Raw duration phrase ("3 days", "2 weeks"); parsed by the plan builder
    pub duration: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub party_size: u32,

    /// Interest tags in the order they were mentioned, without duplicates
    pub interests: Vec<String>,

    pub budget: Budget,

    /// Categories the request names explicitly
    pub focus: Vec<Category>,

    pub raw_text: String,
}

impl Intent {
    /// Create an intent with defaults for everything but kind and text
    pub fn new(kind: IntentKind, raw_text: impl Into<String>) -> Self {
        Self {
            kind,
            subject: None,
            origin: None,
            duration: None,
            start_date: None,
            party_size: DEFAULT_PARTY_SIZE,
            interests: Vec::new(),
            budget: Budget::default(),
            focus: Vec::new(),
            raw_text: raw_text.into(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_party_size(mut self, party_size: u32) -> Self {
        self.party_size = party_size;
        self
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    /// Set interests, dropping duplicates while keeping first-mention order
    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests.clear();
        for interest in interests {
            let tag = interest.into().trim().to_lowercase();
            if !tag.is_empty() && !self.interests.contains(&tag) {
                self.interests.push(tag);
            }
        }
        self
    }

    /// Set focus categories, dropping duplicates while keeping order
    pub fn with_focus<I>(mut self, focus: I) -> Self
    where
        I: IntoIterator<Item = Category>,
    {
        self.focus.clear();
        for category in focus {
            if !self.focus.contains(&category) {
                self.focus.push(category);
            }
        }
        self
    }

    /// Subject for display and provider queries
    pub fn subject_or_default(&self) -> &str {
        self.subject.as_deref().unwrap_or("your destination")
    }

    pub fn has_interest(&self, tag: &str) -> bool {
        self.interests.iter().any(|i| i.eq_ignore_ascii_case(tag))
    }
}
