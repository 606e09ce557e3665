//! Provider capability trait

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::error::ProviderError;
use crate::domain::{Budget, Category, Intent, RawRecord};
use crate::scheduler::TaskStatus;

/// A data source that can answer searches for one or more categories
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name, used as provenance on every record it returns
    fn name(&self) -> &str;

    /// Search for records of the given category
    async fn search(&self, category: Category, query: &QueryParams) -> Result<Vec<RawRecord>, ProviderError>;
}

/// Maps a task category to the providers that serve it
pub trait ProviderResolver: Send + Sync {
    /// Providers for the category, in registration order
    fn resolve(&self, category: Category) -> Vec<Arc<dyn Provider>>;
}

/// Terminal outcome of a dependency, handed to dependent nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upstream {
    pub category: Category,
    pub status: TaskStatus,
    pub records: usize,
}

/// Parameters passed to every provider search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    pub subject: Option<String>,
    pub origin: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub party_size: u32,
    pub interests: Vec<String>,
    pub budget: Budget,

    /// Results of this node's dependencies (empty for data nodes)
    #[serde(default)]
    pub upstream: Vec<Upstream>,
}

impl QueryParams {
    /// Build query parameters from a classified intent
    pub fn from_intent(intent: &Intent) -> Self {
        debug!(kind = %intent.kind, subject = ?intent.subject, "QueryParams::from_intent: called");
        Self {
            subject: intent.subject.clone(),
            origin: intent.origin.clone(),
            start_date: intent.start_date,
            party_size: intent.party_size,
            interests: intent.interests.clone(),
            budget: intent.budget,
            upstream: Vec::new(),
        }
    }

    /// Copy of these parameters carrying the given upstream outcomes
    pub fn with_upstream(&self, upstream: Vec<Upstream>) -> Self {
        Self {
            upstream,
            ..self.clone()
        }
    }

    /// Subject for query strings
    pub fn subject_or_default(&self) -> &str {
        self.subject.as_deref().unwrap_or("popular destinations")
    }

    /// Interests joined for query strings
    pub fn interests_joined(&self) -> String {
        self.interests.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IntentKind;

    #[test]
    fn test_from_intent_copies_fields() {
        let intent = Intent::new(IntentKind::NewPlan, "trip")
            .with_subject("Rome")
            .with_origin("Berlin")
            .with_party_size(4)
            .with_interests(["food", "culture"]);

        let query = QueryParams::from_intent(&intent);
        assert_eq!(query.subject.as_deref(), Some("Rome"));
        assert_eq!(query.origin.as_deref(), Some("Berlin"));
        assert_eq!(query.party_size, 4);
        assert_eq!(query.interests_joined(), "food,culture");
        assert!(query.upstream.is_empty());
    }

    #[test]
    fn test_with_upstream_keeps_other_fields() {
        let query = QueryParams {
            subject: Some("Paris".to_string()),
            ..Default::default()
        };
        let upstream = vec![Upstream {
            category: Category::Hotels,
            status: TaskStatus::Failed,
            records: 0,
        }];

        let derived = query.with_upstream(upstream.clone());
        assert_eq!(derived.subject.as_deref(), Some("Paris"));
        assert_eq!(derived.upstream, upstream);
        assert_eq!(QueryParams::default().subject_or_default(), "popular destinations");
    }
}
