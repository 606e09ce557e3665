//! Provider records
//!
//! `RawRecord` is what a provider returns. `SourcedRecord` pairs it with the
//! provider that produced it. `RankedRecord` is the deduplicated, ranked
//! entry the aggregator puts in the dataset.

use serde::{Deserialize, Serialize};

use super::Category;

/// A single result as returned by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: String,

    #[serde(default)]
    pub link: Option<String>,

    #[serde(default)]
    pub snippet: Option<String>,

    /// Provider-declared relevance, higher is better
    #[serde(default)]
    pub relevance: Option<f64>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl RawRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: None,
            snippet: None,
            relevance: None,
            tags: Vec::new(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = Some(relevance);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// A raw record tagged with the provider that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedRecord {
    pub provider: String,
    pub record: RawRecord,
}

impl SourcedRecord {
    pub fn new(provider: impl Into<String>, record: RawRecord) -> Self {
        Self {
            provider: provider.into(),
            record,
        }
    }
}

/// A deduplicated, ranked dataset entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecord {
    /// Derived from the category dedup key; equal ids mean duplicate records
    pub id: String,

    pub category: Category,

    /// Provenance: name of the provider that produced the record
    pub provider: String,

    pub title: String,

    pub link: Option<String>,

    pub snippet: Option<String>,

    pub tags: Vec<String>,

    /// Declared relevance (0 when the provider did not declare one)
    pub score: f64,

    /// 0-based position within the category after ranking
    pub rank: usize,
}
