//! Built-in synthesis capability
//!
//! Turns the outcomes of the data nodes into recommendation records. It
//! never fails: a failed dependency becomes a "data unavailable" note.

use async_trait::async_trait;
use tracing::debug;

use super::error::ProviderError;
use super::traits::{Provider, QueryParams};
use crate::domain::{Category, RawRecord};
use crate::scheduler::TaskStatus;

pub const RECOMMENDATION_PROVIDER: &str = "recommendations";

#[derive(Debug, Default, Clone)]
pub struct RecommendationProvider;

impl RecommendationProvider {
    pub fn new() -> Self {
        Self
    }

    fn available_note(category: Category) -> Option<&'static str> {
        match category {
            Category::Flights => Some("Flight options are available - book early for better prices"),
            Category::Hotels => Some("Multiple accommodation options found - compare amenities"),
            Category::Activities => Some("Great activities available - plan 2-3 per day for best experience"),
            Category::Dining => Some("Local dining options found - reserve popular spots ahead"),
            Category::DestinationInfo => Some("Check local weather and cultural events during your visit"),
            Category::Synthesis => None,
        }
    }
}

#[async_trait]
impl Provider for RecommendationProvider {
    fn name(&self) -> &str {
        RECOMMENDATION_PROVIDER
    }

    async fn search(&self, category: Category, query: &QueryParams) -> Result<Vec<RawRecord>, ProviderError> {
        debug!(%category, upstream = query.upstream.len(), "RecommendationProvider::search: called");
        if category != Category::Synthesis {
            debug!(%category, "RecommendationProvider::search: not a synthesis node");
            return Err(ProviderError::Unsupported(category.to_string()));
        }

        let mut records = Vec::new();
        for upstream in &query.upstream {
            let note = match upstream.status {
                TaskStatus::Success if upstream.records > 0 => {
                    debug!(category = %upstream.category, "RecommendationProvider::search: data available");
                    Self::available_note(upstream.category).map(String::from)
                }
                TaskStatus::Success => {
                    debug!(category = %upstream.category, "RecommendationProvider::search: no records");
                    None
                }
                TaskStatus::Failed | TaskStatus::TimedOut => {
                    debug!(category = %upstream.category, status = ?upstream.status, "RecommendationProvider::search: degraded");
                    Some(format!(
                        "Live {} data was unavailable - check again closer to departure",
                        upstream.category
                    ))
                }
            };
            if let Some(note) = note {
                records.push(RawRecord::new(note).with_tags([upstream.category.as_str()]));
            }
        }

        Ok(records)
    }
}
