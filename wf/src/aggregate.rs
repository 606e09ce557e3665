//! Aggregator - merges task results into a ranked dataset
//!
//! Records are deduplicated with a category-specific key, then ranked so
//! providers interleave: every provider's best record comes before any
//! provider's second best.

use std::collections::HashSet;
use tracing::debug;

use crate::domain::{AggregatedDataset, Category, RankedRecord, SourcedRecord, record_id};
use crate::scheduler::ScheduleReport;

/// Stateless merger of scheduler output
#[derive(Debug, Default, Clone)]
pub struct Aggregator;

/// A deduplicated entry awaiting ranking
struct Candidate<'a> {
    id: String,
    entry: &'a SourcedRecord,
    relevance: f64,
    insertion: usize,
    round: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    /// Build the dataset from every successful result in the report
    ///
    /// Failed and timed-out results contribute nothing. Every category is
    /// present in the output, possibly empty.
    pub fn aggregate(&self, report: &ScheduleReport) -> AggregatedDataset {
        debug!(results = report.len(), "Aggregator::aggregate: called");
        let mut dataset = AggregatedDataset::empty();

        for category in Category::ALL {
            let entries: Vec<SourcedRecord> = report
                .for_category(category)
                .into_iter()
                .filter(|r| r.is_success())
                .flat_map(|r| r.payload.iter().cloned())
                .collect();

            if entries.is_empty() {
                debug!(%category, "Aggregator::aggregate: no successful records");
                continue;
            }
            dataset.insert(category, self.merge(category, &entries));
        }

        debug!(records = dataset.len(), "Aggregator::aggregate: done");
        dataset
    }

    /// Deduplicate and rank one category's records
    pub fn merge(&self, category: Category, entries: &[SourcedRecord]) -> Vec<RankedRecord> {
        debug!(%category, entries = entries.len(), "Aggregator::merge: called");
        let mut seen = HashSet::new();
        let mut providers: Vec<(&str, Vec<Candidate<'_>>)> = Vec::new();

        for (insertion, entry) in entries.iter().enumerate() {
            let id = dedup_id(category, entry);
            if normalize(&entry.record.title).is_empty() {
                debug!(%category, provider = %entry.provider, "Aggregator::merge: skipping blank title");
                continue;
            }
            if !seen.insert(id.clone()) {
                continue;
            }

            let candidate = Candidate {
                id,
                entry,
                relevance: entry.record.relevance.unwrap_or(0.0),
                insertion,
                round: 0,
            };
            match providers.iter_mut().find(|(name, _)| *name == entry.provider) {
                Some((_, list)) => list.push(candidate),
                None => providers.push((entry.provider.as_str(), vec![candidate])),
            }
        }

        let mut ranked: Vec<Candidate<'_>> = Vec::new();
        for (_, mut list) in providers {
            // Stable sort keeps insertion order among equal relevance
            list.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
            for (round, mut candidate) in list.into_iter().enumerate() {
                candidate.round = round;
                ranked.push(candidate);
            }
        }

        ranked.sort_by(|a, b| {
            a.round
                .cmp(&b.round)
                .then_with(|| b.relevance.total_cmp(&a.relevance))
                .then_with(|| a.insertion.cmp(&b.insertion))
        });

        ranked
            .into_iter()
            .enumerate()
            .map(|(rank, c)| RankedRecord {
                id: c.id,
                category,
                provider: c.entry.provider.clone(),
                title: c.entry.record.title.trim().to_string(),
                link: c.entry.record.link.clone(),
                snippet: c.entry.record.snippet.clone(),
                tags: c.entry.record.tags.clone(),
                score: c.relevance,
                rank,
            })
            .collect()
    }
}

/// Record id derived from the category dedup key
///
/// Data categories key on provider, title and link. Synthesis notes key on
/// title alone since every note comes from the same built-in provider.
pub fn dedup_id(category: Category, entry: &SourcedRecord) -> String {
    let title = normalize(&entry.record.title);
    if category == Category::Synthesis {
        return record_id(category, &[&title]);
    }

    let link = entry.record.link.as_deref().map(normalize_link).unwrap_or_default();
    record_id(category, &[&entry.provider, &title, &link])
}

/// Lowercase, collapse whitespace and trim
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn normalize_link(link: &str) -> String {
    normalize(link).trim_end_matches('/').to_string()
}
