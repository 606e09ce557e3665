//! Aggregated dataset
//!
//! Per-category, deduplicated, ranked records. Every category is always
//! present; a category without successful results maps to an empty list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Category, RankedRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedDataset {
    categories: BTreeMap<Category, Vec<RankedRecord>>,
}

impl AggregatedDataset {
    /// Dataset with an empty entry for every category
    pub fn empty() -> Self {
        Self {
            categories: Category::ALL.iter().map(|c| (*c, Vec::new())).collect(),
        }
    }

    /// Records for a category, in rank order
    pub fn get(&self, category: Category) -> &[RankedRecord] {
        self.categories.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace the records for a category
    pub fn insert(&mut self, category: Category, records: Vec<RankedRecord>) {
        self.categories.insert(category, records);
    }

    pub fn contains_record(&self, id: &str) -> bool {
        self.categories.values().flatten().any(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, &Vec<RankedRecord>)> {
        self.categories.iter()
    }

    /// Total record count across categories
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AggregatedDataset {
    fn default() -> Self {
        Self::empty()
    }
}
