//! Fixture provider
//!
//! Serves canned records from a YAML file. Used for offline runs and tests.
//!
//! ```yaml
//! name: fixtures
//! records:
//!   activities:
//!     - title: Senso-ji Temple
//!       link: https://example.com/sensoji
//!       tags: [culture]
//! ```

use async_trait::async_trait;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::error::ProviderError;
use super::traits::{Provider, QueryParams};
use crate::domain::{Category, RawRecord};

fn default_name() -> String {
    "fixtures".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureProvider {
    #[serde(default = "default_name")]
    name: String,

    #[serde(default)]
    records: BTreeMap<Category, Vec<RawRecord>>,
}

impl FixtureProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: BTreeMap::new(),
        }
    }

    /// Add records for a category
    pub fn with_records(mut self, category: Category, records: Vec<RawRecord>) -> Self {
        self.records.entry(category).or_default().extend(records);
        self
    }

    /// Load fixtures from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!(path = %path.as_ref().display(), "FixtureProvider::load: called");
        let content = fs::read_to_string(&path)
            .context(format!("Failed to read fixtures from {}", path.as_ref().display()))?;
        let provider: Self = serde_yaml::from_str(&content).context("Failed to parse fixtures file")?;
        tracing::info!(
            name = %provider.name,
            categories = provider.records.len(),
            "Loaded fixtures from: {}",
            path.as_ref().display()
        );
        Ok(provider)
    }

    /// Categories that have fixture records
    pub fn categories(&self) -> Vec<Category> {
        self.records.keys().copied().collect()
    }
}

#[async_trait]
impl Provider for FixtureProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, category: Category, _query: &QueryParams) -> Result<Vec<RawRecord>, ProviderError> {
        debug!(%category, name = %self.name, "FixtureProvider::search: called");
        Ok(self.records.get(&category).cloned().unwrap_or_default())
    }
}
