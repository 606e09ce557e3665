//! Provider registry
//!
//! Explicit category → provider map handed to the scheduler. Built once per
//! process (providers are stateless) or per request.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::traits::{Provider, ProviderResolver};
use crate::domain::Category;

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<Category, Vec<Arc<dyn Provider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider for one category
    pub fn register(&mut self, category: Category, provider: Arc<dyn Provider>) -> &mut Self {
        debug!(%category, provider = provider.name(), "ProviderRegistry::register: called");
        self.providers.entry(category).or_default().push(provider);
        self
    }

    /// Register a provider for several categories
    pub fn register_all<I>(&mut self, categories: I, provider: Arc<dyn Provider>) -> &mut Self
    where
        I: IntoIterator<Item = Category>,
    {
        for category in categories {
            self.register(category, provider.clone());
        }
        self
    }

    /// Check whether any provider serves the category
    pub fn has(&self, category: Category) -> bool {
        self.providers.get(&category).is_some_and(|p| !p.is_empty())
    }

    /// Names of the providers serving a category
    pub fn provider_names(&self, category: Category) -> Vec<String> {
        self.providers
            .get(&category)
            .map(|ps| ps.iter().map(|p| p.name().to_string()).collect())
            .unwrap_or_default()
    }

    /// Categories with at least one provider
    pub fn categories(&self) -> Vec<Category> {
        self.providers
            .iter()
            .filter(|(_, ps)| !ps.is_empty())
            .map(|(c, _)| *c)
            .collect()
    }
}

impl ProviderResolver for ProviderRegistry {
    fn resolve(&self, category: Category) -> Vec<Arc<dyn Provider>> {
        self.providers.get(&category).cloned().unwrap_or_default()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: BTreeMap<&str, Vec<String>> = self
            .providers
            .keys()
            .map(|c| (c.as_str(), self.provider_names(*c)))
            .collect();
        f.debug_struct("ProviderRegistry").field("providers", &names).finish()
    }
}
