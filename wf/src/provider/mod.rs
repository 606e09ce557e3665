//! Data providers
//!
//! Every data source implements the narrow [`Provider`] trait; the scheduler
//! only ever sees providers through a [`ProviderResolver`].

mod error;
mod fixture;
mod recommend;
mod registry;
mod serpapi;
mod traits;

pub use error::ProviderError;
pub use fixture::FixtureProvider;
pub use recommend::{RECOMMENDATION_PROVIDER, RecommendationProvider};
pub use registry::ProviderRegistry;
pub use serpapi::{SERPAPI_PROVIDER, SerpApiProvider};
pub use traits::{Provider, ProviderResolver, QueryParams, Upstream};

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::Category;

/// Build the registry a front end runs with
///
/// A configured fixtures file serves every data category offline;
/// otherwise SerpApi does, which needs its API key.
pub fn registry_from_config(config: &Config) -> eyre::Result<ProviderRegistry> {
    debug!(fixtures = ?config.providers.fixtures, "registry_from_config: called");
    let mut registry = ProviderRegistry::new();

    if let Some(path) = &config.providers.fixtures {
        let fixtures = FixtureProvider::load(path)?;
        info!(path = %path.display(), "Using fixture provider");
        registry.register_all(Category::DATA, Arc::new(fixtures));
        return Ok(registry);
    }

    let serpapi = SerpApiProvider::from_config(&config.serpapi)?;
    info!("Using SerpApi provider");
    registry.register_all(Category::DATA, Arc::new(serpapi));
    Ok(registry)
}
