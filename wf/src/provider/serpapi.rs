//! SerpApi search provider
//!
//! Serves every data category through Google web search results, using one
//! query template per category.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::ProviderError;
use super::traits::{Provider, QueryParams};
use crate::config::SerpApiConfig;
use crate::domain::{Budget, Category, RawRecord};

pub const SERPAPI_PROVIDER: &str = "serpapi";

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 500;

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    position: Option<u32>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

pub struct SerpApiProvider {
    api_key: String,
    base_url: String,
    engine: String,
    num_results: usize,
    max_retries: u32,
    timeout: Duration,
    http: Client,
}

impl SerpApiProvider {
    /// Create a new provider from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &SerpApiConfig) -> Result<Self, ProviderError> {
        debug!(base_url = %config.base_url, engine = %config.engine, "SerpApiProvider::from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(ProviderError::Network)?;

        Ok(Self {
            api_key,
            base_url: config.base_url.clone(),
            engine: config.engine.clone(),
            num_results: config.num_results,
            max_retries: config.max_retries,
            timeout,
            http,
        })
    }

    /// Build the search query string for a category
    pub fn build_query(category: Category, query: &QueryParams) -> Result<String, ProviderError> {
        debug!(%category, "SerpApiProvider::build_query: called");
        let destination = query.subject_or_default();
        let date = query.start_date.map(|d| d.to_string()).unwrap_or_default();

        let text = match category {
            Category::Flights => match &query.origin {
                Some(origin) => format!("flights from {} to {} {}", origin, destination, date),
                None => format!("flights to {} {}", destination, date),
            },
            Category::Hotels => format!("hotels in {} {} {} guests", destination, date, query.party_size),
            Category::Activities => {
                let interests = if query.interests.is_empty() {
                    "tourist attractions".to_string()
                } else {
                    query.interests.join(" ")
                };
                format!("things to do in {} {} activities attractions", destination, interests)
            }
            Category::Dining => {
                let level = match query.budget {
                    Budget::Budget => "cheap eats",
                    Budget::MidRange => "best restaurants",
                    Budget::Luxury => "fine dining",
                };
                format!("{} in {} local cuisine", level, destination)
            }
            Category::DestinationInfo => format!(
                "{} travel guide best time to visit weather {}",
                destination,
                query.interests.join(" ")
            ),
            Category::Synthesis => return Err(ProviderError::Unsupported(category.to_string())),
        };

        Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    /// Map SerpApi organic results to raw records
    fn to_records(&self, category: Category, query: &QueryParams, results: Vec<OrganicResult>) -> Vec<RawRecord> {
        debug!(%category, count = results.len(), "SerpApiProvider::to_records: called");
        results
            .into_iter()
            .filter(|r| !r.title.trim().is_empty())
            .take(self.num_results)
            .enumerate()
            .map(|(i, r)| {
                let position = r.position.unwrap_or(i as u32 + 1).max(1);
                let mut record = RawRecord::new(r.title.trim()).with_relevance(1.0 / position as f64);
                record.link = r.link;
                record.snippet = r.snippet;
                if category == Category::Activities {
                    record.tags = query.interests.clone();
                }
                record
            })
            .collect()
    }

    async fn request(&self, q: &str) -> Result<SearchResponse, ProviderError> {
        debug!(%q, "SerpApiProvider::request: called");
        let num = self.num_results.to_string();
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", q),
                ("engine", self.engine.as_str()),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "SerpApiProvider::request: error status");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response.json().await?;
        if let Some(error) = body.error {
            debug!(%error, "SerpApiProvider::request: error in body");
            return Err(ProviderError::InvalidResponse(error));
        }
        Ok(body)
    }
}

#[async_trait]
impl Provider for SerpApiProvider {
    fn name(&self) -> &str {
        SERPAPI_PROVIDER
    }

    async fn search(&self, category: Category, query: &QueryParams) -> Result<Vec<RawRecord>, ProviderError> {
        debug!(%category, "SerpApiProvider::search: called");
        let q = Self::build_query(category, query)?;

        let mut attempt = 0;
        loop {
            match self.request(&q).await {
                Ok(body) => return Ok(self.to_records(category, query, body.organic_results)),
                Err(ProviderError::Api { status, message })
                    if is_retryable_status(status) && attempt < self.max_retries =>
                {
                    let backoff = Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt));
                    warn!(%category, status, %message, ?backoff, "SerpApi transient error, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) if e.is_timeout() => {
                    debug!(%category, "SerpApiProvider::search: request timed out");
                    return Err(ProviderError::Timeout(self.timeout));
                }
                Err(e) => return Err(e),
            }
        }
    }
}
