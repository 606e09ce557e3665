//! Wayfarer configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use crate::domain::Category;
use crate::scheduler::SchedulerConfig;

/// Main Wayfarer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Task scheduling limits
    pub scheduler: SchedulerConfig,

    /// Plan layout and defaults
    pub planner: PlannerConfig,

    /// SerpApi provider settings
    pub serpapi: SerpApiConfig,

    /// Provider selection
    pub providers: ProvidersConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .wayfarer.yml
        let local_config = PathBuf::from(".wayfarer.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/wayfarer/wayfarer.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("wayfarer").join("wayfarer.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => PathBuf::from(".wayfarer.yml"),
        };
        let content = fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// One slot in the daily layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub label: String,
    pub category: Category,
}

impl SlotSpec {
    pub fn new(label: impl Into<String>, category: Category) -> Self {
        Self {
            label: label.into(),
            category,
        }
    }
}

/// Plan layout and defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Days planned when the request gives no duration
    #[serde(rename = "default-days")]
    pub default_days: u32,

    /// Longest plan a request may ask for
    #[serde(rename = "max-days")]
    pub max_days: u32,

    /// Theme used when the request names no interests
    #[serde(rename = "default-theme")]
    pub default_theme: String,

    /// Records kept in each plan-wide summary list
    #[serde(rename = "summary-size")]
    pub summary_size: usize,

    /// Placeholder text; supports {slot}, {category} and {subject}
    #[serde(rename = "fallback-template")]
    pub fallback_template: String,

    /// Daily slot layout, in display order
    pub slots: Vec<SlotSpec>,

    /// General advice appended to every plan's recommendations
    pub tips: Vec<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_days: 3,
            max_days: 30,
            default_theme: "exploration".to_string(),
            summary_size: 3,
            fallback_template: "Free {slot}: explore {subject} at your own pace".to_string(),
            slots: vec![
                SlotSpec::new("morning", Category::Activities),
                SlotSpec::new("afternoon", Category::Activities),
                SlotSpec::new("evening", Category::Dining),
            ],
            tips: vec![
                "Book accommodations early for better rates".to_string(),
                "Download offline maps and translation apps".to_string(),
                "Check visa requirements and travel advisories".to_string(),
            ],
        }
    }
}

/// SerpApi provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerpApiConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Search engine parameter
    pub engine: String,

    /// Results requested per search
    #[serde(rename = "num-results")]
    pub num_results: usize,

    /// HTTP request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries for transient errors
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for SerpApiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "SERPAPI_KEY".to_string(),
            base_url: "https://serpapi.com/search".to_string(),
            engine: "google".to_string(),
            num_results: 10,
            timeout_ms: 15_000,
            max_retries: 2,
        }
    }
}

impl SerpApiConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).context(format!(
            "SerpApi key not found. Set the {} environment variable.",
            self.api_key_env
        ))
    }
}

/// Provider selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// YAML file of canned records; when set, SerpApi is not used
    pub fixtures: Option<PathBuf>,
}
