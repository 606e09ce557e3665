//! Data categories
//!
//! The capability taxonomy shared by the graph builder, the scheduler and
//! the provider registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A category of data a provider can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Flights,
    Hotels,
    Activities,
    Dining,
    DestinationInfo,
    /// Plan assembly; depends on every data category
    Synthesis,
}

impl Category {
    /// Every category, in graph order
    pub const ALL: [Category; 6] = [
        Category::Flights,
        Category::Hotels,
        Category::Activities,
        Category::Dining,
        Category::DestinationInfo,
        Category::Synthesis,
    ];

    /// Data-gathering categories (everything except synthesis)
    pub const DATA: [Category; 5] = [
        Category::Flights,
        Category::Hotels,
        Category::Activities,
        Category::Dining,
        Category::DestinationInfo,
    ];

    /// Stable kebab-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flights => "flights",
            Self::Hotels => "hotels",
            Self::Activities => "activities",
            Self::Dining => "dining",
            Self::DestinationInfo => "destination-info",
            Self::Synthesis => "synthesis",
        }
    }

    /// True for data-gathering categories
    pub fn is_data(&self) -> bool {
        !matches!(self, Self::Synthesis)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flights" | "flight" => Ok(Self::Flights),
            "hotels" | "hotel" => Ok(Self::Hotels),
            "activities" | "activity" => Ok(Self::Activities),
            "dining" | "restaurants" => Ok(Self::Dining),
            "destination-info" | "destination_info" => Ok(Self::DestinationInfo),
            "synthesis" => Ok(Self::Synthesis),
            other => Err(format!("Unknown category: '{}'", other)),
        }
    }
}
