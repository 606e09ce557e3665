//! Plan domain type
//!
//! A Plan is the structured, day-by-day result handed to the response
//! synthesizer and committed to the session.

use serde::{Deserialize, Serialize};

use super::{Category, RankedRecord};

/// One slot within a day (morning, afternoon, evening)
///
/// Exactly one of `record` or `fallback` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub label: String,
    pub category: Category,
    pub record: Option<RankedRecord>,
    pub fallback: Option<String>,
}

impl Slot {
    /// Slot filled with a dataset record
    pub fn filled(label: impl Into<String>, category: Category, record: RankedRecord) -> Self {
        Self {
            label: label.into(),
            category,
            record: Some(record),
            fallback: None,
        }
    }

    /// Slot showing a placeholder because no record was available
    pub fn placeholder(label: impl Into<String>, category: Category, fallback: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            category,
            record: None,
            fallback: Some(fallback.into()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.record.is_none()
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record.as_ref().map(|r| r.id.as_str())
    }

    /// Title of the record, or the fallback label
    pub fn display(&self) -> &str {
        match (&self.record, &self.fallback) {
            (Some(record), _) => &record.title,
            (None, Some(fallback)) => fallback,
            (None, None) => "",
        }
    }
}

/// One day of the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    /// 1-based day number
    pub index: u32,
    pub theme: String,
    pub slots: Vec<Slot>,
}

/// Plan-wide fields populated once rather than per day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub flights: Vec<RankedRecord>,
    pub hotels: Vec<RankedRecord>,
    pub overview: Vec<RankedRecord>,
}

impl PlanSummary {
    /// Categories that live in the summary rather than in day slots
    pub const CATEGORIES: [Category; 3] = [Category::Flights, Category::Hotels, Category::DestinationInfo];

    /// The summary list holding a category, if it has one
    pub fn records(&self, category: Category) -> Option<&[RankedRecord]> {
        match category {
            Category::Flights => Some(&self.flights),
            Category::Hotels => Some(&self.hotels),
            Category::DestinationInfo => Some(&self.overview),
            _ => None,
        }
    }

    pub fn records_mut(&mut self, category: Category) -> Option<&mut Vec<RankedRecord>> {
        match category {
            Category::Flights => Some(&mut self.flights),
            Category::Hotels => Some(&mut self.hotels),
            Category::DestinationInfo => Some(&mut self.overview),
            _ => None,
        }
    }

    /// Ids of every record in the summary
    pub fn record_ids(&self) -> Vec<&str> {
        self.flights
            .iter()
            .chain(&self.hotels)
            .chain(&self.overview)
            .map(|r| r.id.as_str())
            .collect()
    }
}

/// A day-by-day plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub subject: Option<String>,
    pub origin: Option<String>,
    pub party_size: u32,
    pub duration_days: u32,
    /// Theme rotation used to assign day themes
    pub themes: Vec<String>,
    pub days: Vec<Day>,
    pub summary: PlanSummary,
    pub recommendations: Vec<String>,
}

impl Plan {
    /// Ids of every record referenced by the plan's days
    pub fn used_record_ids(&self) -> Vec<&str> {
        self.days
            .iter()
            .flat_map(|d| d.slots.iter())
            .filter_map(|s| s.record_id())
            .collect()
    }

    /// Number of slots showing a placeholder
    pub fn placeholder_count(&self) -> usize {
        self.days
            .iter()
            .flat_map(|d| d.slots.iter())
            .filter(|s| s.is_placeholder())
            .count()
    }
}

/// A single slot replaced by a modification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotChange {
    pub day: u32,
    pub slot: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// A summary list replaced by a modification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryChange {
    pub category: Category,
    pub before: Vec<String>,
    pub after: Vec<String>,
}

/// The minimal set of slot and summary changes between two plans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanPatch {
    pub changes: Vec<SlotChange>,

    #[serde(default)]
    pub summary: Vec<SummaryChange>,
}

impl PlanPatch {
    /// Compute the patch between two plans with the same day/slot layout
    pub fn diff(before: &Plan, after: &Plan) -> Self {
        let mut changes = Vec::new();
        for (old_day, new_day) in before.days.iter().zip(after.days.iter()) {
            for (old_slot, new_slot) in old_day.slots.iter().zip(new_day.slots.iter()) {
                if old_slot != new_slot {
                    changes.push(SlotChange {
                        day: new_day.index,
                        slot: new_slot.label.clone(),
                        before: old_slot.record_id().map(String::from),
                        after: new_slot.record_id().map(String::from),
                    });
                }
            }
        }

        let ids = |plan: &Plan, category| -> Vec<String> {
            plan.summary
                .records(category)
                .unwrap_or_default()
                .iter()
                .map(|r| r.id.clone())
                .collect()
        };
        let summary = PlanSummary::CATEGORIES
            .into_iter()
            .filter_map(|category| {
                let (old, new) = (ids(before, category), ids(after, category));
                (old != new).then_some(SummaryChange {
                    category,
                    before: old,
                    after: new,
                })
            })
            .collect();

        Self { changes, summary }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.summary.is_empty()
    }

    /// Day numbers touched by the patch, ascending and unique
    pub fn days(&self) -> Vec<u32> {
        let mut days: Vec<u32> = self.changes.iter().map(|c| c.day).collect();
        days.dedup();
        days
    }
}
