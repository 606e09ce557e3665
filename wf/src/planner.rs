//! PlanBuilder - deterministic day-by-day plan assembly
//!
//! Days come from the intent's duration, themes round-robin over its
//! interests, and slots are filled from the aggregated dataset in rank
//! order. A record is consumed by the first slot that takes it, so no two
//! slots in a plan show the same record.

use std::collections::HashSet;
use tracing::{debug, info};

use crate::config::{PlannerConfig, SlotSpec};
use crate::domain::{AggregatedDataset, Category, Day, Intent, Plan, PlanSummary, RankedRecord, Slot};
use crate::error::{EngineError, EngineResult};

/// Builds plans from an intent and a dataset
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    config: PlannerConfig,
}

impl PlanBuilder {
    pub fn new(config: PlannerConfig) -> Self {
        debug!(?config, "PlanBuilder::new: called");
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Assemble a complete plan
    pub fn build(&self, intent: &Intent, dataset: &AggregatedDataset) -> EngineResult<Plan> {
        debug!(kind = %intent.kind, duration = ?intent.duration, "PlanBuilder::build: called");
        let duration_days = self.parse_duration(intent.duration.as_deref())?;
        let themes = self.theme_rotation(&intent.interests);
        let subject = intent.subject_or_default();

        let mut days: Vec<Day> = (0..duration_days)
            .map(|i| Day {
                index: i + 1,
                theme: themes[i as usize % themes.len()].clone(),
                slots: self.empty_slots(subject),
            })
            .collect();

        let mut used = HashSet::new();
        let filled = self.fill(&mut days, dataset, subject, &mut used, |_, _| true);
        debug!(filled, "PlanBuilder::build: slots filled");

        let plan = Plan {
            subject: intent.subject.clone(),
            origin: intent.origin.clone(),
            party_size: intent.party_size,
            duration_days,
            themes,
            days,
            summary: self.summary(dataset),
            recommendations: self.recommendations(dataset),
        };

        info!(
            subject = %subject,
            days = plan.days.len(),
            placeholders = plan.placeholder_count(),
            "Plan built"
        );
        Ok(plan)
    }

    /// Number of days a duration phrase asks for
    ///
    /// Accepts `"<n>"`, `"<n> day(s)"`, `"<n> night(s)"`, `"<n> week(s)"` and
    /// `"weekend"`. A missing duration uses the configured default. Anything
    /// above `max-days` is rejected before a single day is allocated.
    pub fn parse_duration(&self, duration: Option<&str>) -> EngineResult<u32> {
        debug!(?duration, "PlanBuilder::parse_duration: called");
        let Some(raw) = duration else {
            if self.config.default_days == 0 {
                return Err(EngineError::InvalidDuration("default-days is 0".to_string()));
            }
            return Ok(self.config.default_days);
        };

        let invalid = || EngineError::InvalidDuration(raw.to_string());
        let text = raw.trim().to_lowercase();
        if matches!(text.as_str(), "weekend" | "a weekend" | "the weekend") {
            return Ok(2);
        }

        let (negative, rest) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.as_str()),
        };
        let split = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (digits, unit) = rest.split_at(split);
        if digits.is_empty() || negative {
            return Err(invalid());
        }

        let count: u32 = digits.parse().map_err(|_| invalid())?;
        let multiplier = match unit.trim().trim_start_matches('-').trim() {
            "" | "d" | "day" | "days" | "night" | "nights" => 1,
            "w" | "week" | "weeks" => 7,
            _ => return Err(invalid()),
        };

        match count.checked_mul(multiplier) {
            Some(days) if days > self.config.max_days => {
                debug!(days, max_days = self.config.max_days, "PlanBuilder::parse_duration: over max-days");
                Err(EngineError::InvalidDuration(format!(
                    "{} (longer than {} days)",
                    raw, self.config.max_days
                )))
            }
            Some(days) if days > 0 => Ok(days),
            _ => Err(invalid()),
        }
    }

    /// Themes to round-robin over: the interests, or the default theme
    pub fn theme_rotation(&self, interests: &[String]) -> Vec<String> {
        if interests.is_empty() {
            vec![self.config.default_theme.clone()]
        } else {
            interests.to_vec()
        }
    }

    /// Fill every selected slot with the next unused record of its category
    ///
    /// Slots are visited day by day in layout order. Ids already in `used`
    /// are skipped and every record placed is added to it. A slot with no
    /// record left gets the fallback placeholder. Returns the number of
    /// slots that received a record.
    pub fn fill<F>(
        &self,
        days: &mut [Day],
        dataset: &AggregatedDataset,
        subject: &str,
        used: &mut HashSet<String>,
        mut select: F,
    ) -> usize
    where
        F: FnMut(&Day, &Slot) -> bool,
    {
        debug!(days = days.len(), used = used.len(), "PlanBuilder::fill: called");
        let mut filled = 0;

        for d in 0..days.len() {
            for s in 0..days[d].slots.len() {
                if !select(&days[d], &days[d].slots[s]) {
                    continue;
                }

                let label = days[d].slots[s].label.clone();
                let category = days[d].slots[s].category;
                let next = dataset.get(category).iter().find(|r| !used.contains(&r.id));

                days[d].slots[s] = match next {
                    Some(record) => {
                        used.insert(record.id.clone());
                        filled += 1;
                        Slot::filled(label, category, record.clone())
                    }
                    None => {
                        debug!(day = days[d].index, %label, %category, "PlanBuilder::fill: dataset exhausted");
                        let fallback = self.fallback(&label, category, subject);
                        Slot::placeholder(label, category, fallback)
                    }
                };
            }
        }

        filled
    }

    /// Whether the daily layout has a slot for the category
    pub fn has_slot_for(&self, category: Category) -> bool {
        self.config.slots.iter().any(|slot| slot.category == category)
    }

    /// Replace a summary list with the best records it does not show yet
    ///
    /// Returns false and leaves the summary alone when the category has no
    /// summary list or the dataset offers nothing new.
    pub fn refresh_summary(&self, summary: &mut PlanSummary, category: Category, dataset: &AggregatedDataset) -> bool {
        debug!(%category, "PlanBuilder::refresh_summary: called");
        let Some(current) = summary.records_mut(category) else {
            return false;
        };

        let shown: HashSet<&str> = current.iter().map(|r| r.id.as_str()).collect();
        let fresh: Vec<RankedRecord> = dataset
            .get(category)
            .iter()
            .filter(|r| !shown.contains(r.id.as_str()))
            .take(self.config.summary_size)
            .cloned()
            .collect();

        if fresh.is_empty() {
            debug!(%category, "PlanBuilder::refresh_summary: nothing new");
            return false;
        }
        *current = fresh;
        true
    }

    /// Placeholder text for a slot
    pub fn fallback(&self, label: &str, category: Category, subject: &str) -> String {
        self.config
            .fallback_template
            .replace("{slot}", label)
            .replace("{category}", category.as_str())
            .replace("{subject}", subject)
    }

    fn empty_slots(&self, subject: &str) -> Vec<Slot> {
        self.config
            .slots
            .iter()
            .map(|SlotSpec { label, category }| {
                Slot::placeholder(label.clone(), *category, self.fallback(label, *category, subject))
            })
            .collect()
    }

    fn summary(&self, dataset: &AggregatedDataset) -> PlanSummary {
        let top = |category: Category| -> Vec<RankedRecord> {
            dataset.get(category).iter().take(self.config.summary_size).cloned().collect()
        };
        PlanSummary {
            flights: top(Category::Flights),
            hotels: top(Category::Hotels),
            overview: top(Category::DestinationInfo),
        }
    }

    fn recommendations(&self, dataset: &AggregatedDataset) -> Vec<String> {
        dataset
            .get(Category::Synthesis)
            .iter()
            .map(|r| r.title.clone())
            .chain(self.config.tips.iter().cloned())
            .collect()
    }
}
