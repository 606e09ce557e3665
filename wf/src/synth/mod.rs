//! Response synthesis
//!
//! Turns an Outcome into user-facing text. The engine never formats
//! natural language itself; front ends pick a Synthesizer.

mod templates;

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use crate::domain::{Category, Day, Plan, RankedRecord};
use crate::orchestrator::Outcome;

/// Renders outcomes for people
pub trait Synthesizer: Send + Sync {
    fn synthesize(&self, outcome: &Outcome) -> Result<String>;
}

/// Records shown per category in search results
const SEARCH_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
struct SlotView {
    label: String,
    text: String,
    link: Option<String>,
}

#[derive(Debug, Serialize)]
struct DayView {
    index: u32,
    theme: String,
    slots: Vec<SlotView>,
}

#[derive(Debug, Serialize)]
struct PlannedView<'a> {
    subject: &'a str,
    origin: Option<&'a str>,
    duration_days: u32,
    multi_day: bool,
    party_size: u32,
    group: bool,
    days: Vec<DayView>,
    flights: Vec<String>,
    hotels: Vec<String>,
    overview: Vec<String>,
    recommendations: &'a [String],
}

#[derive(Debug, Serialize)]
struct RecordView<'a> {
    rank: usize,
    title: &'a str,
    link: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CategoryView<'a> {
    name: &'static str,
    records: Vec<RecordView<'a>>,
}

#[derive(Debug, Serialize)]
struct SearchedView<'a> {
    subject: &'a str,
    categories: Vec<CategoryView<'a>>,
}

#[derive(Debug, Serialize)]
struct ChangeView {
    day: u32,
    slot: String,
    after: String,
}

#[derive(Debug, Serialize)]
struct SummaryChangeView {
    name: &'static str,
    titles: String,
}

#[derive(Debug, Serialize)]
struct ModifiedView<'a> {
    subject: &'a str,
    updated: bool,
    changes: Vec<ChangeView>,
    summary: Vec<SummaryChangeView>,
}

/// Handlebars-backed plain text synthesizer
pub struct TextSynthesizer {
    hbs: Handlebars<'static>,
}

impl TextSynthesizer {
    pub fn new() -> Result<Self> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        for name in ["planned", "searched", "modified"] {
            let template = templates::get_embedded(name).ok_or_else(|| eyre!("Template not found: {}", name))?;
            hbs.register_template_string(name, template)
                .map_err(|e| eyre!("Failed to register template {}: {}", name, e))?;
        }
        Ok(Self { hbs })
    }

    fn render<T: Serialize>(&self, name: &str, view: &T) -> Result<String> {
        debug!(template = name, "TextSynthesizer::render: called");
        self.hbs
            .render(name, view)
            .map_err(|e| eyre!("Failed to render template {}: {}", name, e))
    }
}

impl Synthesizer for TextSynthesizer {
    fn synthesize(&self, outcome: &Outcome) -> Result<String> {
        match outcome {
            Outcome::Planned { intent, plan } => {
                let subject = plan.subject.as_deref().unwrap_or_else(|| intent.subject_or_default());
                self.render("planned", &planned_view(subject, plan))
            }
            Outcome::Searched { intent, dataset } => {
                let categories = Category::DATA
                    .iter()
                    .filter(|c| !dataset.get(**c).is_empty())
                    .map(|c| CategoryView {
                        name: display_name(*c),
                        records: dataset.get(*c).iter().take(SEARCH_LIMIT).map(record_view).collect(),
                    })
                    .collect();
                let view = SearchedView {
                    subject: intent.subject_or_default(),
                    categories,
                };
                self.render("searched", &view)
            }
            Outcome::Modified { intent, plan, patch } => {
                let subject = plan.subject.as_deref().unwrap_or_else(|| intent.subject_or_default());
                let changes = patch
                    .changes
                    .iter()
                    .map(|change| ChangeView {
                        day: change.day,
                        slot: change.slot.clone(),
                        after: slot_text(plan, change.day, &change.slot),
                    })
                    .collect();
                let summary = patch
                    .summary
                    .iter()
                    .map(|change| SummaryChangeView {
                        name: display_name(change.category),
                        titles: plan
                            .summary
                            .records(change.category)
                            .unwrap_or_default()
                            .iter()
                            .map(|r| r.title.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
                    .collect();
                let view = ModifiedView {
                    subject,
                    updated: !patch.is_empty(),
                    changes,
                    summary,
                };
                self.render("modified", &view)
            }
        }
    }
}

fn planned_view<'a>(subject: &'a str, plan: &'a Plan) -> PlannedView<'a> {
    let titles = |records: &[RankedRecord]| records.iter().map(|r| r.title.clone()).collect::<Vec<_>>();
    PlannedView {
        subject,
        origin: plan.origin.as_deref(),
        duration_days: plan.duration_days,
        multi_day: plan.duration_days != 1,
        party_size: plan.party_size,
        group: plan.party_size != 1,
        days: plan.days.iter().map(day_view).collect(),
        flights: titles(&plan.summary.flights),
        hotels: titles(&plan.summary.hotels),
        overview: titles(&plan.summary.overview),
        recommendations: &plan.recommendations,
    }
}

fn day_view(day: &Day) -> DayView {
    DayView {
        index: day.index,
        theme: day.theme.clone(),
        slots: day
            .slots
            .iter()
            .map(|slot| SlotView {
                label: slot.label.clone(),
                text: slot.display().to_string(),
                link: slot.record.as_ref().and_then(|r| r.link.clone()),
            })
            .collect(),
    }
}

fn record_view(record: &RankedRecord) -> RecordView<'_> {
    RecordView {
        rank: record.rank + 1,
        title: &record.title,
        link: record.link.as_deref(),
    }
}

fn slot_text(plan: &Plan, day: u32, label: &str) -> String {
    plan.days
        .iter()
        .find(|d| d.index == day)
        .and_then(|d| d.slots.iter().find(|s| s.label == label))
        .map(|s| s.display().to_string())
        .unwrap_or_default()
}

fn display_name(category: Category) -> &'static str {
    match category {
        Category::Flights => "Flights",
        Category::Hotels => "Hotels",
        Category::Activities => "Activities",
        Category::Dining => "Dining",
        Category::DestinationInfo => "Destination info",
        Category::Synthesis => "Recommendations",
    }
}
