//! ModificationEngine - targeted edits to an existing plan
//!
//! A follow-up request is mapped to a scope (theme and category). Only the
//! scope's category is re-queried, and only matching slots in days with the
//! scope's theme are refilled. Every other day is left untouched. Categories
//! shown plan-wide (flights, hotels, overview) refresh their summary list
//! instead. A scope that matches neither is a no-op and queries nothing.

use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregate::Aggregator;
use crate::domain::{Category, Day, Intent, Plan, PlanPatch};
use crate::error::{EngineError, EngineResult};
use crate::graph::TaskGraphBuilder;
use crate::planner::PlanBuilder;
use crate::provider::{ProviderResolver, QueryParams};
use crate::scheduler::Scheduler;

/// What a modification targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Day theme to touch; None means every day
    pub theme: Option<String>,
    pub category: Category,
}

impl Scope {
    /// Derive the scope from a modification intent
    ///
    /// Theme is the first interest. Category is the first data focus,
    /// else Dining for a food theme, else Activities.
    pub fn from_intent(delta: &Intent) -> Self {
        let theme = delta.interests.first().cloned();
        let category = delta
            .focus
            .iter()
            .copied()
            .find(Category::is_data)
            .unwrap_or(match theme.as_deref() {
                Some("food") => Category::Dining,
                _ => Category::Activities,
            });
        Self { theme, category }
    }

    fn covers(&self, day: &Day) -> bool {
        match &self.theme {
            Some(theme) => day.theme.eq_ignore_ascii_case(theme),
            None => true,
        }
    }
}

/// A modified plan and the slots that changed
#[derive(Debug, Clone, PartialEq)]
pub struct Modification {
    pub plan: Plan,
    pub patch: PlanPatch,
}

impl Modification {
    fn unchanged(plan: &Plan) -> Self {
        Self {
            plan: plan.clone(),
            patch: PlanPatch::default(),
        }
    }
}

/// Applies follow-up requests to a committed plan
#[derive(Debug, Clone, Default)]
pub struct ModificationEngine {
    builder: TaskGraphBuilder,
    scheduler: Scheduler,
    aggregator: Aggregator,
    planner: PlanBuilder,
}

impl ModificationEngine {
    pub fn new(scheduler: Scheduler, planner: PlanBuilder) -> Self {
        Self {
            builder: TaskGraphBuilder::new(),
            scheduler,
            aggregator: Aggregator::new(),
            planner,
        }
    }

    /// Apply `delta` to `prior`, re-querying only the affected category
    pub async fn apply(
        &self,
        prior: Option<&Plan>,
        delta: &Intent,
        resolver: &dyn ProviderResolver,
        cancel: &CancellationToken,
    ) -> EngineResult<Modification> {
        debug!(raw_text = %delta.raw_text, "ModificationEngine::apply: called");
        let Some(prior) = prior else {
            debug!("ModificationEngine::apply: no prior plan");
            return Err(EngineError::NoPriorPlan);
        };

        let scope = Scope::from_intent(delta);
        debug!(?scope, "ModificationEngine::apply: scope resolved");

        let mut query = QueryParams::from_intent(delta);
        if query.subject.is_none() {
            query.subject = prior.subject.clone();
        }
        if query.origin.is_none() {
            query.origin = prior.origin.clone();
        }

        let targets_days = self.planner.has_slot_for(scope.category) && prior.days.iter().any(|d| scope.covers(d));
        // Flights need an origin to be queried
        let targets_summary = prior.summary.records(scope.category).is_some()
            && (scope.category != Category::Flights || query.origin.is_some());
        if !targets_days && !targets_summary {
            warn!(
                category = %scope.category,
                theme = ?scope.theme,
                "Modification matches no day slot or summary, plan unchanged"
            );
            return Ok(Modification::unchanged(prior));
        }

        let graph = self.builder.build_scoped(delta, &[scope.category])?;
        let report = self.scheduler.run(&graph, resolver, &query, cancel).await;
        let dataset = self.aggregator.aggregate(&report);

        if dataset.get(scope.category).is_empty() {
            warn!(category = %scope.category, "Scoped re-query returned nothing, plan unchanged");
            return Ok(Modification::unchanged(prior));
        }

        let mut plan = prior.clone();
        let mut filled = 0;

        if targets_days {
            let targeted = |day: &Day, category: Category| scope.covers(day) && category == scope.category;

            // Records shown outside the targeted slots stay reserved
            let mut used: HashSet<String> = prior
                .days
                .iter()
                .flat_map(|day| day.slots.iter().map(move |slot| (day, slot)))
                .filter(|(day, slot)| !targeted(*day, slot.category))
                .filter_map(|(_, slot)| slot.record_id().map(String::from))
                .collect();

            let subject = query.subject_or_default().to_string();
            filled = self.planner.fill(&mut plan.days, &dataset, &subject, &mut used, |day, slot| {
                targeted(day, slot.category)
            });
        }

        if targets_summary && !self.planner.refresh_summary(&mut plan.summary, scope.category, &dataset) {
            debug!(category = %scope.category, "ModificationEngine::apply: summary kept");
        }

        let patch = PlanPatch::diff(prior, &plan);
        info!(
            category = %scope.category,
            theme = ?scope.theme,
            filled,
            changed = patch.changes.len(),
            summary_changed = patch.summary.len(),
            "Plan modified"
        );
        Ok(Modification { plan, patch })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlannerConfig, SlotSpec};
    use crate::domain::{AggregatedDataset, IntentKind, RankedRecord, RawRecord, SourcedRecord};
    use crate::provider::{Provider, ProviderError, ProviderRegistry};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        titles: Vec<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Provider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn search(&self, _category: Category, _query: &QueryParams) -> Result<Vec<RawRecord>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.titles.iter().map(|t| RawRecord::new(*t)).collect())
        }
    }

    fn ranked(category: Category, titles: &[&str]) -> Vec<RankedRecord> {
        titles
            .iter()
            .enumerate()
            .map(|(rank, title)| RankedRecord {
                id: format!("{}:old:{}", category, title),
                category,
                provider: "old".to_string(),
                title: title.to_string(),
                link: None,
                snippet: None,
                tags: Vec::new(),
                score: 0.0,
                rank,
            })
            .collect()
    }

    fn prior_dataset() -> AggregatedDataset {
        let mut dataset = AggregatedDataset::empty();
        dataset.insert(Category::Activities, ranked(Category::Activities, &["a1", "a2", "a3", "a4", "a5", "a6"]));
        dataset.insert(Category::Dining, ranked(Category::Dining, &["d1", "d2", "d3"]));
        dataset.insert(Category::Hotels, ranked(Category::Hotels, &["h1", "h2"]));
        dataset
    }

    fn prior_intent() -> Intent {
        Intent::new(IntentKind::NewPlan, "trip")
            .with_subject("Osaka")
            .with_duration("3")
            .with_interests(["culture", "food"])
    }

    fn prior_plan() -> Plan {
        PlanBuilder::default().build(&prior_intent(), &prior_dataset()).unwrap()
    }

    /// The dataset a CountingProvider answer aggregates to
    fn scoped_dataset(category: Category, titles: &[&str]) -> AggregatedDataset {
        let entries: Vec<SourcedRecord> = titles
            .iter()
            .map(|t| SourcedRecord::new("counting", RawRecord::new(*t)))
            .collect();
        let mut dataset = AggregatedDataset::empty();
        dataset.insert(category, Aggregator::new().merge(category, &entries));
        dataset
    }

    fn registry(category: Category, titles: Vec<&'static str>) -> (ProviderRegistry, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider {
            titles,
            calls: AtomicUsize::new(0),
        });
        let mut registry = ProviderRegistry::new();
        registry.register(category, provider.clone());
        (registry, provider)
    }

    #[test]
    fn test_scope_from_intent() {
        let food = Intent::new(IntentKind::Modify, "more food").with_interests(["food"]);
        assert_eq!(
            Scope::from_intent(&food),
            Scope {
                theme: Some("food".to_string()),
                category: Category::Dining
            }
        );

        let museums = Intent::new(IntentKind::Modify, "add museums").with_interests(["culture"]);
        assert_eq!(Scope::from_intent(&museums).category, Category::Activities);

        let hotels = Intent::new(IntentKind::Modify, "change hotel").with_focus([Category::Hotels]);
        let scope = Scope::from_intent(&hotels);
        assert_eq!(scope.theme, None);
        assert_eq!(scope.category, Category::Hotels);
    }

    #[tokio::test]
    async fn test_no_prior_plan() {
        let delta = Intent::new(IntentKind::Modify, "more food").with_interests(["food"]);
        let result = ModificationEngine::default()
            .apply(None, &delta, &ProviderRegistry::new(), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(EngineError::NoPriorPlan)));
    }

    #[tokio::test]
    async fn test_only_food_days_change() {
        let prior = prior_plan();
        let (registry, provider) = registry(Category::Dining, vec!["Ramen Alley", "Kushikatsu Bar"]);
        let delta = Intent::new(IntentKind::Modify, "more food").with_interests(["food"]);

        let result = ModificationEngine::default()
            .apply(Some(&prior), &delta, &registry, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.plan.days[0], prior.days[0]);
        assert_eq!(result.plan.days[2], prior.days[2]);
        assert_eq!(result.plan.days[1].slots[0], prior.days[1].slots[0]);
        assert_eq!(result.plan.days[1].slots[2].display(), "Ramen Alley");
        assert_eq!(result.patch.days(), vec![2]);
        assert_eq!(result.patch.changes.len(), 1);
    }

    #[tokio::test]
    async fn test_unmatched_theme_leaves_plan_unchanged() {
        let prior = prior_plan();
        let (registry, provider) = registry(Category::Activities, vec!["Hiking"]);
        let delta = Intent::new(IntentKind::Modify, "more nature").with_interests(["nature"]);

        let result = ModificationEngine::default()
            .apply(Some(&prior), &delta, &registry, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.plan, prior);
        assert!(result.patch.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_requery_leaves_plan_unchanged() {
        let prior = prior_plan();
        let delta = Intent::new(IntentKind::Modify, "more food").with_interests(["food"]);

        let result = ModificationEngine::default()
            .apply(Some(&prior), &delta, &ProviderRegistry::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.plan, prior);
        assert!(result.patch.is_empty());
    }

    #[tokio::test]
    async fn test_refill_never_reuses_records_shown_elsewhere() {
        let prior = prior_plan();
        let (registry, _) = registry(Category::Activities, vec!["Castle Tour", "Aquarium", "Museum"]);
        let delta = Intent::new(IntentKind::Modify, "more culture").with_interests(["culture"]);

        let result = ModificationEngine::default()
            .apply(Some(&prior), &delta, &registry, &CancellationToken::new())
            .await
            .unwrap();

        // Days 1 and 3 are culture days: 4 activity slots, 3 fresh records
        assert_eq!(result.plan.days[1], prior.days[1]);
        assert_eq!(result.plan.days[0].slots[0].display(), "Castle Tour");
        assert_eq!(result.plan.days[2].slots[0].display(), "Museum");
        assert!(result.plan.days[2].slots[1].is_placeholder());

        let ids = result.plan.used_record_ids();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[tokio::test]
    async fn test_modified_days_only_use_known_records() {
        let prior = prior_plan();
        let titles = ["Castle Tour", "Aquarium", "Museum"];
        let (registry, _) = registry(Category::Activities, titles.to_vec());
        let delta = Intent::new(IntentKind::Modify, "more culture").with_interests(["culture"]);

        let result = ModificationEngine::default()
            .apply(Some(&prior), &delta, &registry, &CancellationToken::new())
            .await
            .unwrap();

        let before = prior_dataset();
        let scoped = scoped_dataset(Category::Activities, &titles);
        for id in result.plan.used_record_ids() {
            assert!(
                before.contains_record(id) || scoped.contains_record(id),
                "{} comes from neither dataset",
                id
            );
        }
    }

    #[tokio::test]
    async fn test_hotel_change_refreshes_summary() {
        let prior = prior_plan();
        assert_eq!(prior.summary.hotels.len(), 2);
        let (registry, provider) = registry(Category::Hotels, vec!["Hotel Nikko", "Cross Hotel"]);
        let delta = Intent::new(IntentKind::Modify, "change hotel").with_focus([Category::Hotels]);

        let result = ModificationEngine::default()
            .apply(Some(&prior), &delta, &registry, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.plan.days, prior.days);
        let hotels: Vec<&str> = result.plan.summary.hotels.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(hotels, vec!["Hotel Nikko", "Cross Hotel"]);

        assert!(result.patch.changes.is_empty());
        assert_eq!(result.patch.summary.len(), 1);
        assert_eq!(result.patch.summary[0].category, Category::Hotels);
        assert_eq!(result.patch.summary[0].before, vec!["hotels:old:h1", "hotels:old:h2"]);
    }

    #[tokio::test]
    async fn test_scope_outside_layout_queries_nothing() {
        let planner = PlanBuilder::new(PlannerConfig {
            slots: vec![SlotSpec::new("evening", Category::Dining)],
            ..PlannerConfig::default()
        });
        let prior = planner.build(&prior_intent(), &prior_dataset()).unwrap();
        let engine = ModificationEngine::new(Scheduler::default(), planner);
        let (registry, provider) = registry(Category::Activities, vec!["Castle Tour"]);
        let delta = Intent::new(IntentKind::Modify, "more culture").with_interests(["culture"]);

        let result = engine
            .apply(Some(&prior), &delta, &registry, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.plan, prior);
        assert!(result.patch.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_flight_change_without_origin_queries_nothing() {
        let prior = prior_plan();
        assert!(prior.origin.is_none());
        let (registry, provider) = registry(Category::Flights, vec!["LH716"]);
        let delta = Intent::new(IntentKind::Modify, "change flight").with_focus([Category::Flights]);

        let result = ModificationEngine::default()
            .apply(Some(&prior), &delta, &registry, &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.patch.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

        let delta = delta.with_origin("Seoul");
        let result = ModificationEngine::default()
            .apply(Some(&prior), &delta, &registry, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.plan.summary.flights[0].title, "LH716");
        assert_eq!(result.patch.summary[0].category, Category::Flights);
    }
}
