//! End-to-end tests for the planning pipeline
//!
//! These drive the orchestrator with mock providers and check the plan-level
//! guarantees: day counts, failure isolation, modification scoping and
//! determinism.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use wayfarer::{
    AggregatedDataset, Aggregator, CancellationToken, Category, Config, EngineError, FixtureProvider, Intent,
    IntentKind, KeywordClassifier, Orchestrator, Outcome, Plan, PlanBuilder, Provider, ProviderError,
    ProviderRegistry, QueryParams, RawRecord, RecommendationProvider, Scheduler, SchedulerConfig, TaskGraphBuilder,
};

// =============================================================================
// Helpers
// =============================================================================

struct TimeoutProvider;

#[async_trait]
impl Provider for TimeoutProvider {
    fn name(&self) -> &str {
        "timeout"
    }

    async fn search(&self, _category: Category, _query: &QueryParams) -> Result<Vec<RawRecord>, ProviderError> {
        Err(ProviderError::Timeout(Duration::from_millis(10)))
    }
}

struct BrokenProvider;

#[async_trait]
impl Provider for BrokenProvider {
    fn name(&self) -> &str {
        "broken"
    }

    async fn search(&self, _category: Category, _query: &QueryParams) -> Result<Vec<RawRecord>, ProviderError> {
        Err(ProviderError::Api {
            status: 500,
            message: "upstream down".to_string(),
        })
    }
}

/// Returns a different batch of records on every call
struct RotatingProvider {
    label: &'static str,
    calls: AtomicUsize,
}

impl RotatingProvider {
    fn new(label: &'static str, first_batch: usize) -> Self {
        Self {
            label,
            calls: AtomicUsize::new(first_batch),
        }
    }
}

#[async_trait]
impl Provider for RotatingProvider {
    fn name(&self) -> &str {
        "rotating"
    }

    async fn search(&self, _category: Category, _query: &QueryParams) -> Result<Vec<RawRecord>, ProviderError> {
        let batch = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((1..=3)
            .map(|i| RawRecord::new(format!("Batch {} {} {}", batch, self.label, i)).with_relevance(1.0 / i as f64))
            .collect())
    }
}

/// Never answers; only cancellation or the node timeout ends it
struct HangingProvider;

#[async_trait]
impl Provider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn search(&self, _category: Category, _query: &QueryParams) -> Result<Vec<RawRecord>, ProviderError> {
        std::future::pending::<()>().await;
        Ok(Vec::new())
    }
}

fn numbered(prefix: &str, count: usize) -> Vec<RawRecord> {
    (1..=count)
        .map(|i| {
            RawRecord::new(format!("{} {}", prefix, i))
                .with_link(format!("https://example.com/{}/{}", prefix.to_lowercase(), i))
                .with_relevance(1.0 - i as f64 / 100.0)
        })
        .collect()
}

fn scenario_fixtures() -> FixtureProvider {
    FixtureProvider::new("fixtures")
        .with_records(Category::Activities, numbered("Activity", 5))
        .with_records(Category::Flights, numbered("Flight", 2))
        .with_records(Category::Hotels, numbered("Hotel", 3))
}

fn orchestrator_with(registry: ProviderRegistry, config: &Config) -> Orchestrator {
    let classifier = KeywordClassifier::new().expect("classifier rules compile");
    Orchestrator::from_config(config, Arc::new(classifier), registry)
}

fn registry_all(provider: Arc<dyn Provider>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register_all(Category::DATA, provider);
    registry
}

fn culture_food_intent(days: &str) -> Intent {
    Intent::new(IntentKind::NewPlan, "plan a trip to Tokyo from Seoul for culture and food")
        .with_subject("Tokyo")
        .with_origin("Seoul")
        .with_duration(days)
        .with_interests(["culture", "food"])
}

fn expect_plan(outcome: Outcome) -> Plan {
    match outcome {
        Outcome::Planned { plan, .. } => plan,
        other => panic!("expected a plan, got {:?}", other),
    }
}

// =============================================================================
// Plan construction
// =============================================================================

#[tokio::test]
async fn test_three_day_culture_food_plan() {
    let orch = orchestrator_with(registry_all(Arc::new(scenario_fixtures())), &Config::default());

    let plan = expect_plan(
        orch.execute("s1", culture_food_intent("3"), &CancellationToken::new())
            .await
            .expect("plan should build"),
    );

    assert_eq!(plan.days.len(), 3);
    let themes: Vec<&str> = plan.days.iter().map(|d| d.theme.as_str()).collect();
    assert_eq!(themes, vec!["culture", "food", "culture"]);

    // Activity slots take the ranked list in order, without reuse
    let activities: Vec<&str> = plan
        .days
        .iter()
        .flat_map(|d| d.slots.iter())
        .filter(|s| s.category == Category::Activities)
        .filter_map(|s| s.record.as_ref().map(|r| r.title.as_str()))
        .collect();
    assert_eq!(
        activities,
        vec!["Activity 1", "Activity 2", "Activity 3", "Activity 4", "Activity 5"]
    );

    let ids = plan.used_record_ids();
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len(), "no record may appear twice");

    // Flights and hotels live in the plan-wide summary, once
    assert_eq!(plan.summary.flights.len(), 2);
    assert_eq!(plan.summary.hotels.len(), 3);
    assert!(
        plan.days
            .iter()
            .flat_map(|d| d.slots.iter())
            .all(|s| s.category != Category::Flights && s.category != Category::Hotels)
    );

    // Six activity slots, five records: one placeholder; dining is empty
    assert_eq!(plan.placeholder_count(), 1 + 3);
}

#[tokio::test]
async fn test_all_providers_time_out() {
    let orch = orchestrator_with(registry_all(Arc::new(TimeoutProvider)), &Config::default());

    let plan = expect_plan(
        orch.execute("s1", culture_food_intent("4 days"), &CancellationToken::new())
            .await
            .expect("timeouts never escape the pipeline"),
    );

    assert_eq!(plan.days.len(), 4);
    for day in &plan.days {
        assert_eq!(day.slots.len(), Config::default().planner.slots.len());
        for slot in &day.slots {
            assert!(slot.is_placeholder());
            assert!(slot.display().contains("Tokyo"), "fallback names the subject: {}", slot.display());
        }
    }
    assert!(plan.summary.flights.is_empty());
    assert!(plan.summary.hotels.is_empty());
    assert!(
        plan.recommendations.iter().any(|r| r.contains("unavailable")),
        "degraded categories are called out: {:?}",
        plan.recommendations
    );
}

#[tokio::test]
async fn test_failing_category_is_isolated() {
    let baseline = orchestrator_with(registry_all(Arc::new(scenario_fixtures())), &Config::default());
    let baseline_plan = expect_plan(
        baseline
            .execute("s1", culture_food_intent("3"), &CancellationToken::new())
            .await
            .unwrap(),
    );

    let mut registry = ProviderRegistry::new();
    let fixtures: Arc<dyn Provider> = Arc::new(scenario_fixtures());
    registry.register_all(
        [Category::Hotels, Category::Activities, Category::Dining, Category::DestinationInfo],
        fixtures,
    );
    registry.register(Category::Flights, Arc::new(BrokenProvider));
    let degraded = orchestrator_with(registry, &Config::default());
    let degraded_plan = expect_plan(
        degraded
            .execute("s1", culture_food_intent("3"), &CancellationToken::new())
            .await
            .unwrap(),
    );

    assert_eq!(degraded_plan.days, baseline_plan.days);
    assert_eq!(degraded_plan.summary.hotels, baseline_plan.summary.hotels);
    assert!(degraded_plan.summary.flights.is_empty());
}

#[tokio::test]
async fn test_plans_are_deterministic() {
    let run = || async {
        let orch = orchestrator_with(registry_all(Arc::new(scenario_fixtures())), &Config::default());
        let plan = expect_plan(
            orch.execute("s1", culture_food_intent("5"), &CancellationToken::new())
                .await
                .unwrap(),
        );
        serde_json::to_string(&plan).unwrap()
    };

    let first = run().await;
    for _ in 0..5 {
        assert_eq!(run().await, first);
    }
}

#[tokio::test]
async fn test_cancellation_yields_placeholder_plan() {
    let config = Config {
        scheduler: SchedulerConfig {
            node_timeout_ms: 60_000,
            max_concurrent: 8,
        },
        ..Config::default()
    };
    let orch = Arc::new(orchestrator_with(registry_all(Arc::new(HangingProvider)), &config));
    let cancel = CancellationToken::new();

    let handle = {
        let orch = orch.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { orch.execute("s1", culture_food_intent("2"), &cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("cancellation should end the run promptly")
        .unwrap()
        .unwrap();
    let plan = expect_plan(outcome);
    assert_eq!(plan.days.len(), 2);
    assert_eq!(plan.placeholder_count(), 2 * 3);
}

/// Run the graph, scheduler and aggregator by hand to get a plan's dataset
async fn dataset_for(intent: &Intent, registry: &ProviderRegistry, config: &Config) -> AggregatedDataset {
    let graph = TaskGraphBuilder::new().build(intent).unwrap();
    let report = Scheduler::new(config.scheduler.clone())
        .run(&graph, registry, &QueryParams::from_intent(intent), &CancellationToken::new())
        .await;
    Aggregator::new().aggregate(&report)
}

#[tokio::test]
async fn test_plan_only_references_dataset_records() {
    let config = Config::default();
    let intent = culture_food_intent("3");
    let mut registry = registry_all(Arc::new(scenario_fixtures()));
    registry.register(Category::Synthesis, Arc::new(RecommendationProvider::new()));
    let dataset = dataset_for(&intent, &registry, &config).await;

    let orch = orchestrator_with(registry_all(Arc::new(scenario_fixtures())), &config);
    let plan = expect_plan(orch.execute("s1", intent.clone(), &CancellationToken::new()).await.unwrap());

    assert!(!plan.used_record_ids().is_empty());
    for id in plan.used_record_ids().into_iter().chain(plan.summary.record_ids()) {
        assert!(dataset.contains_record(id), "{} is not in the dataset", id);
    }
    assert_eq!(PlanBuilder::new(config.planner.clone()).build(&intent, &dataset).unwrap(), plan);
}

#[tokio::test]
async fn test_plan_without_origin_has_no_flights() {
    let orch = orchestrator_with(registry_all(Arc::new(scenario_fixtures())), &Config::default());

    let plan = expect_plan(
        orch.handle("s1", "plan a 2 day trip to Rome", &CancellationToken::new())
            .await
            .unwrap(),
    );
    assert!(plan.origin.is_none());
    assert!(plan.summary.flights.is_empty());
    assert_eq!(plan.summary.hotels.len(), 3);
}

#[tokio::test]
async fn test_huge_duration_is_rejected() {
    let orch = orchestrator_with(registry_all(Arc::new(scenario_fixtures())), &Config::default());

    let result = orch
        .handle("s1", "plan a 4000000000 day trip to Rome", &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(EngineError::InvalidDuration(_))), "got {:?}", result);
    assert!(orch.sessions().is_empty().await);
}

// =============================================================================
// Modification and sessions
// =============================================================================

#[tokio::test]
async fn test_modification_only_touches_food_days() {
    let mut registry = ProviderRegistry::new();
    let fixtures: Arc<dyn Provider> = Arc::new(
        FixtureProvider::new("fixtures").with_records(Category::Activities, numbered("Activity", 10)),
    );
    registry.register_all(
        [Category::Flights, Category::Hotels, Category::Activities, Category::DestinationInfo],
        fixtures,
    );
    registry.register(Category::Dining, Arc::new(RotatingProvider::new("Restaurant", 0)));
    let orch = orchestrator_with(registry, &Config::default());
    let cancel = CancellationToken::new();

    let before = expect_plan(
        orch.handle("s1", "plan a 3 day trip to Tokyo for culture and food", &cancel)
            .await
            .unwrap(),
    );
    assert_eq!(before.themes, vec!["culture".to_string(), "food".to_string()]);

    let outcome = orch.handle("s1", "add more food", &cancel).await.unwrap();
    let Outcome::Modified { plan: after, patch, .. } = outcome else {
        panic!("expected a modification");
    };

    assert_eq!(after.days[0], before.days[0]);
    assert_eq!(after.days[2], before.days[2]);
    assert_ne!(after.days[1], before.days[1]);
    assert_eq!(patch.days(), vec![2]);
    assert_eq!(after.days[1].slots[0], before.days[1].slots[0]);
    assert_eq!(after.days[1].slots[1], before.days[1].slots[1]);

    let evening = after.days[1].slots[2].record.as_ref().expect("evening refilled");
    assert_eq!(evening.title, "Batch 1 Restaurant 1");

    // Every record comes from the first plan's dataset or the scoped re-query
    let mut replay = ProviderRegistry::new();
    let fixtures: Arc<dyn Provider> = Arc::new(
        FixtureProvider::new("fixtures").with_records(Category::Activities, numbered("Activity", 10)),
    );
    replay.register_all(
        [Category::Flights, Category::Hotels, Category::Activities, Category::DestinationInfo],
        fixtures,
    );
    replay.register(Category::Dining, Arc::new(RotatingProvider::new("Restaurant", 0)));
    let first = Intent::new(IntentKind::NewPlan, "plan").with_subject("Tokyo");
    let before_dataset = dataset_for(&first, &replay, &Config::default()).await;
    let scoped_dataset = dataset_for(
        &Intent::new(IntentKind::Search, "find").with_focus([Category::Dining]),
        &replay,
        &Config::default(),
    )
    .await;
    for id in after.used_record_ids() {
        assert!(
            before_dataset.contains_record(id) || scoped_dataset.contains_record(id),
            "{} comes from neither dataset",
            id
        );
    }

    let session = orch.sessions().get("s1").await.unwrap();
    assert_eq!(session.last_plan, after);
    assert_eq!(session.last_intent.subject.as_deref(), Some("Tokyo"));
}

#[tokio::test]
async fn test_hotel_change_refreshes_summary() {
    let mut registry = ProviderRegistry::new();
    let fixtures: Arc<dyn Provider> = Arc::new(scenario_fixtures());
    registry.register_all(
        [Category::Flights, Category::Activities, Category::Dining, Category::DestinationInfo],
        fixtures,
    );
    registry.register(Category::Hotels, Arc::new(RotatingProvider::new("Hotel", 0)));
    let orch = orchestrator_with(registry, &Config::default());
    let cancel = CancellationToken::new();

    let before = expect_plan(orch.handle("s1", "plan a 2 day trip to Rome", &cancel).await.unwrap());
    assert_eq!(before.summary.hotels[0].title, "Batch 0 Hotel 1");

    let outcome = orch.handle("s1", "change hotel to something else", &cancel).await.unwrap();
    let Outcome::Modified { plan: after, patch, .. } = outcome else {
        panic!("expected a modification");
    };

    assert_eq!(after.days, before.days);
    let hotels: Vec<&str> = after.summary.hotels.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(hotels, vec!["Batch 1 Hotel 1", "Batch 1 Hotel 2", "Batch 1 Hotel 3"]);
    assert!(patch.changes.is_empty());
    assert_eq!(patch.summary.len(), 1);
    assert_eq!(patch.summary[0].category, Category::Hotels);
    assert_eq!(orch.sessions().get("s1").await.unwrap().last_plan, after);
}

#[tokio::test]
async fn test_modify_without_plan_leaves_store_unchanged() {
    let orch = orchestrator_with(registry_all(Arc::new(scenario_fixtures())), &Config::default());
    let cancel = CancellationToken::new();

    orch.handle("other", "plan a 2 day trip to Rome", &cancel).await.unwrap();
    let ids_before = orch.sessions().ids().await;

    let result = orch.handle("fresh", "add more food", &cancel).await;
    assert!(matches!(result, Err(EngineError::NoPriorPlan)), "got {:?}", result);

    assert_eq!(orch.sessions().ids().await, ids_before);
    assert!(orch.sessions().get("fresh").await.is_err());
}

#[tokio::test]
async fn test_concurrent_sessions_commit_independently() {
    let orch = Arc::new(orchestrator_with(
        registry_all(Arc::new(scenario_fixtures())),
        &Config::default(),
    ));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let orch = orch.clone();
            tokio::spawn(async move {
                let text = format!("plan a {} day trip to Lisbon", i + 1);
                orch.handle(&format!("session-{}", i), &text, &CancellationToken::new())
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(orch.sessions().len().await, 8);
    for i in 0..8u32 {
        let session = orch.sessions().get(&format!("session-{}", i)).await.unwrap();
        assert_eq!(session.last_plan.duration_days, i + 1);
        assert_eq!(session.last_plan.subject.as_deref(), Some("Lisbon"));
    }
}

#[tokio::test]
async fn test_search_returns_dataset_without_plan() {
    let orch = orchestrator_with(registry_all(Arc::new(scenario_fixtures())), &Config::default());

    let outcome = orch
        .handle("s1", "find hotels in Rome", &CancellationToken::new())
        .await
        .unwrap();
    let Outcome::Searched { dataset, .. } = outcome else {
        panic!("expected search results");
    };

    assert_eq!(dataset.get(Category::Hotels).len(), 3);
    assert!(dataset.get(Category::Flights).is_empty());
    assert!(orch.sessions().is_empty().await);
}
