//! Wayfarer - concurrent multi-source trip planner
//!
//! Wayfarer turns a free-form travel request into a structured,
//! incrementally editable day-by-day plan. Requests are classified into an
//! intent, expanded into a dependency graph of provider queries, executed
//! concurrently with per-node timeouts, merged into a ranked dataset and
//! assembled into a plan that later requests can edit in place.
//!
//! # Core Concepts
//!
//! - **Failure isolation**: a failed or slow provider degrades its own
//!   category to placeholders and never fails the request
//! - **Determinism**: identical intents and provider outputs produce
//!   byte-identical plans
//! - **Scoped edits**: a modification re-queries one category and touches
//!   only the days it targets
//!
//! # Modules
//!
//! - [`graph`] - Task graph and its builder
//! - [`scheduler`] - Wave-based concurrent executor
//! - [`aggregate`] - Dedup and ranking of provider records
//! - [`planner`] - Day-by-day plan assembly
//! - [`modify`] - Targeted plan edits
//! - [`state`] - Session store
//! - [`provider`] - Provider trait and implementations
//! - [`classify`] - Intent classification
//! - [`synth`] - Response rendering
//! - [`orchestrator`] - The request pipeline

pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod modify;
pub mod orchestrator;
pub mod planner;
pub mod provider;
pub mod repl;
pub mod scheduler;
pub mod state;
pub mod synth;

// Re-export commonly used types
pub use aggregate::Aggregator;
pub use classify::{ClassifyError, IntentClassifier, KeywordClassifier, SessionContext};
pub use config::{Config, PlannerConfig, SerpApiConfig, SlotSpec};
pub use domain::{
    AggregatedDataset, Budget, Category, Day, Intent, IntentKind, Plan, PlanPatch, PlanSummary, RankedRecord,
    RawRecord, Session, Slot, SlotChange, SourcedRecord, SummaryChange,
};
pub use error::{EngineError, EngineResult};
pub use graph::{GraphError, NodeId, TaskGraph, TaskGraphBuilder, TaskNode};
pub use modify::{Modification, ModificationEngine, Scope};
pub use orchestrator::{Orchestrator, Outcome};
pub use planner::PlanBuilder;
pub use provider::{
    FixtureProvider, Provider, ProviderError, ProviderRegistry, ProviderResolver, QueryParams, RecommendationProvider,
    SerpApiProvider, Upstream, registry_from_config,
};
pub use scheduler::{ScheduleReport, Scheduler, SchedulerConfig, SchedulerStats, TaskResult, TaskStatus};
pub use state::{SessionError, SessionStore};
pub use synth::{Synthesizer, TextSynthesizer};
pub use tokio_util::sync::CancellationToken;
