//! Orchestrator - the request pipeline
//!
//! classify -> build graph -> schedule -> aggregate -> plan or modify ->
//! commit. One Orchestrator serves many concurrent sessions; only the
//! session store is shared between requests.

use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::aggregate::Aggregator;
use crate::classify::{IntentClassifier, SessionContext};
use crate::config::Config;
use crate::domain::{AggregatedDataset, Category, Intent, IntentKind, Plan, PlanPatch, Session};
use crate::error::{EngineError, EngineResult};
use crate::graph::TaskGraphBuilder;
use crate::modify::ModificationEngine;
use crate::planner::PlanBuilder;
use crate::provider::{ProviderRegistry, QueryParams, RecommendationProvider};
use crate::scheduler::Scheduler;
use crate::state::SessionStore;

/// Result of one request, handed to the response synthesizer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Outcome {
    Planned { intent: Intent, plan: Plan },
    Searched { intent: Intent, dataset: AggregatedDataset },
    Modified { intent: Intent, plan: Plan, patch: PlanPatch },
}

impl Outcome {
    pub fn intent(&self) -> &Intent {
        match self {
            Outcome::Planned { intent, .. } | Outcome::Searched { intent, .. } | Outcome::Modified { intent, .. } => {
                intent
            }
        }
    }

    /// The committed plan, for outcomes that produce one
    pub fn plan(&self) -> Option<&Plan> {
        match self {
            Outcome::Planned { plan, .. } | Outcome::Modified { plan, .. } => Some(plan),
            Outcome::Searched { .. } => None,
        }
    }
}

pub struct Orchestrator {
    classifier: Arc<dyn IntentClassifier>,
    registry: ProviderRegistry,
    builder: TaskGraphBuilder,
    scheduler: Scheduler,
    aggregator: Aggregator,
    planner: PlanBuilder,
    modifier: ModificationEngine,
    sessions: Arc<SessionStore>,
}

impl Orchestrator {
    /// Wire the pipeline
    ///
    /// A RecommendationProvider is registered for synthesis when the
    /// registry has none.
    pub fn new(
        scheduler: Scheduler,
        planner: PlanBuilder,
        classifier: Arc<dyn IntentClassifier>,
        mut registry: ProviderRegistry,
    ) -> Self {
        debug!(?registry, "Orchestrator::new: called");
        if !registry.has(Category::Synthesis) {
            debug!("Orchestrator::new: registering built-in recommendations");
            registry.register(Category::Synthesis, Arc::new(RecommendationProvider::new()));
        }

        Self {
            classifier,
            registry,
            builder: TaskGraphBuilder::new(),
            modifier: ModificationEngine::new(scheduler.clone(), planner.clone()),
            scheduler,
            aggregator: Aggregator::new(),
            planner,
            sessions: Arc::new(SessionStore::new()),
        }
    }

    pub fn from_config(config: &Config, classifier: Arc<dyn IntentClassifier>, registry: ProviderRegistry) -> Self {
        Self::new(
            Scheduler::new(config.scheduler.clone()),
            PlanBuilder::new(config.planner.clone()),
            classifier,
            registry,
        )
    }

    /// Share a session store with other orchestrators
    pub fn with_sessions(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Committed state of a session
    pub async fn session(&self, session_id: &str) -> EngineResult<Arc<Session>> {
        debug!(%session_id, "Orchestrator::session: called");
        Ok(self.sessions.get(session_id).await?)
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Classify free text in the session's context and execute it
    pub async fn handle(&self, session_id: &str, raw_text: &str, cancel: &CancellationToken) -> EngineResult<Outcome> {
        debug!(%session_id, %raw_text, "Orchestrator::handle: called");
        let last_intent = self.sessions.get(session_id).await.ok().map(|s| s.last_intent.clone());
        let context = SessionContext::new(last_intent);
        let intent = self.classifier.classify(raw_text, &context).await?;
        self.execute(session_id, intent, cancel).await
    }

    /// Execute a classified intent
    ///
    /// Plans and modifications are committed to the session; searches
    /// leave it untouched.
    pub async fn execute(&self, session_id: &str, intent: Intent, cancel: &CancellationToken) -> EngineResult<Outcome> {
        debug!(%session_id, kind = %intent.kind, "Orchestrator::execute: called");
        match intent.kind {
            IntentKind::NewPlan => {
                let plan = self.plan(&intent, cancel).await?;
                self.sessions.commit(session_id, intent.clone(), plan.clone()).await;
                info!(%session_id, days = plan.days.len(), "Plan committed");
                Ok(Outcome::Planned { intent, plan })
            }
            IntentKind::Search => {
                let dataset = self.search(&intent, cancel).await?;
                Ok(Outcome::Searched { intent, dataset })
            }
            IntentKind::Modify => {
                let prior = self.sessions.get(session_id).await.ok();
                let prior_plan = prior.as_ref().map(|s| &s.last_plan);
                let modification = self.modifier.apply(prior_plan, &intent, &self.registry, cancel).await?;

                let mut intent = intent;
                if intent.subject.is_none() {
                    intent.subject = modification.plan.subject.clone();
                }
                self.sessions
                    .commit(session_id, intent.clone(), modification.plan.clone())
                    .await;
                info!(%session_id, changes = modification.patch.changes.len(), "Modification committed");
                Ok(Outcome::Modified {
                    intent,
                    plan: modification.plan,
                    patch: modification.patch,
                })
            }
        }
    }

    /// Build a plan without committing it
    pub async fn plan(&self, intent: &Intent, cancel: &CancellationToken) -> EngineResult<Plan> {
        debug!(kind = %intent.kind, "Orchestrator::plan: called");
        if intent.kind != IntentKind::NewPlan {
            return Err(EngineError::UnsupportedIntentKind(intent.kind));
        }

        // Reject bad input before spending provider calls
        self.planner.parse_duration(intent.duration.as_deref())?;
        let dataset = self.gather(intent, cancel).await?;
        self.planner.build(intent, &dataset)
    }

    /// Run a search and return the ranked dataset
    pub async fn search(&self, intent: &Intent, cancel: &CancellationToken) -> EngineResult<AggregatedDataset> {
        debug!(kind = %intent.kind, "Orchestrator::search: called");
        self.gather(intent, cancel).await
    }

    async fn gather(&self, intent: &Intent, cancel: &CancellationToken) -> EngineResult<AggregatedDataset> {
        let graph = self.builder.build(intent)?;
        let query = QueryParams::from_intent(intent);
        let report = self.scheduler.run(&graph, &self.registry, &query, cancel).await;
        Ok(self.aggregator.aggregate(&report))
    }
}
