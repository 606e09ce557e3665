//! Scheduler implementation

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::SchedulerConfig;
use super::result::{ScheduleReport, SchedulerStats, TaskResult, TaskStatus};
use crate::domain::{Category, SourcedRecord};
use crate::graph::{NodeId, TaskGraph, TaskNode};
use crate::provider::{Provider, ProviderResolver, QueryParams, Upstream};

/// A node that has been handed to a worker
struct Dispatched {
    node_id: NodeId,
    category: Category,
    handle: JoinHandle<TaskResult>,
}

/// The Scheduler runs a task graph wave by wave with bounded parallelism,
/// per-node timeouts and caller-driven cancellation.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a new scheduler with the given configuration
    pub fn new(config: SchedulerConfig) -> Self {
        debug!(?config, "Scheduler::new: called");
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Execute every node in the graph
    ///
    /// Returns exactly one terminal result per node. A dependency's failure
    /// does not block its dependents; they see it through
    /// `QueryParams::upstream`. Cancelling `cancel` resolves in-flight nodes
    /// as TimedOut and skips dispatch for the remaining waves.
    pub async fn run(
        &self,
        graph: &TaskGraph,
        resolver: &dyn ProviderResolver,
        query: &QueryParams,
        cancel: &CancellationToken,
    ) -> ScheduleReport {
        debug!(node_count = graph.len(), "Scheduler::run: called");
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.permits()));
        let mut results: BTreeMap<NodeId, TaskResult> = BTreeMap::new();
        let mut stats = SchedulerStats::default();

        let waves = graph.waves();
        stats.waves = waves.len();

        for (wave_index, wave) in waves.into_iter().enumerate() {
            if cancel.is_cancelled() {
                debug!(wave_index, "Scheduler::run: cancelled, skipping wave");
                for node in wave {
                    let result = TaskResult::timed_out(&node.id, node.category, "cancelled before dispatch");
                    stats.record(result.status);
                    results.insert(node.id.clone(), result);
                }
                continue;
            }

            debug!(wave_index, wave_size = wave.len(), "Scheduler::run: dispatching wave");
            let mut dispatched = Vec::with_capacity(wave.len());
            for node in wave {
                let upstream = upstream_for(node, &results);
                let node_query = query.with_upstream(upstream);
                dispatched.push(self.dispatch(node, resolver, node_query, semaphore.clone(), cancel.clone()));
                stats.dispatched += 1;
            }

            for Dispatched {
                node_id,
                category,
                handle,
            } in dispatched
            {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(%node_id, error = %e, "Scheduler::run: worker panicked");
                        TaskResult::failed(&node_id, category, format!("worker panicked: {}", e))
                    }
                };
                if !result.is_success() {
                    warn!(%node_id, status = %result.status, detail = ?result.error_detail, "Node did not succeed");
                }
                stats.record(result.status);
                results.insert(node_id, result);
            }
        }

        stats.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            nodes = results.len(),
            succeeded = stats.succeeded,
            failed = stats.failed,
            timed_out = stats.timed_out,
            elapsed_ms = stats.elapsed_ms,
            "Schedule complete"
        );

        ScheduleReport { results, stats }
    }

    /// Spawn a worker for one node
    fn dispatch(
        &self,
        node: &TaskNode,
        resolver: &dyn ProviderResolver,
        query: QueryParams,
        semaphore: Arc<Semaphore>,
        cancel: CancellationToken,
    ) -> Dispatched {
        debug!(id = %node.id, provider_ref = %node.provider_ref, "Scheduler::dispatch: called");
        let providers = resolver.resolve(node.category);
        let node_id = node.id.clone();
        let category = node.category;
        let timeout = self.config.node_timeout();

        let worker_id = node_id.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(id = %worker_id, "Scheduler::dispatch: cancelled in flight");
                    TaskResult::timed_out(worker_id, category, "cancelled")
                }
                result = run_bounded(worker_id.clone(), category, providers, query, semaphore, timeout) => result,
            }
        });

        Dispatched {
            node_id,
            category,
            handle,
        }
    }
}

/// Summaries of a node's dependency results
fn upstream_for(node: &TaskNode, results: &BTreeMap<NodeId, TaskResult>) -> Vec<Upstream> {
    node.dependencies
        .iter()
        .filter_map(|dep| results.get(dep))
        .map(|r| Upstream {
            category: r.category,
            status: r.status,
            records: r.payload.len(),
        })
        .collect()
}

/// Wait for a permit, then execute the node under its timeout
async fn run_bounded(
    node_id: NodeId,
    category: Category,
    providers: Vec<Arc<dyn Provider>>,
    query: QueryParams,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
) -> TaskResult {
    let _permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => return TaskResult::failed(node_id, category, format!("scheduler closed: {}", e)),
    };

    match tokio::time::timeout(timeout, execute_node(&node_id, category, &providers, &query)).await {
        Ok(result) => result,
        Err(_) => {
            debug!(id = %node_id, ?timeout, "run_bounded: node timed out");
            TaskResult::timed_out(node_id, category, format!("timed out after {}ms", timeout.as_millis()))
        }
    }
}

/// Fan out to every provider of the category and merge their outcomes
///
/// Payloads keep provider order regardless of completion order.
async fn execute_node(
    node_id: &str,
    category: Category,
    providers: &[Arc<dyn Provider>],
    query: &QueryParams,
) -> TaskResult {
    debug!(%node_id, %category, provider_count = providers.len(), "execute_node: called");
    if providers.is_empty() {
        debug!(%node_id, "execute_node: no providers");
        return TaskResult::failed(node_id, category, format!("no provider registered for {}", category));
    }

    let outcomes = join_all(providers.iter().map(|p| async move { (p.name(), p.search(category, query).await) })).await;

    let mut payload = Vec::new();
    let mut errors = Vec::new();
    let mut timeouts = 0usize;
    for (name, outcome) in outcomes {
        match outcome {
            Ok(records) => {
                debug!(%node_id, provider = name, count = records.len(), "execute_node: provider succeeded");
                payload.extend(records.into_iter().map(|r| SourcedRecord::new(name, r)));
            }
            Err(e) => {
                debug!(%node_id, provider = name, error = %e, "execute_node: provider failed");
                if e.is_timeout() {
                    timeouts += 1;
                }
                errors.push(format!("{}: {}", name, e));
            }
        }
    }

    let detail = (!errors.is_empty()).then(|| errors.join("; "));
    match detail {
        Some(detail) if errors.len() == providers.len() => {
            if timeouts == providers.len() {
                TaskResult::timed_out(node_id, category, detail)
            } else {
                TaskResult::failed(node_id, category, detail)
            }
        }
        detail => TaskResult {
            node_id: node_id.to_string(),
            category,
            status: TaskStatus::Success,
            payload,
            error_detail: detail,
        },
    }
}
