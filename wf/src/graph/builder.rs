//! TaskGraphBuilder - turns an Intent into a TaskGraph
//!
//! Pure and deterministic: the same intent always yields the same node ids,
//! categories and edges.

use tracing::debug;

use super::{GraphError, TaskGraph, TaskNode};
use crate::domain::{Category, Intent, IntentKind};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Default, Clone)]
pub struct TaskGraphBuilder;

impl TaskGraphBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the full graph for a NewPlan or Search intent
    pub fn build(&self, intent: &Intent) -> EngineResult<TaskGraph> {
        debug!(kind = %intent.kind, "TaskGraphBuilder::build: called");
        match intent.kind {
            IntentKind::NewPlan => {
                debug!("TaskGraphBuilder::build: new plan branch");
                Ok(Self::assemble(&Self::plan_categories(intent), true)?)
            }
            IntentKind::Search => {
                debug!("TaskGraphBuilder::build: search branch");
                Ok(Self::assemble(&Self::search_categories(intent), false)?)
            }
            IntentKind::Modify => {
                debug!("TaskGraphBuilder::build: modify has no full graph");
                Err(EngineError::UnsupportedIntentKind(intent.kind))
            }
        }
    }

    /// Build a graph holding only data nodes for the given categories
    ///
    /// Used by the modification engine to re-query the affected scope.
    pub fn build_scoped(&self, intent: &Intent, categories: &[Category]) -> EngineResult<TaskGraph> {
        debug!(kind = %intent.kind, ?categories, "TaskGraphBuilder::build_scoped: called");
        let mut scoped: Vec<Category> = Vec::new();
        for category in categories.iter().copied().filter(Category::is_data) {
            if !scoped.contains(&category) {
                scoped.push(category);
            }
        }
        Ok(Self::assemble(&scoped, false)?)
    }

    /// Categories a new plan implies
    ///
    /// Flights need somewhere to fly from, so they are omitted without an
    /// origin rather than queried for nothing.
    fn plan_categories(intent: &Intent) -> Vec<Category> {
        Category::DATA
            .into_iter()
            .filter(|category| match category {
                Category::Flights => intent.origin.is_some(),
                _ => true,
            })
            .collect()
    }

    /// Categories a search intent implies
    fn search_categories(intent: &Intent) -> Vec<Category> {
        let focus: Vec<Category> = intent.focus.iter().copied().filter(Category::is_data).collect();
        if !focus.is_empty() {
            debug!(?focus, "TaskGraphBuilder::search_categories: explicit focus");
            return focus;
        }

        debug!("TaskGraphBuilder::search_categories: general search");
        let mut categories = vec![Category::Activities];
        if intent.has_interest("food") {
            categories.push(Category::Dining);
        }
        categories.push(Category::DestinationInfo);
        categories
    }

    /// Emit one node per category, plus a synthesis node depending on all
    fn assemble(categories: &[Category], with_synthesis: bool) -> Result<TaskGraph, GraphError> {
        let mut ordered = categories.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut nodes: Vec<TaskNode> = ordered
            .iter()
            .enumerate()
            .map(|(i, category)| TaskNode::new(format!("{:02}-{}", i, category), *category))
            .collect();

        if with_synthesis {
            let deps: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
            let id = format!("{:02}-{}", nodes.len(), Category::Synthesis);
            nodes.push(TaskNode::new(id, Category::Synthesis).depends_on(deps));
        }

        TaskGraph::new(nodes)
    }
}
