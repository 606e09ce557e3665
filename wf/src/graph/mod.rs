//! Task graph
//!
//! A TaskGraph is an immutable DAG of TaskNodes built fresh for each
//! request. Construction rejects unknown dependencies and cycles.

mod builder;

pub use builder::TaskGraphBuilder;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

use crate::domain::Category;

/// Node identifier, unique within one graph
pub type NodeId = String;

/// Errors from graph construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Dependency cycle: {}", .0.join(" -> "))]
    Cycle(Vec<NodeId>),

    #[error("Node {node} depends on unknown node {dependency}")]
    UnknownDependency { node: NodeId, dependency: NodeId },

    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),
}

/// A unit of work: fetch (or synthesize) one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: NodeId,
    pub category: Category,
    pub dependencies: BTreeSet<NodeId>,
    /// Registry key the scheduler resolves providers by
    pub provider_ref: String,
}

impl TaskNode {
    /// Node with no dependencies
    pub fn new(id: impl Into<NodeId>, category: Category) -> Self {
        Self {
            id: id.into(),
            category,
            dependencies: BTreeSet::new(),
            provider_ref: category.as_str().to_string(),
        }
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn is_root(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// Ordered, validated DAG of task nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskGraph {
    nodes: Vec<TaskNode>,
    roots: Vec<NodeId>,
}

impl TaskGraph {
    /// Build a graph, validating ids, dependencies and acyclicity
    pub fn new(nodes: Vec<TaskNode>) -> Result<Self, GraphError> {
        debug!(node_count = nodes.len(), "TaskGraph::new: called");
        let mut seen = HashSet::new();
        for node in &nodes {
            if !seen.insert(node.id.as_str()) {
                debug!(id = %node.id, "TaskGraph::new: duplicate id");
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        for node in &nodes {
            if let Some(dep) = node.dependencies.iter().find(|d| !seen.contains(d.as_str())) {
                debug!(id = %node.id, %dep, "TaskGraph::new: unknown dependency");
                return Err(GraphError::UnknownDependency {
                    node: node.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }

        validate_acyclic(&nodes)?;

        let roots = nodes.iter().filter(|n| n.is_root()).map(|n| n.id.clone()).collect();
        Ok(Self { nodes, roots })
    }

    pub fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    /// Ids of nodes with no dependencies
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: &str) -> Option<&TaskNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Categories covered by the graph, in node order
    pub fn categories(&self) -> Vec<Category> {
        self.nodes.iter().map(|n| n.category).collect()
    }

    /// Partition nodes into waves by dependency depth
    ///
    /// Wave 0 holds the roots; a node sits one wave after its deepest
    /// dependency. Within a wave, nodes keep graph order.
    pub fn waves(&self) -> Vec<Vec<&TaskNode>> {
        debug!(node_count = self.nodes.len(), "TaskGraph::waves: called");
        let mut depth: HashMap<&str, usize> = HashMap::new();

        // Construction guarantees acyclicity, so repeated passes settle
        while depth.len() < self.nodes.len() {
            for node in &self.nodes {
                if depth.contains_key(node.id.as_str()) {
                    continue;
                }
                let dep_depths: Option<Vec<usize>> = node
                    .dependencies
                    .iter()
                    .map(|d| depth.get(d.as_str()).copied())
                    .collect();
                if let Some(dep_depths) = dep_depths {
                    let d = dep_depths.into_iter().max().map(|m| m + 1).unwrap_or(0);
                    depth.insert(node.id.as_str(), d);
                }
            }
        }

        let wave_count = depth.values().max().map(|m| m + 1).unwrap_or(0);
        let mut waves: Vec<Vec<&TaskNode>> = vec![Vec::new(); wave_count];
        for node in &self.nodes {
            waves[depth[node.id.as_str()]].push(node);
        }
        waves
    }
}

/// Validate that the nodes form a DAG
///
/// Uses DFS with a recursion stack. Returns the cycle path if one is found.
fn validate_acyclic(nodes: &[TaskNode]) -> Result<(), GraphError> {
    let node_map: HashMap<&str, &TaskNode> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut cycle_path = Vec::new();

    for node in nodes {
        if !visited.contains(node.id.as_str())
            && has_cycle_dfs(&node.id, &node_map, &mut visited, &mut rec_stack, &mut cycle_path)
        {
            debug!(?cycle_path, "validate_acyclic: cycle found");
            return Err(GraphError::Cycle(cycle_path));
        }
    }

    Ok(())
}

/// DFS helper for cycle detection
fn has_cycle_dfs<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, &'a TaskNode>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    cycle_path: &mut Vec<NodeId>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    cycle_path.push(node.to_string());

    if let Some(task) = graph.get(node) {
        for dep_id in &task.dependencies {
            if !visited.contains(dep_id.as_str()) {
                if graph.contains_key(dep_id.as_str())
                    && has_cycle_dfs(dep_id.as_str(), graph, visited, rec_stack, cycle_path)
                {
                    return true;
                }
            } else if rec_stack.contains(dep_id.as_str()) {
                cycle_path.push(dep_id.clone());
                return true;
            }
        }
    }

    rec_stack.remove(node);
    cycle_path.pop();
    false
}
