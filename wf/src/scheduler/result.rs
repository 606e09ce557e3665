//! Task results and run statistics

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{Category, SourcedRecord};
use crate::graph::NodeId;

/// Terminal status of a node execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Success,
    Failed,
    TimedOut,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
            TaskStatus::TimedOut => "timed-out",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one node, immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub node_id: NodeId,
    pub category: Category,
    pub status: TaskStatus,

    /// Records from every provider that succeeded, in provider order
    pub payload: Vec<SourcedRecord>,

    pub error_detail: Option<String>,
}

impl TaskResult {
    pub fn success(
        node_id: impl Into<NodeId>,
        category: Category,
        payload: Vec<SourcedRecord>,
        error_detail: Option<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            category,
            status: TaskStatus::Success,
            payload,
            error_detail,
        }
    }

    pub fn failed(node_id: impl Into<NodeId>, category: Category, detail: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            category,
            status: TaskStatus::Failed,
            payload: Vec::new(),
            error_detail: Some(detail.into()),
        }
    }

    pub fn timed_out(node_id: impl Into<NodeId>, category: Category, detail: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            category,
            status: TaskStatus::TimedOut,
            payload: Vec::new(),
            error_detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }
}

/// Counters for a single scheduler run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub waves: usize,
    pub elapsed_ms: u64,
}

impl SchedulerStats {
    pub(crate) fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Success => self.succeeded += 1,
            TaskStatus::Failed => self.failed += 1,
            TaskStatus::TimedOut => self.timed_out += 1,
        }
    }
}

/// Everything a scheduler run produced: one result per graph node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub results: BTreeMap<NodeId, TaskResult>,
    pub stats: SchedulerStats,
}

impl ScheduleReport {
    pub fn get(&self, node_id: &str) -> Option<&TaskResult> {
        self.results.get(node_id)
    }

    /// Results for one category, in node id order
    pub fn for_category(&self, category: Category) -> Vec<&TaskResult> {
        self.results.values().filter(|r| r.category == category).collect()
    }

    /// Results in node id order
    pub fn iter(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.values()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True when every node finished with Success
    pub fn all_succeeded(&self) -> bool {
        self.results.values().all(TaskResult::is_success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawRecord;

    #[test]
    fn test_constructors_set_status() {
        let ok = TaskResult::success(
            "00-flights",
            Category::Flights,
            vec![SourcedRecord::new("p", RawRecord::new("Flight"))],
            None,
        );
        assert!(ok.is_success());
        assert_eq!(ok.payload.len(), 1);

        let failed = TaskResult::failed("01-hotels", Category::Hotels, "boom");
        assert_eq!(failed.status, TaskStatus::Failed);
        assert!(failed.payload.is_empty());
        assert_eq!(failed.error_detail.as_deref(), Some("boom"));
    }

    #[test]
    fn test_report_for_category() {
        let mut report = ScheduleReport::default();
        report.results.insert(
            "00-flights".to_string(),
            TaskResult::timed_out("00-flights", Category::Flights, "slow"),
        );
        report.results.insert(
            "01-hotels".to_string(),
            TaskResult::success("01-hotels", Category::Hotels, vec![], None),
        );

        assert_eq!(report.for_category(Category::Flights).len(), 1);
        assert!(report.for_category(Category::Dining).is_empty());
        assert!(!report.all_succeeded());
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&TaskStatus::TimedOut).unwrap(), "\"timed-out\"");
        assert_eq!(TaskStatus::Success.to_string(), "success");
    }
}
