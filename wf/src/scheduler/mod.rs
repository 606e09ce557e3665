//! Concurrent scheduler
//!
//! Executes a TaskGraph wave by wave. Every node in a wave runs in its own
//! worker, bounded by a semaphore and a per-node timeout; failures are
//! recorded as degraded results and never abort siblings.

mod config;
mod core;
mod result;

pub use config::SchedulerConfig;
pub use core::Scheduler;
pub use result::{ScheduleReport, SchedulerStats, TaskResult, TaskStatus};
