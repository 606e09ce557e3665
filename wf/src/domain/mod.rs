//! Domain types for the planning engine
//!
//! - Category: capability taxonomy shared by graph, scheduler and providers
//! - Intent: classified user request
//! - RawRecord / RankedRecord: provider output and dataset entries
//! - AggregatedDataset: per-category ranked records
//! - Plan: day-by-day result
//! - Session: last intent and plan per conversation

mod category;
mod dataset;
mod id;
mod intent;
mod plan;
mod record;
mod session;

pub use category::Category;
pub use dataset::AggregatedDataset;
pub use id::{generate_session_id, now_ms, record_id, slugify};
pub use intent::{Budget, DEFAULT_PARTY_SIZE, Intent, IntentKind};
pub use plan::{Day, Plan, PlanPatch, PlanSummary, Slot, SlotChange, SummaryChange};
pub use record::{RankedRecord, RawRecord, SourcedRecord};
pub use session::Session;
