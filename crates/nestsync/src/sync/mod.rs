//! Collection synchronization: scheduling, diffing, merging and the ledger.
//!
//! # Module structure
//!
//! - [`types`] - options, reports, constants
//! - [`diff`] - pure membership diff
//! - [`locks`] - per-collection in-flight locks
//! - [`ledger`] - `sync_runs` bookkeeping
//! - [`engine`] - per-collection sync pipeline
//! - [`scheduler`] - batch loop over due collections

pub mod diff;
pub mod engine;
pub mod ledger;
pub mod locks;
pub mod scheduler;
mod types;

pub use diff::{MembershipDiff, diff_memberships};
pub use engine::{SyncEngine, SyncError};
pub use ledger::RunStats;
pub use locks::{LockGuard, LockRegistry};
pub use scheduler::Scheduler;
pub use types::{
    CollectionSyncResult, DEFAULT_BATCH_SIZE, DEFAULT_SYNC_INTERVAL, DEFAULT_WORKER_COUNT,
    SkipReason, SyncOptions, SyncReport, TickSummary,
};
