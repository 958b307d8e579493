//! Shared sync types and constants.

use std::time::Duration;

use uuid::Uuid;

use crate::provider::DEFAULT_PROVIDER_RPS;

/// How often the scheduler wakes up to look for due collections.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Collections picked up per tick.
pub const DEFAULT_BATCH_SIZE: u64 = 10;

/// Collections synced concurrently within a tick.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Options for the scheduler loop.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Pause between ticks.
    pub interval: Duration,
    /// Maximum collections per tick.
    pub batch_size: u64,
    /// Concurrent collection syncs; all workers share one provider
    /// rate-limit bucket.
    pub workers: usize,
    /// Provider request ceiling in requests per second.
    pub provider_rps: u32,
    /// Cached property detail older than this is swept each tick.
    pub detail_max_age: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SYNC_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKER_COUNT,
            provider_rps: DEFAULT_PROVIDER_RPS,
            detail_max_age: Duration::from_secs(
                crate::detail_cache::DEFAULT_DETAIL_MAX_AGE_HOURS as u64 * 3600,
            ),
        }
    }
}

/// What one collection sync committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub collection_id: Uuid,
    pub run_id: Uuid,
    pub added: u32,
    pub marked_unavailable: u32,
    pub reactivated: u32,
    pub total_active: u32,
    /// True when filters were dropped and the match set may be wider than
    /// the preferences asked for.
    pub degraded: bool,
}

/// Why a collection was passed over without a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Another sync of the same collection is still running.
    InFlight,
    /// The collection is no longer schedulable (inactive).
    NotSchedulable,
}

/// Per-collection result within a tick or manual refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionSyncResult {
    Completed(SyncReport),
    Skipped(SkipReason),
}

/// Aggregate of one scheduler tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickSummary {
    pub attempted: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Stale cached details cleared this tick.
    pub details_swept: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let options = SyncOptions::default();
        assert_eq!(options.interval, DEFAULT_SYNC_INTERVAL);
        assert_eq!(options.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(options.workers, DEFAULT_WORKER_COUNT);
        assert_eq!(options.provider_rps, DEFAULT_PROVIDER_RPS);
    }
}
