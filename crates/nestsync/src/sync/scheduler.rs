//! Batch scheduler: picks due collections and drives the engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use tracing::{error, info, warn};

use crate::detail_cache;
use crate::store;

use super::engine::{SyncEngine, SyncError};
use super::types::{CollectionSyncResult, SyncOptions, TickSummary};

/// Granularity of the inter-tick sleep, so shutdown is noticed promptly.
const SLEEP_SLICE: Duration = Duration::from_secs(1);

pub struct Scheduler {
    engine: Arc<SyncEngine>,
    options: SyncOptions,
    shutdown: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(engine: Arc<SyncEngine>, options: SyncOptions) -> Self {
        Self {
            engine,
            options,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between collections and between ticks. Hand this to a
    /// ctrl-c handler.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run one batch: sync up to `batch_size` due collections with bounded
    /// concurrency, then sweep stale cached details.
    pub async fn tick(&self) -> Result<TickSummary, SyncError> {
        let due = store::collections::find_due(self.engine.db(), self.options.batch_size).await?;

        let mut summary = TickSummary {
            attempted: due.len(),
            ..Default::default()
        };

        let results: Vec<_> = futures::stream::iter(due.into_iter().map(
            |(collection, preference)| {
                let engine = Arc::clone(&self.engine);
                let shutdown = Arc::clone(&self.shutdown);
                async move {
                    if shutdown.load(Ordering::SeqCst) {
                        return None;
                    }
                    Some((
                        collection.id,
                        engine.sync_collection(&collection, &preference).await,
                    ))
                }
            },
        ))
        .buffer_unordered(self.options.workers.max(1))
        .collect()
        .await;

        for result in results {
            match result {
                None => summary.skipped += 1,
                Some((_, Ok(CollectionSyncResult::Completed(_)))) => summary.completed += 1,
                Some((_, Ok(CollectionSyncResult::Skipped(_)))) => summary.skipped += 1,
                Some((collection_id, Err(err))) => {
                    summary.failed += 1;
                    warn!(%collection_id, error = %err, "collection sync failed in tick");
                }
            }
        }

        let max_age = chrono::Duration::from_std(self.options.detail_max_age).unwrap_or_else(
            |_| chrono::Duration::hours(detail_cache::DEFAULT_DETAIL_MAX_AGE_HOURS),
        );
        summary.details_swept =
            detail_cache::sweep_stale(self.engine.db(), Utc::now() - max_age).await?;

        Ok(summary)
    }

    /// Tick forever until the shutdown flag is set. A failed tick is
    /// logged and the loop keeps going; the next tick starts fresh.
    pub async fn run(&self) {
        info!(
            interval_secs = self.options.interval.as_secs(),
            batch_size = self.options.batch_size,
            workers = self.options.workers,
            "scheduler started"
        );

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.tick().await {
                Ok(summary) => info!(
                    attempted = summary.attempted,
                    completed = summary.completed,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    details_swept = summary.details_swept,
                    "tick finished"
                ),
                Err(err) => error!(error = %err, "tick failed"),
            }

            self.sleep_until_next_tick().await;
        }

        info!("scheduler stopped");
    }

    async fn sleep_until_next_tick(&self) {
        let mut remaining = self.options.interval;
        while !remaining.is_zero() && !self.shutdown.load(Ordering::SeqCst) {
            let slice = remaining.min(SLEEP_SLICE);
            tokio::time::sleep(slice).await;
            remaining -= slice;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use crate::entity::prelude::{CollectionModel, PreferenceModel};
    use crate::provider::types::{Listing, ListingProvider, ProviderCapabilities, SearchQuery};
    use crate::provider::{ProviderAdapter, ProviderError};

    struct FailingProvider;

    #[async_trait]
    impl ListingProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities::FULL
        }

        async fn search(&self, _query: &SearchQuery) -> crate::provider::Result<Vec<Listing>> {
            Err(ProviderError::Auth { status: 401 })
        }
    }

    fn engine(db: sea_orm::DatabaseConnection) -> Arc<SyncEngine> {
        Arc::new(SyncEngine::new(
            db,
            Arc::new(ProviderAdapter::new(Arc::new(FailingProvider))),
        ))
    }

    fn quick_options() -> SyncOptions {
        SyncOptions {
            interval: Duration::from_millis(10),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn tick_with_nothing_due_only_sweeps_the_cache() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<(CollectionModel, Option<PreferenceModel>)>::new()])
            .append_exec_results([MockExecResult {
                rows_affected: 3,
                last_insert_id: 0,
            }])
            .into_connection();

        let scheduler = Scheduler::new(engine(db), quick_options());
        let summary = scheduler.tick().await.expect("tick");

        assert_eq!(summary.attempted, 0);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.details_swept, 3);
    }

    #[tokio::test]
    async fn run_stops_once_shutdown_is_flagged() {
        // One empty tick, then the flag stops the loop during the sleep.
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<(CollectionModel, Option<PreferenceModel>)>::new()])
            .append_exec_results([MockExecResult {
                rows_affected: 0,
                last_insert_id: 0,
            }])
            .into_connection();

        let scheduler = Scheduler::new(engine(db), quick_options());
        let shutdown = scheduler.shutdown_handle();

        let run = async {
            shutdown.store(true, Ordering::SeqCst);
            scheduler.run().await;
        };
        tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("run must return after shutdown");
    }

    #[tokio::test]
    async fn shutdown_mid_tick_skips_remaining_collections() {
        // Shutdown already set: every due collection is skipped, none run.
        let collection = CollectionModel {
            id: uuid::Uuid::new_v4(),
            name: "due".to_string(),
            agent_id: None,
            visitor_email: None,
            visitor_name: None,
            share_token: None,
            status: crate::entity::prelude::CollectionStatus::Active,
            last_synced_at: None,
            created_at: Utc::now().fixed_offset(),
        };
        let preference = PreferenceModel {
            id: uuid::Uuid::new_v4(),
            collection_id: collection.id,
            cities: serde_json::json!(["Maplewood"]),
            townships: serde_json::json!([]),
            latitude: None,
            longitude: None,
            radius_miles: None,
            min_price: None,
            max_price: None,
            min_beds: None,
            max_beds: None,
            min_baths: None,
            max_baths: None,
            min_living_area: None,
            single_family: false,
            condo: false,
            townhouse: false,
            multi_family: false,
            apartment: false,
            lot_land: false,
            created_at: Utc::now().fixed_offset(),
            updated_at: None,
        };

        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![(collection, Some(preference))]])
            .append_exec_results([MockExecResult {
                rows_affected: 0,
                last_insert_id: 0,
            }])
            .into_connection();

        let scheduler = Scheduler::new(engine(db), quick_options());
        scheduler.shutdown_handle().store(true, Ordering::SeqCst);

        let summary = scheduler.tick().await.expect("tick");
        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.failed, 0);
    }
}
