//! Collection sync engine: fetch, diff, merge, invalidate, notify, record.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::detail_cache::{self, CacheError};
use crate::entity::prelude::{
    CollectionModel, MembershipStatus, PreferenceModel, SyncOutcome, SyncRunModel,
};
use crate::notify::{LogSink, NotificationSink, intents_for_run};
use crate::provider::{FetchOutcome, ProviderAdapter, ProviderError};
use crate::store::{self, StoreError};

use super::diff::{MembershipDiff, diff_memberships};
use super::ledger::{self, RunStats};
use super::locks::LockRegistry;
use super::types::{CollectionSyncResult, SkipReason, SyncReport};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("provider fetch failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Syncs one collection at a time against the provider adapter.
///
/// The engine is shared: the scheduler drives it for due batches and the
/// manual refresh path calls [`SyncEngine::sync_by_id`] directly. Both go
/// through the same per-collection lock, so a manual refresh racing the
/// scheduler skips instead of double-syncing.
pub struct SyncEngine {
    db: DatabaseConnection,
    adapter: Arc<ProviderAdapter>,
    locks: LockRegistry,
    sink: Arc<dyn NotificationSink>,
}

impl SyncEngine {
    pub fn new(db: DatabaseConnection, adapter: Arc<ProviderAdapter>) -> Self {
        Self {
            db,
            adapter,
            locks: LockRegistry::new(),
            sink: Arc::new(LogSink),
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    /// Manual refresh entry point: load the collection and sync it now.
    pub async fn sync_by_id(&self, collection_id: Uuid) -> Result<CollectionSyncResult, SyncError> {
        let (collection, preference) =
            store::collections::find_with_preferences(&self.db, collection_id).await?;
        self.sync_collection(&collection, &preference).await
    }

    /// Sync one collection end to end.
    ///
    /// The membership merge commits in a single transaction, then the run
    /// is finalized and notifications are derived from the committed row.
    /// Failed fetches finalize the run as failed and leave memberships
    /// untouched.
    pub async fn sync_collection(
        &self,
        collection: &CollectionModel,
        preference: &PreferenceModel,
    ) -> Result<CollectionSyncResult, SyncError> {
        if !collection.is_schedulable() {
            return Ok(CollectionSyncResult::Skipped(SkipReason::NotSchedulable));
        }

        let Some(_guard) = self.locks.try_acquire(collection.id) else {
            info!(collection_id = %collection.id, "sync already in flight, skipping");
            return Ok(CollectionSyncResult::Skipped(SkipReason::InFlight));
        };

        let run = ledger::begin_run(&self.db, collection.id, Utc::now()).await?;

        let fetched = match self.adapter.fetch(preference).await {
            Ok(outcome) => outcome,
            Err(err) => return self.fail_run(collection, &run, err.into()).await,
        };

        let (diff, members, total_active) = match self.apply_merge(collection.id, &fetched).await {
            Ok(merged) => merged,
            Err(err) => return self.fail_run(collection, &run, err).await,
        };

        // Every member of a synced collection may carry cached detail that
        // predates the merge; drop it all and let reads refetch lazily.
        if let Err(err) = detail_cache::invalidate(&self.db, &members).await {
            return self.fail_run(collection, &run, err.into()).await;
        }

        let outcome = if fetched.quality.is_degraded() {
            SyncOutcome::Partial
        } else {
            SyncOutcome::Success
        };
        let stats = RunStats {
            added: diff.additions.len() as u32,
            marked_unavailable: diff.unavailable.len() as u32,
            reactivated: diff.reactivations.len() as u32,
            total_active: total_active as u32,
        };
        let finalized =
            ledger::finalize_run(&self.db, &run, outcome, stats, None, Utc::now()).await?;

        for intent in intents_for_run(collection, &finalized, &diff.unavailable) {
            if let Err(err) = self.sink.deliver(&intent).await {
                warn!(
                    collection_id = %collection.id,
                    key = %intent.intent_key(),
                    error = %err,
                    "notification delivery failed"
                );
            }
        }

        info!(
            collection_id = %collection.id,
            added = stats.added,
            unavailable = stats.marked_unavailable,
            reactivated = stats.reactivated,
            total_active = stats.total_active,
            outcome = %finalized.outcome,
            "collection synced"
        );

        Ok(CollectionSyncResult::Completed(SyncReport {
            collection_id: collection.id,
            run_id: finalized.id,
            added: stats.added,
            marked_unavailable: stats.marked_unavailable,
            reactivated: stats.reactivated,
            total_active: stats.total_active,
            degraded: fetched.quality.is_degraded(),
        }))
    }

    /// Apply the membership merge for a fetch result in one transaction.
    ///
    /// Returns the committed diff, the property ids of every member of the
    /// collection after the merge, and the active count.
    async fn apply_merge(
        &self,
        collection_id: Uuid,
        fetched: &FetchOutcome,
    ) -> Result<(MembershipDiff, Vec<Uuid>, u64), SyncError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let mut fetched_ids = Vec::with_capacity(fetched.listings.len());
        for listing in &fetched.listings {
            fetched_ids.push(store::properties::upsert_from_listing(&txn, listing, now).await?);
        }

        let existing = store::memberships::find_by_collection(&txn, collection_id).await?;
        let diff = diff_memberships(&existing, &fetched_ids);

        let members: Vec<Uuid> = existing
            .iter()
            .map(|m| m.property_id)
            .chain(diff.additions.iter().copied())
            .collect();

        for property_id in &diff.additions {
            store::memberships::insert_auto(&txn, collection_id, *property_id, now).await?;
        }
        store::memberships::set_status(
            &txn,
            collection_id,
            &diff.unavailable,
            MembershipStatus::Unavailable,
        )
        .await?;
        store::memberships::set_status(
            &txn,
            collection_id,
            &diff.reactivations,
            MembershipStatus::Active,
        )
        .await?;

        let total_active = store::memberships::count_active(&txn, collection_id).await?;
        txn.commit().await?;

        Ok((diff, members, total_active))
    }

    /// Finalize a run as failed and surface the original error.
    async fn fail_run(
        &self,
        collection: &CollectionModel,
        run: &SyncRunModel,
        err: SyncError,
    ) -> Result<CollectionSyncResult, SyncError> {
        ledger::finalize_run(
            &self.db,
            run,
            SyncOutcome::Failed,
            RunStats::default(),
            Some(err.to_string()),
            Utc::now(),
        )
        .await?;

        let streak = ledger::failure_streak(&self.db, collection.id).await?;
        warn!(
            collection_id = %collection.id,
            failure_streak = streak,
            error = %err,
            "collection sync failed"
        );

        Err(err)
    }
}
