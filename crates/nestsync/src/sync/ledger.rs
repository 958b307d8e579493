//! The sync ledger: one `sync_runs` row per attempt.
//!
//! A run row is created before the provider is called and finalized exactly
//! once, whatever happens. Finalization also advances the collection's
//! `last_synced_at`, for failures too, so a collection that keeps failing
//! still rotates to the back of the fairness order instead of wedging the
//! batch.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::prelude::{
    SyncOutcome, SyncRun, SyncRunActiveModel, SyncRunColumn, SyncRunModel,
};
use crate::store::{self, Result};

/// How many recent runs the failure streak looks back over.
const STREAK_WINDOW: u64 = 20;

/// Counts committed by a finished merge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub added: u32,
    pub marked_unavailable: u32,
    pub reactivated: u32,
    pub total_active: u32,
}

/// Open a ledger row for a sync attempt.
pub async fn begin_run<C: ConnectionTrait>(
    db: &C,
    collection_id: Uuid,
    now: DateTime<Utc>,
) -> Result<SyncRunModel> {
    let model = SyncRunModel {
        id: Uuid::new_v4(),
        collection_id,
        started_at: now.fixed_offset(),
        finished_at: None,
        outcome: SyncOutcome::Running,
        added: 0,
        marked_unavailable: 0,
        reactivated: 0,
        total_active: 0,
        error: None,
    };

    SyncRun::insert(SyncRunActiveModel {
        id: Set(model.id),
        collection_id: Set(model.collection_id),
        started_at: Set(model.started_at),
        finished_at: Set(None),
        outcome: Set(SyncOutcome::Running),
        added: Set(0),
        marked_unavailable: Set(0),
        reactivated: Set(0),
        total_active: Set(0),
        error: Set(None),
    })
    .exec(db)
    .await?;

    Ok(model)
}

/// Close a ledger row and advance the collection's sync marker.
pub async fn finalize_run(
    db: &DatabaseConnection,
    run: &SyncRunModel,
    outcome: SyncOutcome,
    stats: RunStats,
    error: Option<String>,
    now: DateTime<Utc>,
) -> Result<SyncRunModel> {
    SyncRun::update_many()
        .set(SyncRunActiveModel {
            finished_at: Set(Some(now.fixed_offset())),
            outcome: Set(outcome.clone()),
            added: Set(stats.added as i32),
            marked_unavailable: Set(stats.marked_unavailable as i32),
            reactivated: Set(stats.reactivated as i32),
            total_active: Set(stats.total_active as i32),
            error: Set(error.clone()),
            ..Default::default()
        })
        .filter(SyncRunColumn::Id.eq(run.id))
        .exec(db)
        .await?;

    store::collections::set_last_synced(db, run.collection_id, now).await?;

    Ok(SyncRunModel {
        finished_at: Some(now.fixed_offset()),
        outcome,
        added: stats.added as i32,
        marked_unavailable: stats.marked_unavailable as i32,
        reactivated: stats.reactivated as i32,
        total_active: stats.total_active as i32,
        error,
        ..run.clone()
    })
}

/// Consecutive failed runs, newest first, within a bounded window.
///
/// Used for operator logging when a collection keeps failing.
pub async fn failure_streak(db: &DatabaseConnection, collection_id: Uuid) -> Result<u32> {
    let recent = SyncRun::find()
        .filter(SyncRunColumn::CollectionId.eq(collection_id))
        .filter(SyncRunColumn::Outcome.ne(SyncOutcome::Running))
        .order_by_desc(SyncRunColumn::StartedAt)
        .limit(STREAK_WINDOW)
        .all(db)
        .await?;

    let mut streak = 0;
    for run in recent {
        if run.outcome == SyncOutcome::Failed {
            streak += 1;
        } else {
            break;
        }
    }
    Ok(streak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn run_row(collection_id: Uuid, outcome: SyncOutcome) -> SyncRunModel {
        SyncRunModel {
            id: Uuid::new_v4(),
            collection_id,
            started_at: Utc::now().fixed_offset(),
            finished_at: Some(Utc::now().fixed_offset()),
            outcome,
            added: 0,
            marked_unavailable: 0,
            reactivated: 0,
            total_active: 0,
            error: None,
        }
    }

    #[tokio::test]
    async fn begin_run_inserts_a_running_row() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                rows_affected: 1,
                last_insert_id: 0,
            }])
            .into_connection();

        let collection_id = Uuid::new_v4();
        let run = begin_run(&db, collection_id, Utc::now())
            .await
            .expect("begin");
        assert_eq!(run.collection_id, collection_id);
        assert_eq!(run.outcome, SyncOutcome::Running);
        assert!(run.finished_at.is_none());

        let sql = format!("{:?}", db.into_transaction_log());
        assert!(sql.contains("running"));
    }

    #[tokio::test]
    async fn finalize_advances_last_synced_even_on_failure() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([
                MockExecResult {
                    rows_affected: 1,
                    last_insert_id: 0,
                },
                MockExecResult {
                    rows_affected: 1,
                    last_insert_id: 0,
                },
            ])
            .into_connection();

        let open = run_row(Uuid::new_v4(), SyncOutcome::Running);
        let finalized = finalize_run(
            &db,
            &open,
            SyncOutcome::Failed,
            RunStats::default(),
            Some("provider timed out".to_string()),
            Utc::now(),
        )
        .await
        .expect("finalize");

        assert_eq!(finalized.outcome, SyncOutcome::Failed);
        assert_eq!(finalized.error.as_deref(), Some("provider timed out"));

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 2, "run update plus last_synced update");
        let sql = format!("{:?}", log);
        assert!(sql.contains("failed"));
        assert!(sql.contains("last_synced_at"));
    }

    #[tokio::test]
    async fn finalize_records_committed_counts() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([
                MockExecResult {
                    rows_affected: 1,
                    last_insert_id: 0,
                },
                MockExecResult {
                    rows_affected: 1,
                    last_insert_id: 0,
                },
            ])
            .into_connection();

        let open = run_row(Uuid::new_v4(), SyncOutcome::Running);
        let stats = RunStats {
            added: 3,
            marked_unavailable: 1,
            reactivated: 2,
            total_active: 9,
        };
        let finalized = finalize_run(&db, &open, SyncOutcome::Success, stats, None, Utc::now())
            .await
            .expect("finalize");

        assert_eq!(finalized.added, 3);
        assert_eq!(finalized.marked_unavailable, 1);
        assert_eq!(finalized.reactivated, 2);
        assert_eq!(finalized.total_active, 9);
        assert!(finalized.changed_membership());
    }

    #[tokio::test]
    async fn failure_streak_stops_at_first_non_failure() {
        let collection_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![
                run_row(collection_id, SyncOutcome::Failed),
                run_row(collection_id, SyncOutcome::Failed),
                run_row(collection_id, SyncOutcome::Success),
                run_row(collection_id, SyncOutcome::Failed),
            ]])
            .into_connection();

        let streak = failure_streak(&db, collection_id).await.expect("streak");
        assert_eq!(streak, 2);
    }

    #[tokio::test]
    async fn failure_streak_is_zero_after_a_success() {
        let collection_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![
                run_row(collection_id, SyncOutcome::Success),
                run_row(collection_id, SyncOutcome::Failed),
            ]])
            .into_connection();

        let streak = failure_streak(&db, collection_id).await.expect("streak");
        assert_eq!(streak, 0);
    }
}
