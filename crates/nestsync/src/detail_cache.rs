//! Property detail cache operations.
//!
//! Full detail payloads are expensive provider calls, so they are cached on
//! the property row and refetched lazily. This module owns the two ways a
//! cached detail dies: targeted invalidation after a sync batch changed a
//! property's market state, and an age-based sweep.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use thiserror::Error;
use uuid::Uuid;

use crate::entity::prelude::{Property, PropertyActiveModel, PropertyColumn, PropertyModel};

/// How long a cached detail payload stays usable.
pub const DEFAULT_DETAIL_MAX_AGE_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// A cached detail payload and when it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedDetail {
    pub detail: serde_json::Value,
    pub cached_at: DateTime<Utc>,
}

/// Fetch the cached detail for a property, if any.
pub async fn get<C: ConnectionTrait>(db: &C, property_id: Uuid) -> Result<Option<CachedDetail>> {
    let row: Option<PropertyModel> = Property::find_by_id(property_id).one(db).await?;

    Ok(row.and_then(|p| match (p.detail, p.detail_cached_at) {
        (Some(detail), Some(cached_at)) => Some(CachedDetail {
            detail,
            cached_at: cached_at.to_utc(),
        }),
        _ => None,
    }))
}

/// Store a freshly fetched detail payload.
pub async fn store<C: ConnectionTrait>(
    db: &C,
    property_id: Uuid,
    detail: serde_json::Value,
    now: DateTime<Utc>,
) -> Result<()> {
    Property::update_many()
        .set(PropertyActiveModel {
            detail: Set(Some(detail)),
            detail_cached_at: Set(Some(now.fixed_offset())),
            ..Default::default()
        })
        .filter(PropertyColumn::Id.eq(property_id))
        .exec(db)
        .await?;

    Ok(())
}

/// Drop cached details for the given properties.
///
/// Called after a sync run for the properties whose membership state
/// changed in that batch; their cached payloads describe the old state.
/// Properties with no cached detail are left untouched.
pub async fn invalidate<C: ConnectionTrait>(db: &C, property_ids: &[Uuid]) -> Result<u64> {
    if property_ids.is_empty() {
        return Ok(0);
    }

    let result = Property::update_many()
        .set(PropertyActiveModel {
            detail: Set(None),
            detail_cached_at: Set(None),
            ..Default::default()
        })
        .filter(PropertyColumn::Id.is_in(property_ids.iter().copied()))
        .filter(PropertyColumn::DetailCachedAt.is_not_null())
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Drop every cached detail older than the cutoff. Returns how many rows
/// were cleared.
pub async fn sweep_stale<C: ConnectionTrait>(db: &C, cutoff: DateTime<Utc>) -> Result<u64> {
    let result = Property::update_many()
        .set(PropertyActiveModel {
            detail: Set(None),
            detail_cached_at: Set(None),
            ..Default::default()
        })
        .filter(PropertyColumn::DetailCachedAt.lt(cutoff.fixed_offset()))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use crate::entity::prelude::ListingStatus;

    fn property_with_detail(cached_at: Option<DateTime<Utc>>) -> PropertyModel {
        PropertyModel {
            id: Uuid::new_v4(),
            provider_id: 1,
            street_address: None,
            city: None,
            state: None,
            zipcode: None,
            price: None,
            beds: None,
            baths: None,
            living_area: None,
            home_type: None,
            listing_status: ListingStatus::ForSale,
            latitude: None,
            longitude: None,
            image_url: None,
            raw_attributes: serde_json::json!({}),
            detail: cached_at.map(|_| serde_json::json!({"zestimate": 1})),
            detail_cached_at: cached_at.map(|t| t.fixed_offset()),
            first_seen_at: Utc::now().fixed_offset(),
            synced_at: Utc::now().fixed_offset(),
        }
    }

    #[tokio::test]
    async fn get_returns_payload_with_timestamp() {
        let cached_at = Utc::now() - Duration::hours(1);
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![property_with_detail(Some(cached_at))]])
            .into_connection();

        let hit = get(&db, Uuid::new_v4()).await.expect("get");
        let hit = hit.expect("should be a cache hit");
        assert_eq!(hit.detail["zestimate"], serde_json::json!(1));
        assert_eq!(hit.cached_at.timestamp(), cached_at.timestamp());
    }

    #[tokio::test]
    async fn get_misses_when_no_detail_is_cached() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![property_with_detail(None)]])
            .into_connection();

        let hit = get(&db, Uuid::new_v4()).await.expect("get");
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn invalidate_short_circuits_on_empty_input() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let cleared = invalidate(&db, &[]).await.expect("invalidate");
        assert_eq!(cleared, 0);
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn invalidate_clears_detail_and_timestamp() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                rows_affected: 2,
                last_insert_id: 0,
            }])
            .into_connection();

        let cleared = invalidate(&db, &[Uuid::new_v4(), Uuid::new_v4()])
            .await
            .expect("invalidate");
        assert_eq!(cleared, 2);

        let sql = format!("{:?}", db.into_transaction_log());
        assert!(sql.contains("detail"));
        assert!(sql.contains("detail_cached_at"));
    }

    #[tokio::test]
    async fn sweep_uses_the_cutoff() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                rows_affected: 5,
                last_insert_id: 0,
            }])
            .into_connection();

        let cutoff = Utc::now() - Duration::hours(DEFAULT_DETAIL_MAX_AGE_HOURS);
        let cleared = sweep_stale(&db, cutoff).await.expect("sweep");
        assert_eq!(cleared, 5);

        let sql = format!("{:?}", db.into_transaction_log());
        assert!(sql.contains("detail_cached_at"));
        assert!(sql.contains("<"), "sweep must filter by age: {sql}");
    }
}
