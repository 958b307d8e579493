//! Collection queries used by the scheduler and the sync engine.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::NullOrdering;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::prelude::{
    Collection, CollectionActiveModel, CollectionColumn, CollectionModel, CollectionStatus,
    Preference, PreferenceColumn, PreferenceModel,
};

use super::errors::{Result, StoreError};

/// Select up to `batch_size` active collections that are due for sync,
/// together with their preferences.
///
/// Fairness order: oldest `last_synced_at` first, with never-synced
/// collections (NULL) ahead of everything, ties broken by collection id.
/// Collections without a preference row have nothing to query the provider
/// with; they are excluded in SQL, before the LIMIT, so they cannot sit at
/// the head of the fairness order and occupy batch slots forever.
pub async fn find_due(
    db: &DatabaseConnection,
    batch_size: u64,
) -> Result<Vec<(CollectionModel, PreferenceModel)>> {
    let rows = Collection::find()
        .find_also_related(Preference)
        .filter(CollectionColumn::Status.eq(CollectionStatus::Active))
        .filter(PreferenceColumn::Id.is_not_null())
        .order_by_with_nulls(CollectionColumn::LastSyncedAt, Order::Asc, NullOrdering::First)
        .order_by_asc(CollectionColumn::Id)
        .limit(batch_size)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(collection, preference)| preference.map(|p| (collection, p)))
        .collect())
}

/// Load one collection with its preferences, for a manual refresh.
///
/// # Errors
/// `CollectionNotFound` if the id is unknown, `MissingPreferences` if the
/// collection has no preference row.
pub async fn find_with_preferences(
    db: &DatabaseConnection,
    collection_id: Uuid,
) -> Result<(CollectionModel, PreferenceModel)> {
    let row = Collection::find_by_id(collection_id)
        .find_also_related(Preference)
        .one(db)
        .await?;

    match row {
        Some((collection, Some(preference))) => Ok((collection, preference)),
        Some((_, None)) => Err(StoreError::MissingPreferences { collection_id }),
        None => Err(StoreError::CollectionNotFound { collection_id }),
    }
}

/// Advance a collection's `last_synced_at` marker.
///
/// Called only by the sync ledger at run finalization, for success and
/// failure alike, so failing collections still rotate to the back of the
/// fairness order.
pub async fn set_last_synced(
    db: &DatabaseConnection,
    collection_id: Uuid,
    at: DateTime<Utc>,
) -> Result<()> {
    Collection::update_many()
        .set(CollectionActiveModel {
            last_synced_at: Set(Some(at.fixed_offset())),
            ..Default::default()
        })
        .filter(CollectionColumn::Id.eq(collection_id))
        .exec(db)
        .await?;

    Ok(())
}
