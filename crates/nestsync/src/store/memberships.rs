//! Membership queries and the status-only writes the sync engine is allowed.
//!
//! Sync writes here are deliberately narrow: inserts of auto-sourced rows
//! and updates that set the `status` column alone. Interaction fields and
//! `removed_by_agent` are owned by the visitor/agent paths and are never
//! listed in any update built by this module.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::prelude::{
    Membership, MembershipActiveModel, MembershipColumn, MembershipModel, MembershipSource,
    MembershipStatus,
};

use super::errors::Result;

/// Load all membership rows for one collection, including agent-removed and
/// unavailable rows. The diff engine needs the full picture.
pub async fn find_by_collection<C: ConnectionTrait>(
    db: &C,
    collection_id: Uuid,
) -> Result<Vec<MembershipModel>> {
    Ok(Membership::find()
        .filter(MembershipColumn::CollectionId.eq(collection_id))
        .all(db)
        .await?)
}

/// Insert an auto-sourced membership row for a newly matched property.
pub async fn insert_auto<C: ConnectionTrait>(
    db: &C,
    collection_id: Uuid,
    property_id: Uuid,
    added_at: DateTime<Utc>,
) -> Result<()> {
    let row = MembershipActiveModel {
        collection_id: Set(collection_id),
        property_id: Set(property_id),
        added_at: Set(added_at.fixed_offset()),
        source: Set(MembershipSource::Auto),
        status: Set(MembershipStatus::Active),
        removed_by_agent: Set(false),
        liked: Set(false),
        disliked: Set(false),
        viewed: Set(false),
        commented: Set(false),
        interacted_at: Set(None),
    };

    Membership::insert(row).exec(db).await?;
    Ok(())
}

/// Flip the availability status of existing membership rows.
///
/// The update sets the `status` column only, so concurrent visitor
/// interaction writes on the same rows are never clobbered.
pub async fn set_status<C: ConnectionTrait>(
    db: &C,
    collection_id: Uuid,
    property_ids: &[Uuid],
    status: MembershipStatus,
) -> Result<u64> {
    if property_ids.is_empty() {
        return Ok(0);
    }

    let result = Membership::update_many()
        .set(MembershipActiveModel {
            status: Set(status),
            ..Default::default()
        })
        .filter(MembershipColumn::CollectionId.eq(collection_id))
        .filter(MembershipColumn::PropertyId.is_in(property_ids.iter().copied()))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Count members that the visitor currently sees as active.
pub async fn count_active<C: ConnectionTrait>(db: &C, collection_id: Uuid) -> Result<u64> {
    use sea_orm::PaginatorTrait;

    Ok(Membership::find()
        .filter(MembershipColumn::CollectionId.eq(collection_id))
        .filter(MembershipColumn::Status.eq(MembershipStatus::Active))
        .filter(MembershipColumn::RemovedByAgent.eq(false))
        .count(db)
        .await?)
}
