//! Property cache writes driven by provider responses.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::prelude::{Property, PropertyActiveModel, PropertyColumn, PropertyModel};
use crate::provider::Listing;

use super::errors::{Result, StoreError};

/// Upsert the shared property row for a listing and return its id.
///
/// New listings get a fresh row; known listings get their listing facts and
/// `synced_at` refreshed. Cached detail columns (`detail`,
/// `detail_cached_at`) are left alone here — invalidation is the cache
/// layer's decision, and property detail is last-writer-wins by design of
/// the cache, not of this upsert.
pub async fn upsert_from_listing<C: ConnectionTrait>(
    db: &C,
    listing: &Listing,
    now: DateTime<Utc>,
) -> Result<Uuid> {
    let model = PropertyActiveModel {
        id: Set(Uuid::new_v4()),
        provider_id: Set(listing.provider_id),
        street_address: Set(listing.street_address.clone()),
        city: Set(listing.city.clone()),
        state: Set(listing.state.clone()),
        zipcode: Set(listing.zipcode.clone()),
        price: Set(listing.price),
        beds: Set(listing.beds),
        baths: Set(listing.baths),
        living_area: Set(listing.living_area),
        home_type: Set(listing.home_type.clone()),
        listing_status: Set(listing.status.clone()),
        latitude: Set(listing.latitude),
        longitude: Set(listing.longitude),
        image_url: Set(listing.image_url.clone()),
        raw_attributes: Set(listing.raw_attributes.clone()),
        detail: Set(None),
        detail_cached_at: Set(None),
        first_seen_at: Set(now.fixed_offset()),
        synced_at: Set(now.fixed_offset()),
    };

    Property::insert(model)
        .on_conflict(
            OnConflict::column(PropertyColumn::ProviderId)
                .update_columns([
                    PropertyColumn::StreetAddress,
                    PropertyColumn::City,
                    PropertyColumn::State,
                    PropertyColumn::Zipcode,
                    PropertyColumn::Price,
                    PropertyColumn::Beds,
                    PropertyColumn::Baths,
                    PropertyColumn::LivingArea,
                    PropertyColumn::HomeType,
                    PropertyColumn::ListingStatus,
                    PropertyColumn::Latitude,
                    PropertyColumn::Longitude,
                    PropertyColumn::ImageUrl,
                    PropertyColumn::RawAttributes,
                    PropertyColumn::SyncedAt,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;

    let stored = Property::find()
        .filter(PropertyColumn::ProviderId.eq(listing.provider_id))
        .one(db)
        .await?
        .ok_or(StoreError::PropertyNotFound {
            provider_id: listing.provider_id,
        })?;

    Ok(stored.id)
}

/// Load property rows by internal id, for notification payloads and cache
/// invalidation.
pub async fn find_by_ids<C: ConnectionTrait>(db: &C, ids: &[Uuid]) -> Result<Vec<PropertyModel>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(Property::find()
        .filter(PropertyColumn::Id.is_in(ids.iter().copied()))
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::prelude::ListingStatus;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn listing(provider_id: i64) -> Listing {
        Listing {
            provider_id,
            street_address: Some("42 Elm St".to_string()),
            city: Some("Maplewood".to_string()),
            state: Some("NJ".to_string()),
            zipcode: Some("07040".to_string()),
            price: Some(650_000),
            beds: Some(3),
            baths: Some(2.5),
            living_area: Some(1_850),
            home_type: Some("SINGLE_FAMILY".to_string()),
            status: ListingStatus::ForSale,
            latitude: Some(40.7312),
            longitude: Some(-74.2735),
            image_url: None,
            raw_attributes: serde_json::json!({}),
        }
    }

    fn stored_row(provider_id: i64) -> PropertyModel {
        PropertyModel {
            id: Uuid::new_v4(),
            provider_id,
            street_address: Some("42 Elm St".to_string()),
            city: Some("Maplewood".to_string()),
            state: Some("NJ".to_string()),
            zipcode: Some("07040".to_string()),
            price: Some(650_000),
            beds: Some(3),
            baths: Some(2.5),
            living_area: Some(1_850),
            home_type: Some("SINGLE_FAMILY".to_string()),
            listing_status: ListingStatus::ForSale,
            latitude: Some(40.7312),
            longitude: Some(-74.2735),
            image_url: None,
            raw_attributes: serde_json::json!({}),
            detail: None,
            detail_cached_at: None,
            first_seen_at: Utc::now().fixed_offset(),
            synced_at: Utc::now().fixed_offset(),
        }
    }

    #[tokio::test]
    async fn upsert_conflict_clause_preserves_detail_cache_columns() {
        let row = stored_row(99);
        let expected_id = row.id;

        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                rows_affected: 1,
                last_insert_id: 0,
            }])
            .append_query_results([vec![row]])
            .into_connection();

        let id = upsert_from_listing(&db, &listing(99), Utc::now())
            .await
            .expect("upsert should succeed");
        assert_eq!(id, expected_id);

        let sql = format!("{:?}", db.into_transaction_log());
        assert!(sql.contains("ON CONFLICT"), "expected upsert: {sql}");
        assert!(
            !sql.contains("\"detail\" = \"excluded\""),
            "conflict update must not overwrite cached detail: {sql}"
        );
        assert!(
            !sql.contains("\"first_seen_at\" = \"excluded\""),
            "conflict update must not reset first_seen_at: {sql}"
        );
    }

    #[tokio::test]
    async fn find_by_ids_short_circuits_on_empty_input() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let rows = find_by_ids(&db, &[]).await.expect("empty lookup");
        assert!(rows.is_empty());
        assert!(db.into_transaction_log().is_empty());
    }
}
