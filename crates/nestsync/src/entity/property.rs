//! Property entity - a denormalized cache of one external listing.
//!
//! Properties are owned by the system and shared read-only across
//! collections. Cached detail may go stale between syncs, but rows are
//! never deleted by the sync engine: status transitions are recorded,
//! not erased.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Listing status as reported by the provider, normalized.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ListingStatus {
    #[sea_orm(string_value = "for_sale")]
    #[default]
    ForSale,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "sold")]
    Sold,
    #[sea_orm(string_value = "off_market")]
    OffMarket,
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingStatus::ForSale => write!(f, "for_sale"),
            ListingStatus::Pending => write!(f, "pending"),
            ListingStatus::Sold => write!(f, "sold"),
            ListingStatus::OffMarket => write!(f, "off_market"),
        }
    }
}

/// Property model - unified schema for listings across providers.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Provider-assigned stable listing id. Diffing matches on this alone.
    #[sea_orm(unique)]
    pub provider_id: i64,

    // ─── Address ────────────────────────────────────────────────────────────
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,

    // ─── Listing facts ──────────────────────────────────────────────────────
    pub price: Option<i64>,
    pub beds: Option<i32>,
    pub baths: Option<f64>,
    pub living_area: Option<i32>,
    pub home_type: Option<String>,
    pub listing_status: ListingStatus,

    // ─── Location ───────────────────────────────────────────────────────────
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Primary media reference.
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,

    /// Raw provider attributes needed downstream, stored as JSON.
    #[sea_orm(column_type = "Json")]
    pub raw_attributes: serde_json::Value,

    // ─── Detail cache ───────────────────────────────────────────────────────
    /// Full detail response cached from the provider, if fetched.
    #[sea_orm(column_type = "Json", nullable)]
    pub detail: Option<serde_json::Value>,
    /// Freshness marker for `detail`; `None` forces re-fetch on next read.
    pub detail_cached_at: Option<DateTimeWithTimeZone>,

    // ─── Tracking ───────────────────────────────────────────────────────────
    pub first_seen_at: DateTimeWithTimeZone,
    /// When this record was last written from a provider response.
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::membership::Entity")]
    Membership,
}

impl Related<super::membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Membership.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// One-line display address.
    pub fn display_address(&self) -> String {
        let street = self.street_address.as_deref().unwrap_or("(no address)");
        match (&self.city, &self.state) {
            (Some(city), Some(state)) => format!("{street}, {city}, {state}"),
            (Some(city), None) => format!("{street}, {city}"),
            _ => street.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_model() -> Model {
        Model {
            id: Uuid::new_v4(),
            provider_id: 44_118_863,
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

    #[test]
    fn display_address_includes_city_and_state() {
        assert_eq!(make_model().display_address(), "42 Elm St, Maplewood, NJ");
    }

    #[test]
    fn display_address_without_city_falls_back_to_street() {
        let mut model = make_model();
        model.city = None;
        model.state = None;
        assert_eq!(model.display_address(), "42 Elm St");
    }

    #[test]
    fn listing_status_display_matches_db_values() {
        assert_eq!(ListingStatus::ForSale.to_string(), "for_sale");
        assert_eq!(ListingStatus::OffMarket.to_string(), "off_market");
    }
}
