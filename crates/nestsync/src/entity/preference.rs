//! CollectionPreference entity - the search criteria attached to a collection.
//!
//! Preferences are read fresh by the provider adapter at fetch time, so
//! edits made through the preferences UI take effect on the next sync
//! without any explicit invalidation signal.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// CollectionPreference model - one row per collection.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collection_preferences")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub collection_id: Uuid,

    // ─── Location criteria ──────────────────────────────────────────────────
    /// Free-text city names as a JSON string array. Used when coordinates
    /// are absent.
    #[sea_orm(column_type = "Json")]
    pub cities: serde_json::Value,
    /// Free-text township (sub-locality) names as a JSON string array.
    /// Township search is a provider capability; unsupported providers get
    /// these dropped with a degraded-match-quality flag.
    #[sea_orm(column_type = "Json")]
    pub townships: serde_json::Value,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Search radius in miles around the coordinates. Required (and validated
    /// non-zero) when coordinates are set.
    pub radius_miles: Option<f64>,

    // ─── Range filters ──────────────────────────────────────────────────────
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_beds: Option<i32>,
    pub max_beds: Option<i32>,
    pub min_baths: Option<f64>,
    pub max_baths: Option<f64>,
    pub min_living_area: Option<i32>,

    // ─── Home-type flags ────────────────────────────────────────────────────
    #[sea_orm(default_value = false)]
    pub single_family: bool,
    #[sea_orm(default_value = false)]
    pub condo: bool,
    #[sea_orm(default_value = false)]
    pub townhouse: bool,
    #[sea_orm(default_value = false)]
    pub multi_family: bool,
    #[sea_orm(default_value = false)]
    pub apartment: bool,
    #[sea_orm(default_value = false)]
    pub lot_land: bool,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::collection::Entity",
        from = "Column::CollectionId",
        to = "super::collection::Column::Id"
    )]
    Collection,
}

impl Related<super::collection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collection.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn string_array(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

impl Model {
    /// City names as owned strings, skipping malformed entries.
    pub fn city_list(&self) -> Vec<String> {
        string_array(&self.cities)
    }

    /// Township names as owned strings, skipping malformed entries.
    pub fn township_list(&self) -> Vec<String> {
        string_array(&self.townships)
    }

    /// Whether coordinate search data is present.
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}
