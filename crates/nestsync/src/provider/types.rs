//! Provider-facing types: the canonical listing shape, search queries,
//! capability flags and the `ListingProvider` trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entity::prelude::ListingStatus;

use super::errors::Result;

/// A listing as normalized from any provider.
///
/// `provider_id` is the provider's stable numeric listing id and the dedup
/// key across queries and syncs. Everything the normalizer could not map
/// onto a column survives in `raw_attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub provider_id: i64,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub price: Option<i64>,
    pub beds: Option<i32>,
    pub baths: Option<f64>,
    pub living_area: Option<i32>,
    pub home_type: Option<String>,
    pub status: ListingStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_url: Option<String>,
    pub raw_attributes: serde_json::Value,
}

/// Where to search: a named place or a coordinate circle.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryMode {
    /// Free-text place name (a city or township string).
    Location(String),
    /// Coordinate search within `radius_miles` of the point.
    Area {
        latitude: f64,
        longitude: f64,
        radius_miles: f64,
    },
}

/// Range and category filters applied server-side where the provider
/// supports them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilters {
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_beds: Option<i32>,
    pub max_beds: Option<i32>,
    pub min_baths: Option<f64>,
    pub max_baths: Option<f64>,
    pub min_living_area: Option<i32>,
    /// Provider home-type codes, e.g. `SINGLE_FAMILY`.
    pub home_types: Vec<String>,
}

/// One provider search: a place plus filters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub mode: QueryMode,
    pub filters: ListingFilters,
}

/// What a provider can filter on natively.
///
/// The adapter drops filters a provider cannot express and flags the
/// result as a degraded match instead of failing the fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapabilities {
    /// Township (sub-locality) names are accepted as location strings.
    pub township_search: bool,
    /// Min/max bath bounds are filterable.
    pub bath_range: bool,
    /// A living-area floor is filterable.
    pub living_area_filter: bool,
}

impl ProviderCapabilities {
    /// Everything supported. Used by full-featured providers and stubs.
    pub const FULL: Self = Self {
        township_search: true,
        bath_range: true,
        living_area_filter: true,
    };
}

/// Whether the returned listings honored every requested filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchQuality {
    Full,
    /// Some filters could not be applied; their names are listed so the
    /// run report can say what was relaxed.
    Degraded { dropped_filters: Vec<String> },
}

impl MatchQuality {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// The result of a successful fetch for one collection.
///
/// An empty `listings` vector is a real answer (zero matches) and is kept
/// distinct from a fetch error, which surfaces as `Err` from the adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub listings: Vec<Listing>,
    pub quality: MatchQuality,
}

/// A listing search backend.
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Stable provider name for logs and run reports.
    fn name(&self) -> &str;

    fn capabilities(&self) -> ProviderCapabilities;

    /// Run one search and return every matching listing, following
    /// pagination internally.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Listing>>;
}
