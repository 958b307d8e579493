//! HomeScope listing client.
//!
//! HomeScope is fronted by an API gateway that authenticates with
//! `x-rapidapi-key`/`x-rapidapi-host` headers. Two endpoints matter here:
//! `/search` for free-text locations and `/search_coordinates` for a
//! coordinate circle. The coordinate endpoint takes a search *diameter*
//! `d` in miles, so the radius callers work with is doubled exactly once,
//! at this boundary.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::entity::prelude::ListingStatus;
use crate::transport::Transport;

use super::errors::{ProviderError, Result};
use super::types::{
    Listing, ListingFilters, ListingProvider, ProviderCapabilities, QueryMode, SearchQuery,
};

/// Upper bound on result pages fetched per query.
pub const MAX_PAGES: u32 = 5;

pub struct HomeScopeClient<T> {
    transport: T,
    api_key: String,
    base_url: String,
    host: String,
}

impl<T: Transport> HomeScopeClient<T> {
    pub fn new(transport: T, api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let parsed = Url::parse(&base_url)
            .map_err(|e| ProviderError::BadRequest {
                message: format!("invalid base url {base_url}: {e}"),
            })?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ProviderError::BadRequest {
                message: format!("base url {base_url} has no host"),
            })?
            .to_string();

        Ok(Self {
            transport,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            host,
        })
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("x-rapidapi-key".to_string(), self.api_key.clone()),
            ("x-rapidapi-host".to_string(), self.host.clone()),
        ]
    }

    /// Build the request URL for one page of a query.
    fn build_url(&self, query: &SearchQuery, page: u32) -> Result<Url> {
        let (path, mode_params) = match &query.mode {
            QueryMode::Location(location) => (
                "/search",
                vec![("location".to_string(), location.trim().to_string())],
            ),
            QueryMode::Area {
                latitude,
                longitude,
                radius_miles,
            } => (
                "/search_coordinates",
                vec![
                    ("lat".to_string(), latitude.to_string()),
                    ("long".to_string(), longitude.to_string()),
                    // The gateway wants a diameter, not a radius.
                    ("d".to_string(), (radius_miles * 2.0).to_string()),
                ],
            ),
        };

        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ProviderError::BadRequest {
                message: format!("could not build request url: {e}"),
            })?;

        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &mode_params {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("status", "forSale");
            pairs.append_pair("output", "json");
            pairs.append_pair("sort", "priorityscore");
            pairs.append_pair("listing_type", "by_agent");
            pairs.append_pair("doz", "any");
            pairs.append_pair("page", &page.to_string());

            let f = &query.filters;
            append_home_types(&mut pairs, &f.home_types);
            if let Some(v) = f.min_price {
                pairs.append_pair("price_min", &v.to_string());
            }
            if let Some(v) = f.max_price {
                pairs.append_pair("price_max", &v.to_string());
            }
            if let Some(v) = f.min_beds {
                pairs.append_pair("beds_min", &v.to_string());
            }
            if let Some(v) = f.max_beds {
                pairs.append_pair("beds_max", &v.to_string());
            }
            if let Some(v) = f.min_baths {
                pairs.append_pair("baths_min", &(v as i64).to_string());
            }
            if let Some(v) = f.max_baths {
                pairs.append_pair("baths_max", &(v as i64).to_string());
            }
            if let Some(v) = f.min_living_area {
                pairs.append_pair("sqft_min", &v.to_string());
            }
        }

        Ok(url)
    }

    async fn fetch_page(&self, url: &Url) -> Result<SearchPage> {
        let response = self.transport.get(url.as_str(), &self.headers()).await?;

        match response.status {
            200 => {}
            401 | 403 => return Err(ProviderError::Auth { status: response.status }),
            429 => return Err(ProviderError::RateLimited),
            status if status >= 500 => return Err(ProviderError::Server { status }),
            status => {
                let message = String::from_utf8_lossy(&response.body).into_owned();
                return Err(ProviderError::BadRequest {
                    message: format!("status {status}: {message}"),
                });
            }
        }

        Ok(serde_json::from_slice(&response.body)?)
    }
}

/// Gateway home-type flags, one boolean per supported type.
fn append_home_types(pairs: &mut url::form_urlencoded::Serializer<'_, url::UrlQuery<'_>>, codes: &[String]) {
    let flags = [
        ("isSingleFamily", "SINGLE_FAMILY"),
        ("isCondo", "CONDO"),
        ("isTownhouse", "TOWNHOUSE"),
        ("isMultiFamily", "MULTI_FAMILY"),
        ("isApartment", "APARTMENT"),
        ("isLotLand", "LOT_LAND"),
    ];
    for (param, code) in flags {
        let enabled = codes.iter().any(|c| c == code);
        pairs.append_pair(param, if enabled { "true" } else { "false" });
    }
}

#[async_trait]
impl<T: Transport> ListingProvider for HomeScopeClient<T> {
    fn name(&self) -> &str {
        "homescope"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::FULL
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Listing>> {
        let mut listings = Vec::new();

        let mut page = 1u32;
        loop {
            let url = self.build_url(query, page)?;
            let body = self.fetch_page(&url).await?;
            let total_pages = body.total_pages.unwrap_or(1).min(MAX_PAGES);

            for raw in body.results {
                match raw.into_listing() {
                    Some(listing) => listings.push(listing),
                    None => warn!("skipping listing without a usable zpid"),
                }
            }

            if page >= total_pages {
                break;
            }
            page += 1;
        }

        debug!(count = listings.len(), "homescope search complete");
        Ok(listings)
    }
}

// ---------- Wire format ----------

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<WireListing>,
    #[serde(default, rename = "totalPages")]
    total_pages: Option<u32>,
}

/// One listing as the gateway returns it. `zpid` arrives as either a
/// number or a string depending on the endpoint.
#[derive(Debug, Deserialize)]
struct WireListing {
    #[serde(default)]
    zpid: serde_json::Value,
    #[serde(default, rename = "streetAddress")]
    street_address: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    zipcode: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default, rename = "priceForHDP")]
    price_for_hdp: Option<f64>,
    #[serde(default)]
    bedrooms: Option<f64>,
    #[serde(default)]
    bathrooms: Option<f64>,
    #[serde(default, rename = "livingArea")]
    living_area: Option<f64>,
    #[serde(default, rename = "homeType")]
    home_type: Option<String>,
    #[serde(default, rename = "homeStatus")]
    home_status: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default, rename = "imgSrc")]
    image_url: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl WireListing {
    fn into_listing(self) -> Option<Listing> {
        let provider_id = match &self.zpid {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }?;

        let status = match self.home_status.as_deref() {
            Some("PENDING") => ListingStatus::Pending,
            Some("SOLD") | Some("RECENTLY_SOLD") => ListingStatus::Sold,
            Some("OFF_MARKET") | Some("OTHER") => ListingStatus::OffMarket,
            _ => ListingStatus::ForSale,
        };

        Some(Listing {
            provider_id,
            street_address: self.street_address,
            city: self.city,
            state: self.state,
            zipcode: self.zipcode,
            price: self.price.or(self.price_for_hdp).map(|p| p as i64),
            beds: self.bedrooms.map(|b| b as i32),
            baths: self.bathrooms,
            living_area: self.living_area.map(|a| a as i32),
            home_type: self.home_type,
            status,
            latitude: self.latitude,
            longitude: self.longitude,
            image_url: self.image_url,
            raw_attributes: serde_json::Value::Object(self.extra),
        })
    }
}
