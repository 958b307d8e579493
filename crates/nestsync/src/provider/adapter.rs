//! Provider adapter: turns collection preferences into provider queries,
//! routes them by capability, retries transient failures and merges the
//! results into one deduplicated batch.

use std::collections::HashSet;
use std::sync::Arc;

use backon::Retryable;
use tracing::{debug, warn};

use crate::entity::prelude::PreferenceModel;
use crate::retry::RetryConfig;

use super::errors::{ProviderError, Result};
use super::types::{
    FetchOutcome, Listing, ListingFilters, ListingProvider, MatchQuality, QueryMode, SearchQuery,
};

/// Provider home-type codes keyed off the preference flags.
fn home_type_codes(preference: &PreferenceModel) -> Vec<String> {
    let flags = [
        (preference.single_family, "SINGLE_FAMILY"),
        (preference.condo, "CONDO"),
        (preference.townhouse, "TOWNHOUSE"),
        (preference.multi_family, "MULTI_FAMILY"),
        (preference.apartment, "APARTMENT"),
        (preference.lot_land, "LOT_LAND"),
    ];

    flags
        .into_iter()
        .filter_map(|(enabled, code)| enabled.then(|| code.to_string()))
        .collect()
}

/// Routes searches across a primary provider and an optional secondary.
///
/// The secondary serves two purposes: it answers query shapes the primary
/// cannot (township search), and it is the fallback when the primary stays
/// down after retries.
pub struct ProviderAdapter {
    primary: Arc<dyn ListingProvider>,
    secondary: Option<Arc<dyn ListingProvider>>,
    retry: RetryConfig,
}

impl ProviderAdapter {
    pub fn new(primary: Arc<dyn ListingProvider>) -> Self {
        Self {
            primary,
            secondary: None,
            retry: RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_secondary(mut self, secondary: Arc<dyn ListingProvider>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch every listing matching a collection's preferences.
    ///
    /// Returns `Ok` with an empty batch when the provider answered and
    /// nothing matched; any provider failure is an `Err` so callers never
    /// mistake an outage for an empty market.
    pub async fn fetch(&self, preference: &PreferenceModel) -> Result<FetchOutcome> {
        let mut dropped: Vec<String> = Vec::new();
        let plan = self.build_plan(preference, &mut dropped)?;

        let mut seen: HashSet<i64> = HashSet::new();
        let mut listings: Vec<Listing> = Vec::new();

        for (provider, query) in &plan {
            let batch = self.search_with_retry(provider.as_ref(), query).await?;
            for listing in batch {
                if seen.insert(listing.provider_id) {
                    listings.push(listing);
                }
            }
        }

        let quality = if dropped.is_empty() {
            MatchQuality::Full
        } else {
            dropped.sort();
            dropped.dedup();
            MatchQuality::Degraded {
                dropped_filters: dropped,
            }
        };

        Ok(FetchOutcome { listings, quality })
    }

    /// Expand preferences into (provider, query) pairs.
    ///
    /// Coordinate preferences produce one area query; otherwise each city
    /// and township becomes its own location query. Township queries only
    /// run against a provider that understands sub-localities.
    fn build_plan(
        &self,
        preference: &PreferenceModel,
        dropped: &mut Vec<String>,
    ) -> Result<Vec<(Arc<dyn ListingProvider>, SearchQuery)>> {
        let mut plan = Vec::new();

        if preference.has_coordinates() {
            let radius_miles = match preference.radius_miles {
                Some(r) if r > 0.0 && r.is_finite() => r,
                other => return Err(ProviderError::InvalidRadius { radius_miles: other }),
            };

            // has_coordinates() guarantees both axes are present.
            let (latitude, longitude) = match (preference.latitude, preference.longitude) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => unreachable!("has_coordinates checked above"),
            };

            let mode = QueryMode::Area {
                latitude,
                longitude,
                radius_miles,
            };
            plan.push(self.assign(mode, preference, dropped));
            return Ok(plan);
        }

        for city in preference.city_list() {
            plan.push(self.assign(QueryMode::Location(city), preference, dropped));
        }

        let townships = preference.township_list();
        if townships.is_empty() {
            return Ok(plan);
        }

        match self.township_provider() {
            Some(provider) => {
                for township in townships {
                    let query = SearchQuery {
                        mode: QueryMode::Location(township),
                        filters: self.filters_for(provider.as_ref(), preference, dropped),
                    };
                    plan.push((provider.clone(), query));
                }
            }
            None => {
                warn!(
                    townships = townships.len(),
                    "no provider supports township search, dropping township locations"
                );
                dropped.push("township_search".to_string());
            }
        }

        Ok(plan)
    }

    /// Pair a query mode with the primary provider and its filter set.
    fn assign(
        &self,
        mode: QueryMode,
        preference: &PreferenceModel,
        dropped: &mut Vec<String>,
    ) -> (Arc<dyn ListingProvider>, SearchQuery) {
        let filters = self.filters_for(self.primary.as_ref(), preference, dropped);
        (self.primary.clone(), SearchQuery { mode, filters })
    }

    /// Build the filter set a specific provider can honor, recording what
    /// had to be dropped.
    fn filters_for(
        &self,
        provider: &dyn ListingProvider,
        preference: &PreferenceModel,
        dropped: &mut Vec<String>,
    ) -> ListingFilters {
        let caps = provider.capabilities();

        let mut filters = ListingFilters {
            min_price: preference.min_price,
            max_price: preference.max_price,
            min_beds: preference.min_beds,
            max_beds: preference.max_beds,
            min_baths: preference.min_baths,
            max_baths: preference.max_baths,
            min_living_area: preference.min_living_area,
            home_types: home_type_codes(preference),
        };

        if !caps.bath_range && (filters.min_baths.is_some() || filters.max_baths.is_some()) {
            filters.min_baths = None;
            filters.max_baths = None;
            dropped.push("bath_range".to_string());
        }

        if !caps.living_area_filter && filters.min_living_area.is_some() {
            filters.min_living_area = None;
            dropped.push("living_area".to_string());
        }

        filters
    }

    fn township_provider(&self) -> Option<Arc<dyn ListingProvider>> {
        if self.primary.capabilities().township_search {
            return Some(self.primary.clone());
        }
        self.secondary
            .as_ref()
            .filter(|p| p.capabilities().township_search)
            .cloned()
    }

    /// Run one query with exponential backoff on transient errors, then
    /// fall back to the secondary provider if the primary stayed down.
    async fn search_with_retry(
        &self,
        provider: &dyn ListingProvider,
        query: &SearchQuery,
    ) -> Result<Vec<Listing>> {
        let op = || async { provider.search(query).await };
        let result = op
            .retry(self.retry.clone().into_backoff())
            .when(ProviderError::is_transient)
            .notify(|err, dur| {
                debug!(provider = provider.name(), delay = ?dur, error = %err, "retrying provider search");
            })
            .await;

        match result {
            Ok(listings) => Ok(listings),
            Err(err) if err.is_transient() => {
                let Some(secondary) = self
                    .secondary
                    .as_ref()
                    .filter(|s| s.name() != provider.name())
                else {
                    return Err(err);
                };

                warn!(
                    primary = provider.name(),
                    secondary = secondary.name(),
                    error = %err,
                    "primary provider unavailable, trying secondary"
                );
                let op = || async { secondary.search(query).await };
                op.retry(self.retry.clone().into_backoff())
                    .when(ProviderError::is_transient)
                    .await
            }
            Err(err) => Err(err),
        }
    }
}
