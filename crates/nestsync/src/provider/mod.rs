//! Listing providers: the adapter that turns preferences into searches,
//! rate limiting, and concrete clients.

pub mod adapter;
pub mod errors;
#[cfg(feature = "homescope")]
pub mod homescope;
pub mod rate_limit;
pub mod types;

pub use adapter::ProviderAdapter;
pub use errors::{ProviderError, Result};
#[cfg(feature = "homescope")]
pub use homescope::HomeScopeClient;
pub use rate_limit::{ApiRateLimiter, DEFAULT_PROVIDER_RPS, RateLimitedProvider};
pub use types::{
    FetchOutcome, Listing, ListingFilters, ListingProvider, MatchQuality, ProviderCapabilities,
    QueryMode, SearchQuery,
};
