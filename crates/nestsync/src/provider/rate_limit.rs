//! Proactive rate limiting for provider calls.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use super::errors::Result;
use super::types::{Listing, ListingProvider, ProviderCapabilities, SearchQuery};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default provider request ceiling (requests per second). The upstream
/// plan allows 2/sec; stay at the ceiling rather than under it because the
/// limiter already smooths bursts.
pub const DEFAULT_PROVIDER_RPS: u32 = 2;

/// A standalone token-bucket limiter shared across every worker that talks
/// to the same provider.
///
/// Cloning shares the bucket, so the scheduler can hand one limiter to all
/// of its workers and the aggregate request rate stays bounded.
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a limiter allowing `requests_per_second` requests. Zero is
    /// clamped to one.
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner: Arc::new(rate_limiter),
        }
    }

    /// Wait until the bucket allows another request.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

/// A rate-limited decorator around any `ListingProvider`.
///
/// Every `search` waits on the shared bucket before delegating, so the
/// limit holds across concurrent collections without the inner client
/// knowing about it.
pub struct RateLimitedProvider<P> {
    inner: P,
    limiter: ApiRateLimiter,
}

impl<P> RateLimitedProvider<P> {
    pub fn new(inner: P, limiter: ApiRateLimiter) -> Self {
        Self { inner, limiter }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: Clone> Clone for RateLimitedProvider<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: self.limiter.clone(),
        }
    }
}

#[async_trait]
impl<P: ListingProvider> ListingProvider for RateLimitedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.inner.capabilities()
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Listing>> {
        self.limiter.wait().await;
        self.inner.search(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{Duration, Instant};

    use crate::provider::types::{ListingFilters, QueryMode};

    struct CountingProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ListingProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities::FULL
        }

        async fn search(&self, _query: &SearchQuery) -> Result<Vec<Listing>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn query() -> SearchQuery {
        SearchQuery {
            mode: QueryMode::Location("Maplewood".to_string()),
            filters: ListingFilters::default(),
        }
    }

    #[tokio::test]
    async fn wrapper_delegates_and_counts_calls() {
        let provider = RateLimitedProvider::new(
            CountingProvider {
                calls: AtomicU32::new(0),
            },
            ApiRateLimiter::new(100),
        );

        provider.search(&query()).await.expect("search");
        provider.search(&query()).await.expect("search");
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(provider.name(), "counting");
    }

    #[tokio::test]
    async fn limiter_paces_a_burst() {
        // 10 rps means a burst of 3 extra requests waits roughly 300ms.
        let limiter = ApiRateLimiter::new(10);
        let start = Instant::now();
        for _ in 0..4 {
            limiter.wait().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn cloned_limiters_share_one_bucket() {
        let a = ApiRateLimiter::new(10);
        let b = a.clone();

        let start = Instant::now();
        a.wait().await;
        a.wait().await;
        b.wait().await;
        b.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[test]
    fn zero_rps_is_clamped() {
        let _limiter = ApiRateLimiter::new(0);
    }
}
