//! Caching layer for nearby-places lookups.
//!
//! Entries live for a fixed TTL measured on an injected [`Clock`]; an
//! expired entry is replaced the next time its key is looked up. Misses and
//! refreshes run under a per-key lock, so concurrent lookups of the same key
//! share one upstream call. Failures are never cached.
//!
//! Page tokens are cached by token alone. Location searches are keyed by
//! the coordinate rounded to four decimals (about 11 m), radius and type.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use moka::future::Cache as MokaCache;
use moka::ops::compute::Op;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::places::{
    NearbyResponse, PlacesError, PlacesProvider, PlacesQuery, PlacesStatus, UpstreamRequest,
};

/// Configuration for the places cache.
#[derive(Debug, Clone)]
pub struct PlacesCacheConfig {
    /// How long a fetched response is served from cache.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,

    /// Extra attempts for a page token that is not valid yet.
    pub token_retries: u32,

    /// Pause before each page-token retry.
    pub retry_delay: Duration,
}

impl Default for PlacesCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            max_capacity: 1000,
            token_retries: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl PlacesCacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Token(String),
    Location {
        lat_e4: i64,
        lng_e4: i64,
        radius_m: u32,
        place_type: String,
    },
}

impl CacheKey {
    fn for_query(query: &PlacesQuery) -> Self {
        match &query.page_token {
            Some(token) => CacheKey::Token(token.clone()),
            None => CacheKey::Location {
                lat_e4: round_e4(query.coordinate.latitude()),
                lng_e4: round_e4(query.coordinate.longitude()),
                radius_m: query.radius_m,
                place_type: query.place_type.clone(),
            },
        }
    }
}

fn round_e4(degrees: f64) -> i64 {
    (degrees * 10_000.0).round() as i64
}

#[derive(Debug)]
struct CachedEntry {
    value: Arc<NearbyResponse>,
    expires_at: DateTime<Utc>,
}

/// Nearby-places lookups with TTL caching and page-token retry.
pub struct NearbyPlacesCache {
    provider: Arc<dyn PlacesProvider>,
    clock: Arc<dyn Clock>,
    entries: MokaCache<CacheKey, Arc<CachedEntry>>,
    config: PlacesCacheConfig,
}

impl NearbyPlacesCache {
    pub fn new(
        provider: Arc<dyn PlacesProvider>,
        clock: Arc<dyn Clock>,
        config: PlacesCacheConfig,
    ) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .build();

        Self {
            provider,
            clock,
            entries,
            config,
        }
    }

    /// Look up nearby places, serving from cache while the entry is live.
    pub async fn search(&self, query: &PlacesQuery) -> Result<Arc<NearbyResponse>, PlacesError> {
        let key = CacheKey::for_query(query);

        if let Some(entry) = self.entries.get(&key).await {
            if self.is_live(&entry) {
                debug!(?key, "places cache hit");
                return Ok(Arc::clone(&entry.value));
            }
        }

        // Freshness is re-checked under the key's lock, so a lookup that saw
        // the stale entry reuses the refresh instead of replacing it
        let outcome = self
            .entries
            .entry(key.clone())
            .and_try_compute_with(|current| async move {
                match current {
                    Some(entry) if self.is_live(entry.value()) => {
                        debug!(?key, "places cache refreshed by a concurrent lookup");
                        Ok(Op::Nop)
                    }
                    current => {
                        if current.is_some() {
                            debug!(?key, "places cache entry expired");
                        } else {
                            debug!(?key, "places cache miss");
                        }
                        let value = self.fetch(query).await?;
                        Ok::<_, PlacesError>(Op::Put(Arc::new(CachedEntry {
                            value: Arc::new(value),
                            expires_at: self.expiry_from_now(),
                        })))
                    }
                }
            })
            .await?;

        match outcome.into_entry() {
            Some(entry) => Ok(Arc::clone(&entry.value().value)),
            // Nop is only chosen for an existing entry
            None => Ok(Arc::new(self.fetch(query).await?)),
        }
    }

    fn is_live(&self, entry: &CachedEntry) -> bool {
        self.clock.now() <= entry.expires_at
    }

    fn expiry_from_now(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        TimeDelta::from_std(self.config.ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// One upstream lookup, retrying page tokens that are not valid yet.
    async fn fetch(&self, query: &PlacesQuery) -> Result<NearbyResponse, PlacesError> {
        let request = query.upstream_request();
        let mut response = self.provider.nearby(&request).await?;

        if let UpstreamRequest::Page { .. } = request {
            let mut attempt = 0;
            while attempt < self.config.token_retries
                && response.status == Some(PlacesStatus::InvalidRequest)
            {
                attempt += 1;
                warn!(
                    attempt,
                    max = self.config.token_retries,
                    "page token not ready, retrying"
                );
                tokio::time::sleep(self.config.retry_delay).await;
                response = self.provider.nearby(&request).await?;
            }
        }

        response.into_nearby()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::domain::Coordinate;
    use crate::places::MockPlacesProvider;
    use crate::places::mock::response;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn setup() -> (Arc<MockPlacesProvider>, MockClock, NearbyPlacesCache) {
        let provider = Arc::new(MockPlacesProvider::new());
        let clock = MockClock::new(start());
        let cache = NearbyPlacesCache::new(
            provider.clone(),
            Arc::new(clock.clone()),
            PlacesCacheConfig::default().with_retry_delay(Duration::ZERO),
        );
        (provider, clock, cache)
    }

    fn london() -> PlacesQuery {
        PlacesQuery::new(Coordinate::new(51.5074, -0.1278).unwrap())
    }

    #[test]
    fn default_config() {
        let config = PlacesCacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(30));
        assert_eq!(config.max_capacity, 1000);
        assert_eq!(config.token_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
    }

    #[test]
    fn keys() {
        let q = london();
        let nearby = PlacesQuery::new(Coordinate::new(51.507_41, -0.127_79).unwrap());
        assert_eq!(CacheKey::for_query(&q), CacheKey::for_query(&nearby));

        let farther = PlacesQuery::new(Coordinate::new(51.5080, -0.1278).unwrap());
        assert_ne!(CacheKey::for_query(&q), CacheKey::for_query(&farther));

        assert_ne!(
            CacheKey::for_query(&q),
            CacheKey::for_query(&q.clone().with_radius(1000))
        );

        let paged = q.with_page_token("abc");
        assert_eq!(CacheKey::for_query(&paged), CacheKey::Token("abc".into()));
    }

    #[tokio::test]
    async fn hit_within_ttl_refetch_after() {
        let (provider, clock, cache) = setup();
        provider.push(Ok(response(PlacesStatus::Ok, &["East London Mosque"])));

        let first = cache.search(&london()).await.unwrap();
        assert_eq!(first.results[0].name, "East London Mosque");
        assert_eq!(provider.call_count(), 1);

        clock.advance(chrono::Duration::seconds(29));
        cache.search(&london()).await.unwrap();
        assert_eq!(provider.call_count(), 1);

        // Still live at exactly the expiry instant
        clock.advance(chrono::Duration::seconds(1));
        cache.search(&london()).await.unwrap();
        assert_eq!(provider.call_count(), 1);

        clock.advance(chrono::Duration::seconds(1));
        cache.search(&london()).await.unwrap();
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn distinct_keys_fetch_separately() {
        let (provider, _clock, cache) = setup();

        cache.search(&london()).await.unwrap();
        cache.search(&london().with_place_type("restaurant")).await.unwrap();
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn page_token_retried_until_ok() {
        let (provider, _clock, cache) = setup();
        provider
            .push(Ok(response(PlacesStatus::InvalidRequest, &[])))
            .push(Ok(response(PlacesStatus::InvalidRequest, &[])))
            .push(Ok(response(PlacesStatus::Ok, &["Page Two Mosque"])));

        let result = cache
            .search(&london().with_page_token("next"))
            .await
            .unwrap();

        assert_eq!(result.results[0].name, "Page Two Mosque");
        assert_eq!(provider.call_count(), 3);
        assert!(provider.requests().iter().all(UpstreamRequest::is_page));
    }

    #[tokio::test]
    async fn page_token_retries_exhausted() {
        let (provider, _clock, cache) = setup();
        provider.push(Ok(response(PlacesStatus::InvalidRequest, &[])));

        let err = cache
            .search(&london().with_page_token("stale"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PlacesError::Upstream {
                status: "INVALID_REQUEST".into(),
                message: "INVALID_REQUEST".into(),
            }
        );
        // One call plus three retries
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn location_search_not_retried() {
        let (provider, _clock, cache) = setup();
        provider.push(Ok(response(PlacesStatus::InvalidRequest, &[])));

        assert!(cache.search(&london()).await.is_err());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn errors_not_cached() {
        let (provider, _clock, cache) = setup();
        provider
            .push(Err(PlacesError::Timeout))
            .push(Ok(response(PlacesStatus::Ok, &["Recovered"])));

        assert_eq!(cache.search(&london()).await.unwrap_err(), PlacesError::Timeout);

        let result = cache.search(&london()).await.unwrap();
        assert_eq!(result.results[0].name, "Recovered");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn zero_results_cached_as_empty_success() {
        let (provider, _clock, cache) = setup();
        provider.push(Ok(response(PlacesStatus::ZeroResults, &[])));

        let result = cache.search(&london()).await.unwrap();
        assert!(result.results.is_empty());
        cache.search(&london()).await.unwrap();
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_lookups_share_one_call() {
        let provider = Arc::new(
            MockPlacesProvider::new().with_latency(Duration::from_millis(50)),
        );
        provider.push(Ok(response(PlacesStatus::Ok, &["Shared"])));
        let cache = NearbyPlacesCache::new(
            provider.clone(),
            Arc::new(MockClock::new(start())),
            PlacesCacheConfig::default(),
        );

        let query = london();
        let lookups = (0..8).map(|_| cache.search(&query));
        let results = futures::future::join_all(lookups).await;

        assert!(results.iter().all(|r| r.as_ref().unwrap().results[0].name == "Shared"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_lookups_of_an_expired_entry_refresh_once() {
        let provider = Arc::new(
            MockPlacesProvider::new().with_latency(Duration::from_millis(50)),
        );
        provider
            .push(Ok(response(PlacesStatus::Ok, &["Stale"])))
            .push(Ok(response(PlacesStatus::Ok, &["Fresh"])));
        let clock = MockClock::new(start());
        let cache = NearbyPlacesCache::new(
            provider.clone(),
            Arc::new(clock.clone()),
            PlacesCacheConfig::default(),
        );

        let query = london();
        cache.search(&query).await.unwrap();
        clock.advance(chrono::Duration::seconds(31));

        let early = (0..4).map(|_| cache.search(&query));
        let late = (0..4).map(|_| async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cache.search(&query).await
        });
        let (early, late) = tokio::join!(
            futures::future::join_all(early),
            futures::future::join_all(late)
        );

        for result in early.iter().chain(late.iter()) {
            assert_eq!(result.as_ref().unwrap().results[0].name, "Fresh");
        }
        assert_eq!(provider.call_count(), 2);

        // The refreshed entry is served without another call
        cache.search(&query).await.unwrap();
        assert_eq!(provider.call_count(), 2);
    }
}
