//! POI lookup: bounded cache, shared debounce, dedup

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use moka::future::Cache;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LookupConfig;
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::geo::{miles_to_meters, GeoPoint};
use crate::poi::{dedup_pois, Poi, RawPoi};

/// Where raw points of interest come from
#[async_trait]
pub trait PoiSource: Send + Sync {
    async fn nearby(&self, center: GeoPoint, radius_meters: f64) -> Result<Vec<RawPoi>>;
}

/// What a lookup ended with. `find` folds everything but `Found` into an
/// empty list; the distinction is kept here for callers and logs.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// Results from the cache or a successful query (possibly empty)
    Found(Vec<Poi>),
    /// A newer lookup arrived inside the debounce window
    Superseded,
    /// The source failed or timed out
    Failed,
}

impl LookupOutcome {
    pub fn into_pois(self) -> Vec<Poi> {
        match self {
            Self::Found(pois) => pois,
            Self::Superseded | Self::Failed => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Finds deduplicated POIs around a point, caching by rounded coordinates
/// and radius, and collapsing bursts of requests into the latest one
pub struct PoiLookupService<S> {
    source: S,
    cache: Cache<String, Vec<Poi>>,
    debouncer: Debouncer,
    config: LookupConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    queries: AtomicU64,
}

impl<S: PoiSource> PoiLookupService<S> {
    pub fn new(source: S, config: LookupConfig) -> Self {
        let cache = Cache::builder().max_capacity(config.cache_capacity).build();

        Self {
            source,
            cache,
            debouncer: Debouncer::new(config.debounce),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            queries: AtomicU64::new(0),
        }
    }

    /// `lat,lon,radius` with coordinates rounded to the configured precision
    pub fn cache_key(&self, center: GeoPoint, radius_miles: f64) -> String {
        let p = self.config.cache_precision;
        let scale = 10f64.powi(p as i32);
        // `+ 0.0` turns a rounded -0.0 into 0.0 so both sides of zero share a key
        let round = |v: f64| (v * scale).round() / scale + 0.0;
        format!(
            "{:.*},{:.*},{}",
            p,
            round(center.lat),
            p,
            round(center.lon),
            radius_miles
        )
    }

    /// POIs within `radius_miles` of `center`. Failures and superseded
    /// requests yield an empty list.
    pub async fn find(&self, center: GeoPoint, radius_miles: f64) -> Vec<Poi> {
        self.lookup(center, radius_miles).await.into_pois()
    }

    pub async fn lookup(&self, center: GeoPoint, radius_miles: f64) -> LookupOutcome {
        let key = self.cache_key(center, radius_miles);

        if let Some(cached) = self.cache.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, count = cached.len(), "POI cache hit");
            return LookupOutcome::Found(cached);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        match self
            .debouncer
            .run(|| self.query(&key, center, radius_miles))
            .await
        {
            Some(outcome) => outcome,
            None => {
                debug!(key = %key, "POI lookup superseded");
                LookupOutcome::Superseded
            }
        }
    }

    async fn query(&self, key: &str, center: GeoPoint, radius_miles: f64) -> LookupOutcome {
        // An identical request may have filled the cache while this one waited
        if let Some(cached) = self.cache.get(key).await {
            return LookupOutcome::Found(cached);
        }

        self.queries.fetch_add(1, Ordering::Relaxed);
        let request = self.source.nearby(center, miles_to_meters(radius_miles));

        let raw = match tokio::time::timeout(self.config.request_timeout, request).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(key, error = %e, "POI lookup failed");
                return LookupOutcome::Failed;
            }
            Err(_) => {
                warn!(key, timeout_secs = self.config.request_timeout.as_secs(), "POI lookup timed out");
                return LookupOutcome::Failed;
            }
        };

        let raw_count = raw.len();
        let pois = dedup_pois(raw, self.config.dedup_tolerance_deg);
        debug!(key, raw_count, count = pois.len(), "POI lookup complete");

        self.cache.insert(key.to_string(), pois.clone()).await;
        LookupOutcome::Found(pois)
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of queries that reached the source
    pub fn source_queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }
}
