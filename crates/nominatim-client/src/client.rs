use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::NominatimError;
use crate::types::{ForwardMatch, ReverseMatch, ReverseResponse, SearchHit};

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_USER_AGENT: &str = "nominatim-client-rs/0.1";
const CACHE_TTL_SECS: u64 = 86400; // 24 hours

/// Connection settings for [`NominatimClient`]
#[derive(Debug, Clone)]
pub struct NominatimOptions {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Pause held after every request; Nominatim's usage policy asks for 1 req/sec
    pub min_interval: Duration,
    pub cache_capacity: u64,
}

impl Default for NominatimOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            min_interval: Duration::from_millis(1100),
            cache_capacity: 10_000,
        }
    }
}

/// Nominatim geocoding client with rate limiting and caching
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
    search_cache: Cache<String, ForwardMatch>,
    reverse_cache: Cache<String, ReverseMatch>,
    /// Semaphore to keep a single request in flight
    rate_limiter: Semaphore,
    min_interval: Duration,
}

impl NominatimClient {
    /// Create a new client with default settings
    pub fn new() -> crate::Result<Self> {
        Self::with_options(NominatimOptions::default())
    }

    /// Create a new client with a custom Nominatim URL
    pub fn with_base_url(base_url: &str) -> crate::Result<Self> {
        Self::with_options(NominatimOptions {
            base_url: base_url.to_string(),
            ..NominatimOptions::default()
        })
    }

    pub fn with_options(options: NominatimOptions) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str())
            .build()?;

        let search_cache = Cache::builder()
            .max_capacity(options.cache_capacity)
            .time_to_live(Duration::from_secs(CACHE_TTL_SECS))
            .build();
        let reverse_cache = Cache::builder()
            .max_capacity(options.cache_capacity)
            .time_to_live(Duration::from_secs(CACHE_TTL_SECS))
            .build();

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            search_cache,
            reverse_cache,
            rate_limiter: Semaphore::new(1),
            min_interval: options.min_interval,
        })
    }

    /// Forward geocode free text to the coordinates of the first candidate
    pub async fn search(&self, query: &str) -> crate::Result<ForwardMatch> {
        let query = query.trim();
        if query.is_empty() {
            return Err(NominatimError::EmptyQuery);
        }

        let cache_key = query.to_lowercase();
        if let Some(cached) = self.search_cache.get(&cache_key).await {
            return Ok(cached);
        }

        let url = format!(
            "{}/search?format=json&limit=1&q={}",
            self.base_url,
            urlencoding::encode(query)
        );

        let hits: Vec<SearchHit> = self.get_json(&url).await?;

        let Some(hit) = hits.into_iter().next() else {
            debug!(query, "No search results");
            return Err(NominatimError::NotFound(format!("\"{query}\"")));
        };
        let result = hit.into_match()?;

        debug!(
            query,
            lat = result.latitude,
            lon = result.longitude,
            "Geocoded address"
        );

        self.search_cache.insert(cache_key, result.clone()).await;
        Ok(result)
    }

    /// Reverse geocode coordinates to a display name and address components
    pub async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> crate::Result<ReverseMatch> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(NominatimError::InvalidCoordinates(latitude, longitude));
        }

        // Round to 6 decimal places for cache key (~0.1m precision)
        let cache_key = format!("{:.6},{:.6}", latitude, longitude);

        if let Some(cached) = self.reverse_cache.get(&cache_key).await {
            return Ok(cached);
        }

        let url = format!(
            "{}/reverse?format=json&lat={}&lon={}&addressdetails=1",
            self.base_url, latitude, longitude
        );

        let data: ReverseResponse = self.get_json(&url).await?;

        if let Some(ref err) = data.error {
            warn!(lat = latitude, lon = longitude, error = %err, "Nominatim returned error");
        }

        let Some(result) = data.into_match() else {
            return Err(NominatimError::NotFound(format!("{latitude}, {longitude}")));
        };

        debug!(
            lat = latitude,
            lon = longitude,
            display_name = %result.display_name,
            "Reverse geocoded coordinates"
        );

        self.reverse_cache.insert(cache_key, result.clone()).await;
        Ok(result)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> crate::Result<T> {
        // Rate limit: hold the permit for the request plus the minimum interval
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| NominatimError::ApiError(e.to_string()))?;

        let result = self.send(url).await;

        if !self.min_interval.is_zero() {
            tokio::time::sleep(self.min_interval).await;
        }

        result
    }

    async fn send<T: serde::de::DeserializeOwned>(&self, url: &str) -> crate::Result<T> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NominatimError::ApiError(format!(
                "Nominatim returned status {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
