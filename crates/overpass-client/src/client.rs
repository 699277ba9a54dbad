use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{OverpassError, Result};
use crate::types::{OverpassElement, OverpassResponse, RawPoint, TagFilter};

const DEFAULT_BASE_URL: &str = "https://overpass-api.de/api/interpreter";
const DEFAULT_USER_AGENT: &str = "overpass-client-rs/0.1";

/// Connection settings for [`OverpassClient`]
#[derive(Debug, Clone)]
pub struct OverpassOptions {
    /// Full interpreter endpoint URL
    pub endpoint: String,
    pub user_agent: String,
    /// Used both as the HTTP timeout and as the `[timeout:N]` query budget
    pub timeout: Duration,
}

impl Default for OverpassOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(25),
        }
    }
}

/// Client for an Overpass API interpreter
pub struct OverpassClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl OverpassClient {
    /// Create a client against the public overpass-api.de instance
    pub fn new() -> Result<Self> {
        Self::with_options(OverpassOptions::default())
    }

    pub fn with_options(options: OverpassOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            endpoint: options.endpoint,
            timeout: options.timeout,
        })
    }

    /// Find nodes and ways tagged `filter` within `radius_meters` of a point
    pub async fn around(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
        filter: &TagFilter,
    ) -> Result<Vec<RawPoint>> {
        let query = build_around_query(
            filter,
            latitude,
            longitude,
            radius_meters,
            self.timeout.as_secs().max(1),
        )?;

        debug!(lat = latitude, lon = longitude, radius_meters, filter = %filter, "Querying Overpass");

        let response = self.http.post(&self.endpoint).body(query).send().await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Overpass query failed");
            return Err(OverpassError::ApiError(format!(
                "Overpass returned status {}",
                response.status()
            )));
        }

        let data: OverpassResponse = response.json().await?;
        let total = data.elements.len();
        let points: Vec<RawPoint> = data
            .elements
            .into_iter()
            .filter_map(OverpassElement::into_point)
            .collect();

        debug!(total, kept = points.len(), "Overpass returned elements");
        Ok(points)
    }
}

/// Build an Overpass QL query selecting nodes and ways carrying `filter`
/// within `radius_meters` of a point. Ways report their center.
pub fn build_around_query(
    filter: &TagFilter,
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
    timeout_secs: u64,
) -> Result<String> {
    if !radius_meters.is_finite() || radius_meters <= 0.0 {
        return Err(OverpassError::InvalidQuery(format!(
            "radius must be positive, got {radius_meters}"
        )));
    }
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(OverpassError::InvalidQuery(format!(
            "non-finite center {latitude}, {longitude}"
        )));
    }
    if [&filter.key, &filter.value]
        .iter()
        .any(|s| s.is_empty() || s.contains('"'))
    {
        return Err(OverpassError::InvalidQuery(format!(
            "unusable tag filter {filter}"
        )));
    }

    let around = format!("(around:{:.0},{},{})", radius_meters, latitude, longitude);
    let selector = format!("[\"{}\"=\"{}\"]", filter.key, filter.value);

    Ok(format!(
        "[out:json][timeout:{timeout_secs}];(node{selector}{around};way{selector}{around};);out center;"
    ))
}
