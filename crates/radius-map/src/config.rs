//! Configuration for the radius map, loaded from the environment

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{MapError, Result};

const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
const DEFAULT_USER_AGENT: &str = "radius-map/0.1";
const DEFAULT_POI_TAG: &str = "shop=car";
const DEFAULT_RADIUS_PRESETS: &str = "15=Small - 15 mi;30=Large - 30 mi";

/// Radius choices offered to the user, miles → label
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusPresets(BTreeMap<u32, String>);

impl RadiusPresets {
    pub fn new(presets: impl IntoIterator<Item = (u32, String)>) -> Self {
        Self(presets.into_iter().collect())
    }

    /// Label for a radius; radii without a preset read "N mi radius"
    pub fn label(&self, miles: f64) -> String {
        if miles.fract() == 0.0 && miles >= 0.0 && miles <= u32::MAX as f64 {
            if let Some(label) = self.0.get(&(miles as u32)) {
                return label.clone();
            }
        }
        format!("{} mi radius", miles)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.0.iter().map(|(miles, label)| (*miles, label.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for RadiusPresets {
    fn default() -> Self {
        Self::new([
            (15, "Small - 15 mi".to_string()),
            (30, "Large - 30 mi".to_string()),
        ])
    }
}

impl FromStr for RadiusPresets {
    type Err = MapError;

    /// Parses `15=Small - 15 mi;30=Large - 30 mi`
    fn from_str(s: &str) -> Result<Self> {
        let mut presets = BTreeMap::new();
        for entry in s.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (miles, label) = entry.split_once('=').ok_or_else(|| {
                MapError::Config(format!("radius preset {entry:?} is not miles=label"))
            })?;
            let miles: u32 = miles.trim().parse().map_err(|_| {
                MapError::Config(format!("radius preset {entry:?} has non-numeric miles"))
            })?;
            if miles == 0 {
                return Err(MapError::Config(format!(
                    "radius preset {entry:?} must be positive"
                )));
            }
            presets.insert(miles, label.trim().to_string());
        }
        if presets.is_empty() {
            return Err(MapError::Config("no radius presets given".to_string()));
        }
        Ok(Self(presets))
    }
}

/// Settings for the POI lookup service
#[derive(Debug, Clone, PartialEq)]
pub struct LookupConfig {
    pub debounce: Duration,
    /// Decimal places coordinates are rounded to for cache keys
    pub cache_precision: usize,
    /// Maximum number of cached lookups
    pub cache_capacity: u64,
    /// Degrees within which same-named POIs are merged
    pub dedup_tolerance_deg: f64,
    pub request_timeout: Duration,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            cache_precision: 4,
            cache_capacity: 1_000,
            dedup_tolerance_deg: 0.0001,
            request_timeout: Duration::from_secs(25),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub lookup: LookupConfig,
    pub radius_presets: RadiusPresets,
    /// OSM tag POIs must carry, `key=value`
    pub poi_tag: String,
    pub nominatim_url: String,
    pub overpass_url: String,
    pub user_agent: String,
    /// Pause between geocoding requests
    pub geocode_interval: Duration,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            lookup: LookupConfig::default(),
            radius_presets: RadiusPresets::default(),
            poi_tag: DEFAULT_POI_TAG.to_string(),
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            geocode_interval: Duration::from_millis(1100),
        }
    }
}

impl MapConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any variable source; unset variables fall back
    /// to defaults, malformed ones are an error
    pub fn from_lookup<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let debounce_ms: u64 = parse_var(&var, "POI_DEBOUNCE_MS", 500)?;
        let cache_precision: usize = parse_var(&var, "POI_CACHE_PRECISION", 4)?;
        if cache_precision > 10 {
            return Err(MapError::Config(format!(
                "POI_CACHE_PRECISION must be at most 10, got {cache_precision}"
            )));
        }
        let cache_capacity: u64 = parse_var(&var, "POI_CACHE_CAPACITY", 1_000)?;
        let dedup_tolerance_deg: f64 = parse_var(&var, "POI_DEDUP_TOLERANCE_DEG", 0.0001)?;
        if !dedup_tolerance_deg.is_finite() || dedup_tolerance_deg < 0.0 {
            return Err(MapError::Config(format!(
                "POI_DEDUP_TOLERANCE_DEG must be a non-negative number, got {dedup_tolerance_deg}"
            )));
        }
        let timeout_secs: u64 = parse_var(&var, "POI_REQUEST_TIMEOUT_SECS", 25)?;
        if timeout_secs == 0 {
            return Err(MapError::Config(
                "POI_REQUEST_TIMEOUT_SECS must be positive".to_string(),
            ));
        }
        let geocode_interval_ms: u64 = parse_var(&var, "GEOCODE_INTERVAL_MS", 1100)?;

        let radius_presets = match var("RADIUS_PRESETS") {
            Some(raw) => raw.parse()?,
            None => DEFAULT_RADIUS_PRESETS.parse()?,
        };

        let poi_tag = var("POI_QUERY_TAG").unwrap_or(defaults.poi_tag);
        if !poi_tag.contains('=') {
            return Err(MapError::Config(format!(
                "POI_QUERY_TAG must be key=value, got {poi_tag:?}"
            )));
        }

        Ok(Self {
            lookup: LookupConfig {
                debounce: Duration::from_millis(debounce_ms),
                cache_precision,
                cache_capacity,
                dedup_tolerance_deg,
                request_timeout: Duration::from_secs(timeout_secs),
            },
            radius_presets,
            poi_tag,
            nominatim_url: var("NOMINATIM_URL").unwrap_or(defaults.nominatim_url),
            overpass_url: var("OVERPASS_URL").unwrap_or(defaults.overpass_url),
            user_agent: var("HTTP_USER_AGENT").unwrap_or(defaults.user_agent),
            geocode_interval: Duration::from_millis(geocode_interval_ms),
        })
    }
}

fn parse_var<F, T>(var: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| MapError::Config(format!("{name} has invalid value {raw:?}"))),
        None => Ok(default),
    }
}
