use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// An OSM `key=value` tag that selected elements must carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
}

impl TagFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Default for TagFilter {
    /// Car dealerships
    fn default() -> Self {
        Self::new("shop", "car")
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for TagFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got {s:?}"))?;
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            return Err(format!("expected key=value, got {s:?}"));
        }
        Ok(Self::new(key, value))
    }
}

/// A point returned by the interpreter, before any deduplication
#[derive(Debug, Clone, PartialEq)]
pub struct RawPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub operator: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverpassResponse {
    #[serde(default)]
    pub(crate) elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverpassElement {
    pub(crate) lat: Option<f64>,
    pub(crate) lon: Option<f64>,
    /// Present on ways/relations queried with `out center`
    pub(crate) center: Option<OverpassCenter>,
    #[serde(default)]
    pub(crate) tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverpassCenter {
    pub(crate) lat: f64,
    pub(crate) lon: f64,
}

impl OverpassElement {
    /// Elements with no usable position are dropped
    pub(crate) fn into_point(mut self) -> Option<RawPoint> {
        let (latitude, longitude) = match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => (lat, lon),
            (_, _, Some(c)) => (c.lat, c.lon),
            _ => return None,
        };

        let mut tag = |k: &str| self.tags.remove(k).filter(|v| !v.trim().is_empty());
        let name = tag("name");
        let brand = tag("brand");
        let operator = tag("operator");

        Some(RawPoint {
            latitude,
            longitude,
            name,
            brand,
            operator,
        })
    }
}
