//! Points of interest and the name + proximity dedup heuristic

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Display name for a point whose source record has no usable tag
pub const UNNAMED_POI: &str = "Unnamed location";

/// A discovered point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub name: String,
    pub brand: Option<String>,
    pub coordinates: GeoPoint,
}

/// A point as delivered by a POI source, before deduplication
#[derive(Debug, Clone, PartialEq)]
pub struct RawPoi {
    pub coordinates: GeoPoint,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub operator: Option<String>,
}

impl RawPoi {
    /// Name used for display: name, then brand, then operator
    fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.brand.as_deref())
            .or(self.operator.as_deref())
            .unwrap_or(UNNAMED_POI)
    }

    /// Lowercased name (or brand when the name is missing) used for identity
    fn identity(&self) -> String {
        self.name
            .as_deref()
            .or(self.brand.as_deref())
            .unwrap_or_else(|| self.display_name())
            .to_lowercase()
    }

    fn into_poi(self) -> Poi {
        let name = self.display_name().to_string();
        Poi {
            name,
            brand: self.brand,
            coordinates: self.coordinates,
        }
    }
}

/// Collapse raw points that share a name (case-insensitive) and sit within
/// `tolerance_deg` of each other on both axes. First seen wins; order is kept.
///
/// This is a heuristic: two distinct places with the same name closer than
/// the tolerance merge, and one place reported under different names does not.
pub fn dedup_pois(raw: Vec<RawPoi>, tolerance_deg: f64) -> Vec<Poi> {
    let mut kept: Vec<(String, Poi)> = Vec::with_capacity(raw.len());

    for candidate in raw {
        let identity = candidate.identity();
        let duplicate = kept.iter().any(|(id, poi)| {
            *id == identity
                && (poi.coordinates.lat - candidate.coordinates.lat).abs() < tolerance_deg
                && (poi.coordinates.lon - candidate.coordinates.lon).abs() < tolerance_deg
        });
        if !duplicate {
            kept.push((identity, candidate.into_poi()));
        }
    }

    kept.into_iter().map(|(_, poi)| poi).collect()
}
