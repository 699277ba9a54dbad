//! Coordinates, unit conversion and great-circle distance

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::error::{MapError, Result};

pub const MILES_TO_METERS: f64 = 1609.34;
pub const FEET_PER_MILE: f64 = 5280.0;
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// A WGS84 latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a point, rejecting non-finite or out-of-range values
    pub fn validated(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(MapError::Validation(format!(
                "Invalid coordinates: {lat}, {lon}"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(MapError::Validation(format!(
                "Coordinates out of range: {lat}, {lon}"
            )));
        }
        Ok(Self { lat, lon })
    }

    pub fn distance_miles(&self, other: &GeoPoint) -> f64 {
        haversine_miles(*self, *other)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lon)
    }
}

pub fn miles_to_meters(miles: f64) -> f64 {
    miles * MILES_TO_METERS
}

pub fn meters_to_miles(meters: f64) -> f64 {
    meters / MILES_TO_METERS
}

/// Haversine distance between two points in miles
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let to_rad = |deg: f64| deg * PI / 180.0;

    let dlat = to_rad(b.lat - a.lat);
    let dlon = to_rad(b.lon - a.lon);

    let h = (dlat / 2.0).sin().powi(2)
        + to_rad(a.lat).cos() * to_rad(b.lat).cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// Human distance: whole feet under a mile, tenths of a mile otherwise
pub fn format_distance(miles: f64) -> String {
    if miles < 1.0 {
        format!("{:.0} ft", miles * FEET_PER_MILE)
    } else {
        format!("{:.1} mi", miles)
    }
}
