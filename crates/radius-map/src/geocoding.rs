//! Geocoding adapter: forward and reverse lookups with input validation

use async_trait::async_trait;
use tracing::debug;

use crate::error::{MapError, Result};
use crate::geo::GeoPoint;

/// Structured address returned by a reverse lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressParts {
    pub display_name: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
}

impl AddressParts {
    /// City, else town, else village
    pub fn municipality(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
    }

    /// "Municipality, State, Postcode" from whichever parts are present,
    /// or `None` when there are none
    pub fn short_label(&self) -> Option<String> {
        let parts: Vec<&str> = [
            self.municipality(),
            self.state.as_deref(),
            self.postcode.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

/// Label pair for a reverse-geocoded point
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseLabel {
    /// Registry key
    pub short_label: String,
    pub full_address: String,
}

/// The external geocoding service
#[async_trait]
pub trait GeocodingSource: Send + Sync {
    /// Coordinates of the first candidate for `address`
    async fn forward(&self, address: &str) -> Result<GeoPoint>;

    async fn reverse(&self, point: GeoPoint) -> Result<AddressParts>;
}

pub struct GeocodingAdapter<S> {
    source: S,
}

impl<S: GeocodingSource> GeocodingAdapter<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Address text → coordinates
    pub async fn forward(&self, address_text: &str) -> Result<GeoPoint> {
        let address = address_text.trim();
        if address.is_empty() {
            return Err(MapError::Validation("Please enter an address.".to_string()));
        }

        let point = self.source.forward(address).await?;
        let point = GeoPoint::validated(point.lat, point.lon)
            .map_err(|e| MapError::Service(format!("geocoder returned {e}")))?;

        debug!(address, lat = point.lat, lon = point.lon, "Forward geocoded");
        Ok(point)
    }

    /// Coordinates → short label and full address
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseLabel> {
        let point = GeoPoint::validated(lat, lon)?;
        let parts = self.source.reverse(point).await.map_err(|e| match e {
            MapError::NotFound(_) => no_address_here(),
            other => other,
        })?;

        let full_address = parts
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(no_address_here)?;

        let short_label = parts.short_label().unwrap_or_else(|| full_address.clone());

        debug!(lat, lon, label = %short_label, "Reverse geocoded");
        Ok(ReverseLabel {
            short_label,
            full_address,
        })
    }
}

fn no_address_here() -> MapError {
    MapError::NotFound("Could not find address for this location.".to_string())
}
