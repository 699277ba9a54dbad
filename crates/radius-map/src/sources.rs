//! Bindings from the HTTP clients to the geocoding and POI seams

use async_trait::async_trait;
use nominatim_client::{NominatimClient, ReverseMatch};
use overpass_client::{OverpassClient, RawPoint, TagFilter};

use crate::error::Result;
use crate::geo::GeoPoint;
use crate::geocoding::{AddressParts, GeocodingSource};
use crate::lookup::PoiSource;
use crate::poi::RawPoi;

#[async_trait]
impl GeocodingSource for NominatimClient {
    async fn forward(&self, address: &str) -> Result<GeoPoint> {
        let hit = self.search(address).await?;
        Ok(GeoPoint::new(hit.latitude, hit.longitude))
    }

    async fn reverse(&self, point: GeoPoint) -> Result<AddressParts> {
        let hit = self.reverse_geocode(point.lat, point.lon).await?;
        Ok(hit.into())
    }
}

impl From<ReverseMatch> for AddressParts {
    fn from(m: ReverseMatch) -> Self {
        Self {
            display_name: Some(m.display_name),
            city: m.city,
            town: m.town,
            village: m.village,
            state: m.state,
            postcode: m.postcode,
        }
    }
}

/// Overpass queries for one tag, e.g. `shop=car`
pub struct OverpassPoiSource {
    client: OverpassClient,
    filter: TagFilter,
}

impl OverpassPoiSource {
    pub fn new(client: OverpassClient, filter: TagFilter) -> Self {
        Self { client, filter }
    }
}

#[async_trait]
impl PoiSource for OverpassPoiSource {
    async fn nearby(&self, center: GeoPoint, radius_meters: f64) -> Result<Vec<RawPoi>> {
        let points = self
            .client
            .around(center.lat, center.lon, radius_meters, &self.filter)
            .await?;
        Ok(points.into_iter().map(RawPoi::from).collect())
    }
}

impl From<RawPoint> for RawPoi {
    fn from(p: RawPoint) -> Self {
        Self {
            coordinates: GeoPoint::new(p.latitude, p.longitude),
            name: p.name,
            brand: p.brand,
            operator: p.operator,
        }
    }
}
