//! The rendering collaborator and the text it is handed

use serde::Serialize;

use crate::config::RadiusPresets;
use crate::geo::{format_distance, GeoPoint};
use crate::registry::{HandleId, LocationRecord};

/// Text for a location's marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerLabel {
    pub title: String,
    /// Radius label and POI count, empty before a radius is chosen
    pub subtitle: String,
    /// Full address on hover, for reverse-geocoded entries
    pub tooltip: Option<String>,
}

impl MarkerLabel {
    pub fn for_record(record: &LocationRecord, presets: &RadiusPresets) -> Self {
        let subtitle = match (record.radius_miles, &record.poi_results) {
            (None, _) => String::new(),
            (Some(miles), None) => presets.label(miles),
            (Some(miles), Some(pois)) => {
                format!("{} ({} nearby)", presets.label(miles), pois.len())
            }
        };

        Self {
            title: record.key.clone(),
            subtitle,
            tooltip: record.full_address.clone(),
        }
    }
}

/// One row of the nearby-POI list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyPoi {
    pub name: String,
    pub brand: Option<String>,
    pub coordinates: GeoPoint,
    pub distance_miles: f64,
    pub distance_label: String,
}

/// POIs of a record, nearest first
pub fn nearby_list(record: &LocationRecord) -> Vec<NearbyPoi> {
    let mut rows: Vec<NearbyPoi> = record
        .pois()
        .iter()
        .map(|poi| {
            let distance_miles = record.coordinates.distance_miles(&poi.coordinates);
            NearbyPoi {
                name: poi.name.clone(),
                brand: poi.brand.clone(),
                coordinates: poi.coordinates,
                distance_miles,
                distance_label: format_distance(distance_miles),
            }
        })
        .collect();

    rows.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
    rows
}

/// Everything pixel- or DOM-related lives behind this trait
pub trait MapView: Send + Sync {
    fn place_marker(&self, at: GeoPoint, label: &MarkerLabel) -> HandleId;

    fn update_marker(&self, marker: HandleId, label: &MarkerLabel);

    fn draw_circle(&self, center: GeoPoint, radius_meters: f64) -> HandleId;

    fn remove(&self, handle: HandleId);

    fn show_pois(&self, key: &str, pois: &[NearbyPoi]);

    /// One user-visible message
    fn notify(&self, message: &str);

    /// Put the radius selector back to "Choose One"
    fn reset_radius_selector(&self);

    /// Back to the initial state: selector disabled, nothing drawn
    fn reset(&self);
}
