//! Location registry: one record per address key, with its radius, its POI
//! results and the handles of the visuals drawn for it.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::{MapError, Result};
use crate::geo::GeoPoint;
use crate::poi::Poi;

/// Opaque reference to something the view has drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

/// Visuals owned by the view on behalf of one location
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisualHandles {
    pub marker: Option<HandleId>,
    pub circle: Option<HandleId>,
}

impl VisualHandles {
    pub fn iter(&self) -> impl Iterator<Item = HandleId> {
        self.marker.into_iter().chain(self.circle)
    }

    pub fn is_empty(&self) -> bool {
        self.marker.is_none() && self.circle.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub key: String,
    pub coordinates: GeoPoint,
    /// Full display name, only for reverse-geocoded entries
    pub full_address: Option<String>,
    pub radius_miles: Option<f64>,
    /// `None` until a lookup for the current radius completes
    pub poi_results: Option<Vec<Poi>>,
    pub visual_handles: VisualHandles,
    version: u64,
}

impl LocationRecord {
    /// POI results, empty while no lookup has completed
    pub fn pois(&self) -> &[Poi] {
        self.poi_results.as_deref().unwrap_or(&[])
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Identifies the record version a POI lookup was started for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    key: String,
    version: u64,
}

impl LookupTicket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Result of [`LocationRegistry::upsert`]
#[derive(Debug, Clone)]
pub struct Upserted {
    pub record: LocationRecord,
    /// Visuals of the replaced record, for the caller to remove
    pub released: Option<VisualHandles>,
}

/// Result of [`LocationRegistry::set_radius`]
#[derive(Debug, Clone)]
pub struct RadiusSet {
    pub record: LocationRecord,
    pub ticket: LookupTicket,
    /// Circle drawn for the previous radius, for the caller to remove
    pub released_circle: Option<HandleId>,
}

#[derive(Debug, Default)]
pub struct LocationRegistry {
    records: BTreeMap<String, LocationRecord>,
    next_version: u64,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }

    /// Create or fully replace the record for `key`. A replaced record loses
    /// its radius and POI results, and its visuals are handed back.
    pub fn upsert(
        &mut self,
        key: &str,
        coordinates: GeoPoint,
        full_address: Option<String>,
    ) -> Result<Upserted> {
        let key = normalize(key);
        if key.is_empty() {
            return Err(MapError::Validation("Please enter an address.".to_string()));
        }

        let version = self.bump();
        let record = LocationRecord {
            key: key.to_string(),
            coordinates,
            full_address,
            radius_miles: None,
            poi_results: None,
            visual_handles: VisualHandles::default(),
            version,
        };

        let released = self
            .records
            .insert(key.to_string(), record.clone())
            .map(|old| old.visual_handles);

        info!(key, lat = coordinates.lat, lon = coordinates.lon, replaced = released.is_some(), "Location stored");

        Ok(Upserted { record, released })
    }

    /// Set the radius for `key`, dropping POI results from any earlier radius.
    /// The returned ticket must accompany the POI results for this radius.
    pub fn set_radius(&mut self, key: &str, miles: f64) -> Result<RadiusSet> {
        let key = normalize(key);
        if !self.records.contains_key(key) {
            return Err(MapError::NotFound(format!("No location named {key:?}")));
        }
        if !miles.is_finite() || miles <= 0.0 {
            return Err(MapError::Validation(format!(
                "Radius must be a positive number of miles, got {miles}"
            )));
        }

        let version = self.bump();
        let Some(record) = self.records.get_mut(key) else {
            return Err(MapError::NotFound(format!("No location named {key:?}")));
        };

        record.radius_miles = Some(miles);
        record.poi_results = None;
        record.version = version;
        let released_circle = record.visual_handles.circle.take();

        debug!(key, miles, version, "Radius set");

        Ok(RadiusSet {
            record: record.clone(),
            ticket: LookupTicket {
                key: key.to_string(),
                version,
            },
            released_circle,
        })
    }

    /// Record the marker drawn for `key`. Returns false if the key is absent.
    pub fn attach_marker(&mut self, key: &str, marker: HandleId) -> bool {
        match self.records.get_mut(normalize(key)) {
            Some(record) => {
                record.visual_handles.marker = Some(marker);
                true
            }
            None => false,
        }
    }

    /// Record the circle drawn for `key`. Returns false if the key is absent.
    pub fn attach_circle(&mut self, key: &str, circle: HandleId) -> bool {
        match self.records.get_mut(normalize(key)) {
            Some(record) => {
                record.visual_handles.circle = Some(circle);
                true
            }
            None => false,
        }
    }

    /// Store POI results if the record is still the version the lookup was
    /// started for. Stale results are dropped and `false` is returned.
    pub fn attach_poi_results(&mut self, ticket: &LookupTicket, results: Vec<Poi>) -> bool {
        match self.records.get_mut(&ticket.key) {
            Some(record) if record.version == ticket.version => {
                debug!(key = %ticket.key, count = results.len(), "POI results attached");
                record.poi_results = Some(results);
                true
            }
            _ => {
                debug!(key = %ticket.key, version = ticket.version, "Dropping stale POI results");
                false
            }
        }
    }

    /// Remove the record for `key`, returning its visuals for release
    pub fn delete(&mut self, key: &str) -> Option<VisualHandles> {
        let key = normalize(key);
        let removed = self.records.remove(key)?;
        info!(key, "Location deleted");
        Some(removed.visual_handles)
    }

    /// Remove every record, returning all visuals for release
    pub fn clear(&mut self) -> Vec<VisualHandles> {
        let handles = std::mem::take(&mut self.records)
            .into_values()
            .map(|r| r.visual_handles)
            .collect::<Vec<_>>();
        info!(count = handles.len(), "All locations cleared");
        handles
    }

    pub fn get(&self, key: &str) -> Option<&LocationRecord> {
        self.records.get(normalize(key))
    }

    pub fn all(&self) -> impl Iterator<Item = &LocationRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any location has a radius drawn
    pub fn has_radii(&self) -> bool {
        self.records.values().any(|r| r.radius_miles.is_some())
    }
}

/// Keys are compared without surrounding whitespace
fn normalize(key: &str) -> &str {
    key.trim()
}
