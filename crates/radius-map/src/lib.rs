//! State behind a radius map: searched or clicked addresses, the radius drawn
//! around each, and the points of interest found inside it.
//!
//! Rendering is left to a [`MapView`] implementation; geocoding and POI
//! discovery sit behind [`GeocodingSource`] and [`PoiSource`], with
//! Nominatim and Overpass implementations in [`sources`].

pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod geo;
pub mod geocoding;
pub mod lookup;
pub mod poi;
pub mod registry;
pub mod sources;
pub mod view;

pub use config::{LookupConfig, MapConfig, RadiusPresets};
pub use controller::MapController;
pub use error::{MapError, Result};
pub use geo::{format_distance, haversine_miles, miles_to_meters, GeoPoint, MILES_TO_METERS};
pub use geocoding::{AddressParts, GeocodingAdapter, GeocodingSource, ReverseLabel};
pub use lookup::{CacheStats, LookupOutcome, PoiLookupService, PoiSource};
pub use poi::{dedup_pois, Poi, RawPoi};
pub use registry::{HandleId, LocationRecord, LocationRegistry, VisualHandles};
pub use sources::OverpassPoiSource;
pub use view::{nearby_list, MapView, MarkerLabel, NearbyPoi};
