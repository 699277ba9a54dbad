//! Map interaction controller: turns UI events into registry changes,
//! geocoding calls, POI lookups and view updates

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::{MapConfig, RadiusPresets};
use crate::error::{MapError, Result};
use crate::geo::{miles_to_meters, GeoPoint};
use crate::geocoding::{GeocodingAdapter, GeocodingSource};
use crate::lookup::{CacheStats, LookupOutcome, PoiLookupService, PoiSource};
use crate::registry::{LocationRecord, LocationRegistry, VisualHandles};
use crate::view::{nearby_list, MapView, MarkerLabel};

const NO_ACTIVE_LOCATION: &str = "Please search for an address first.";
const PIN_MODE_REMINDER: &str = "Turn on \"Add Pins by Clicking Map\" to place pins";

/// Mutable session state, only touched between awaits
#[derive(Debug, Default)]
struct Session {
    registry: LocationRegistry,
    /// Location the radius selector applies to
    active: Option<String>,
    /// Location whose circle was clicked, offered for deletion
    selected: Option<String>,
    /// Click-to-place mode
    pin_mode: bool,
}

pub struct MapController<G, P, V> {
    geocoder: GeocodingAdapter<G>,
    lookup: PoiLookupService<P>,
    view: V,
    presets: RadiusPresets,
    session: Mutex<Session>,
}

impl<G, P, V> MapController<G, P, V>
where
    G: GeocodingSource,
    P: PoiSource,
    V: MapView,
{
    pub fn new(geocoder: G, poi_source: P, view: V, config: &MapConfig) -> Self {
        Self {
            geocoder: GeocodingAdapter::new(geocoder),
            lookup: PoiLookupService::new(poi_source, config.lookup.clone()),
            view,
            presets: config.radius_presets.clone(),
            session: Mutex::new(Session::default()),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn presets(&self) -> &RadiusPresets {
        &self.presets
    }

    /// User searched for an address
    pub async fn on_search(&self, address_text: &str) {
        if let Err(e) = self.search(address_text).await {
            self.report(&e);
        }
    }

    /// User clicked the map. Any click drops the delete selection; only
    /// click-to-place mode adds a location.
    pub async fn on_map_clicked(&self, lat: f64, lon: f64) {
        let pin_mode = {
            let mut session = self.session.lock().await;
            session.selected = None;
            session.pin_mode
        };
        if !pin_mode {
            debug!(lat, lon, "Map click ignored, click-to-place is off");
            self.view.notify(PIN_MODE_REMINDER);
            return;
        }
        if let Err(e) = self.place_clicked(lat, lon).await {
            self.report(&e);
        }
    }

    /// User picked a radius for `key`
    pub async fn on_radius_chosen(&self, key: &str, miles: f64) {
        if let Err(e) = self.choose_radius(key, miles).await {
            if matches!(e, MapError::Validation(_)) {
                self.view.reset_radius_selector();
            }
            self.report(&e);
        }
    }

    /// User picked a radius in the selector, which targets the active location
    pub async fn on_radius_chosen_for_active(&self, miles: f64) {
        let active = self.session.lock().await.active.clone();
        match active {
            Some(key) => self.on_radius_chosen(&key, miles).await,
            None => {
                self.view.reset_radius_selector();
                self.report(&MapError::Validation(NO_ACTIVE_LOCATION.to_string()));
            }
        }
    }

    /// User asked to delete `key`. Unknown keys are ignored.
    pub async fn on_delete_requested(&self, key: &str) {
        let mut session = self.session.lock().await;
        let Some(handles) = session.registry.delete(key) else {
            debug!(key, "Delete of unknown location ignored");
            return;
        };
        self.release(handles);

        if session.selected.as_deref() == Some(key) {
            session.selected = None;
        }
        if session.active.as_deref() == Some(key) {
            session.active = None;
            self.view.reset_radius_selector();
        }
    }

    /// Delete whichever location is selected, if any
    pub async fn on_delete_selected(&self) {
        let selected = self.session.lock().await.selected.clone();
        match selected {
            Some(key) => self.on_delete_requested(&key).await,
            None => debug!("Delete requested with nothing selected"),
        }
    }

    /// User asked to clear everything
    pub async fn on_clear_all(&self) {
        let mut session = self.session.lock().await;
        for handles in session.registry.clear() {
            self.release(handles);
        }
        session.active = None;
        session.selected = None;
        self.view.reset();
    }

    pub async fn on_pin_mode_toggled(&self, enabled: bool) {
        self.session.lock().await.pin_mode = enabled;
        info!(enabled, "Click-to-place toggled");
        self.view.notify(if enabled {
            "Click-to-add is turned ON"
        } else {
            "Click-to-add is turned OFF"
        });
    }

    /// User clicked a location's label: make it the active location.
    /// Returns the record so the selector can show its current radius.
    pub async fn on_location_selected(&self, key: &str) -> Option<LocationRecord> {
        let mut session = self.session.lock().await;
        let record = session.registry.get(key)?.clone();
        session.active = Some(record.key.clone());
        Some(record)
    }

    /// User clicked a location's circle: offer it for deletion
    pub async fn on_circle_clicked(&self, key: &str) -> bool {
        let mut session = self.session.lock().await;
        let has_circle = session
            .registry
            .get(key)
            .is_some_and(|r| r.visual_handles.circle.is_some());
        if has_circle {
            session.selected = Some(key.to_string());
        }
        has_circle
    }

    pub async fn location(&self, key: &str) -> Option<LocationRecord> {
        self.session.lock().await.registry.get(key).cloned()
    }

    pub async fn locations(&self) -> Vec<LocationRecord> {
        self.session.lock().await.registry.all().cloned().collect()
    }

    pub async fn active_location(&self) -> Option<String> {
        self.session.lock().await.active.clone()
    }

    pub async fn selected_location(&self) -> Option<String> {
        self.session.lock().await.selected.clone()
    }

    pub async fn pin_mode(&self) -> bool {
        self.session.lock().await.pin_mode
    }

    /// Whether any radius is drawn (the clear-all control is shown)
    pub async fn has_radii(&self) -> bool {
        self.session.lock().await.registry.has_radii()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.lookup.cache_stats()
    }

    async fn search(&self, address_text: &str) -> Result<()> {
        let point = self.geocoder.forward(address_text).await?;
        let mut session = self.session.lock().await;
        self.place(&mut session, address_text.trim(), point, None)
    }

    async fn place_clicked(&self, lat: f64, lon: f64) -> Result<()> {
        let label = self.geocoder.reverse(lat, lon).await?;
        let point = GeoPoint::validated(lat, lon)?;
        let mut session = self.session.lock().await;
        self.place(
            &mut session,
            &label.short_label,
            point,
            Some(label.full_address),
        )
    }

    fn place(
        &self,
        session: &mut Session,
        key: &str,
        point: GeoPoint,
        full_address: Option<String>,
    ) -> Result<()> {
        let upserted = session.registry.upsert(key, point, full_address)?;
        if let Some(old) = upserted.released {
            self.release(old);
        }

        let record = upserted.record;
        let marker = self
            .view
            .place_marker(point, &MarkerLabel::for_record(&record, &self.presets));
        session.registry.attach_marker(&record.key, marker);

        if session.selected.as_deref() == Some(record.key.as_str()) {
            session.selected = None;
        }
        session.active = Some(record.key);
        Ok(())
    }

    async fn choose_radius(&self, key: &str, miles: f64) -> Result<()> {
        let (ticket, center) = {
            let mut session = self.session.lock().await;
            if session.registry.get(key).is_none() {
                return Err(MapError::Validation(NO_ACTIVE_LOCATION.to_string()));
            }

            let set = session.registry.set_radius(key, miles)?;
            if let Some(circle) = set.released_circle {
                self.view.remove(circle);
            }
            let center = set.record.coordinates;
            let circle = self.view.draw_circle(center, miles_to_meters(miles));
            session.registry.attach_circle(key, circle);
            self.refresh_marker(&session.registry, key);
            session.active = Some(key.to_string());

            (set.ticket, center)
        };

        let pois = match self.lookup.lookup(center, miles).await {
            LookupOutcome::Found(pois) => pois,
            LookupOutcome::Failed => {
                warn!(key, miles, "Nearby search failed, showing no results");
                Vec::new()
            }
            LookupOutcome::Superseded => {
                debug!(key, miles, "Nearby search superseded by a newer one");
                return Ok(());
            }
        };

        let mut session = self.session.lock().await;
        if !session.registry.attach_poi_results(&ticket, pois) {
            return Ok(());
        }
        self.refresh_marker(&session.registry, key);
        if let Some(record) = session.registry.get(key) {
            info!(key, miles, count = record.pois().len(), "Nearby results ready");
            self.view.show_pois(key, &nearby_list(record));
        }
        Ok(())
    }

    fn refresh_marker(&self, registry: &LocationRegistry, key: &str) {
        if let Some(record) = registry.get(key) {
            if let Some(marker) = record.visual_handles.marker {
                self.view
                    .update_marker(marker, &MarkerLabel::for_record(record, &self.presets));
            }
        }
    }

    fn release(&self, handles: VisualHandles) {
        for handle in handles.iter() {
            self.view.remove(handle);
        }
    }

    fn report(&self, err: &MapError) {
        match err {
            MapError::Service(_) | MapError::Config(_) => error!(error = %err, "Request failed"),
            MapError::NotFound(_) | MapError::Validation(_) => warn!(error = %err, "Request rejected"),
        }
        self.view.notify(&err.user_message());
    }
}
