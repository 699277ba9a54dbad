use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use radius_map::{
    AddressParts, GeoPoint, GeocodingSource, HandleId, MapConfig, MapController, MapError,
    MapView, MarkerLabel, NearbyPoi, PoiSource, RawPoi, Result,
};

#[derive(Default)]
struct FakeGeocoder {
    addresses: HashMap<String, GeoPoint>,
    reverse: Option<AddressParts>,
    unavailable: bool,
}

impl FakeGeocoder {
    fn with_address(mut self, address: &str, lat: f64, lon: f64) -> Self {
        self.addresses
            .insert(address.to_lowercase(), GeoPoint::new(lat, lon));
        self
    }
}

#[async_trait]
impl GeocodingSource for FakeGeocoder {
    async fn forward(&self, address: &str) -> Result<GeoPoint> {
        if self.unavailable {
            return Err(MapError::Service("Nominatim returned status 503".to_string()));
        }
        self.addresses
            .get(&address.to_lowercase())
            .copied()
            .ok_or_else(|| MapError::NotFound("Address not found.".to_string()))
    }

    async fn reverse(&self, _point: GeoPoint) -> Result<AddressParts> {
        self.reverse
            .clone()
            .ok_or_else(|| MapError::NotFound("nothing here".to_string()))
    }
}

/// Two dealers (one listed twice), plus a third for radii over 20 miles
#[derive(Default)]
struct FakeDealers {
    delay: Duration,
    fail: bool,
}

#[async_trait]
impl PoiSource for FakeDealers {
    async fn nearby(&self, center: GeoPoint, radius_meters: f64) -> Result<Vec<RawPoi>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(MapError::Service("Overpass returned status 429".to_string()));
        }

        let dealer = |name: &str, dlat: f64| RawPoi {
            coordinates: GeoPoint::new(center.lat + dlat, center.lon),
            name: Some(name.to_string()),
            brand: None,
            operator: None,
        };
        let mut points = vec![
            dealer("Valley Auto", 0.1),
            // Same dealer listed twice, a few meters apart
            dealer("Main Street Motors", 0.01),
            dealer("main street motors", 0.01004),
        ];
        if radius_meters > 20.0 * 1609.34 {
            points.push(dealer("Highway Cars", 0.35));
        }
        Ok(points)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Marker(HandleId, MarkerLabel),
    MarkerUpdated(HandleId, MarkerLabel),
    Circle(HandleId, f64),
    Removed(HandleId),
    Pois(String, Vec<NearbyPoi>),
    Notice(String),
    SelectorReset,
    Reset,
}

#[derive(Default)]
struct RecordingView {
    next: AtomicU64,
    live: Mutex<BTreeSet<HandleId>>,
    events: Mutex<Vec<Event>>,
}

impl RecordingView {
    fn handle(&self) -> HandleId {
        let id = HandleId(self.next.fetch_add(1, Ordering::SeqCst) + 1);
        self.live.lock().unwrap().insert(id);
        id
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn live(&self) -> BTreeSet<HandleId> {
        self.live.lock().unwrap().clone()
    }

    fn notices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Notice(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn poi_lists(&self) -> Vec<(String, Vec<NearbyPoi>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Pois(key, pois) => Some((key, pois)),
                _ => None,
            })
            .collect()
    }

    fn last_label(&self, marker: HandleId) -> Option<MarkerLabel> {
        self.events().into_iter().rev().find_map(|e| match e {
            Event::Marker(id, label) | Event::MarkerUpdated(id, label) if id == marker => {
                Some(label)
            }
            _ => None,
        })
    }
}

impl MapView for RecordingView {
    fn place_marker(&self, _at: GeoPoint, label: &MarkerLabel) -> HandleId {
        let id = self.handle();
        self.record(Event::Marker(id, label.clone()));
        id
    }

    fn update_marker(&self, marker: HandleId, label: &MarkerLabel) {
        self.record(Event::MarkerUpdated(marker, label.clone()));
    }

    fn draw_circle(&self, _center: GeoPoint, radius_meters: f64) -> HandleId {
        let id = self.handle();
        self.record(Event::Circle(id, radius_meters));
        id
    }

    fn remove(&self, handle: HandleId) {
        assert!(self.live.lock().unwrap().remove(&handle), "{handle:?} removed twice");
        self.record(Event::Removed(handle));
    }

    fn show_pois(&self, key: &str, pois: &[NearbyPoi]) {
        self.record(Event::Pois(key.to_string(), pois.to_vec()));
    }

    fn notify(&self, message: &str) {
        self.record(Event::Notice(message.to_string()));
    }

    fn reset_radius_selector(&self) {
        self.record(Event::SelectorReset);
    }

    fn reset(&self) {
        self.record(Event::Reset);
    }
}

type Controller = MapController<FakeGeocoder, FakeDealers, RecordingView>;

const SPRINGFIELD: &str = "123 Main St, Springfield";
const SHELBYVILLE: &str = "1 Oak Ave, Shelbyville";

fn geocoder() -> FakeGeocoder {
    FakeGeocoder::default()
        .with_address(SPRINGFIELD, 39.78, -89.65)
        .with_address(SHELBYVILLE, 39.40, -88.80)
}

fn controller(geocoder: FakeGeocoder, dealers: FakeDealers) -> Controller {
    MapController::new(geocoder, dealers, RecordingView::default(), &MapConfig::default())
}

/// Every handle the view still shows belongs to exactly one record
async fn assert_handles_consistent(c: &Controller) {
    let owned: BTreeSet<HandleId> = c
        .locations()
        .await
        .iter()
        .flat_map(|r| r.visual_handles.iter())
        .collect();
    assert_eq!(owned, c.view().live());
}

#[tokio::test(start_paused = true)]
async fn test_search_places_marker_and_activates() {
    let c = controller(geocoder(), FakeDealers::default());

    c.on_search(SPRINGFIELD).await;

    let record = c.location(SPRINGFIELD).await.unwrap();
    assert_eq!(record.coordinates, GeoPoint::new(39.78, -89.65));
    assert_eq!(record.radius_miles, None);
    assert!(record.visual_handles.marker.is_some());
    assert!(record.visual_handles.circle.is_none());
    assert_eq!(c.active_location().await.as_deref(), Some(SPRINGFIELD));
    assert!(!c.has_radii().await);
    assert_handles_consistent(&c).await;
}

#[tokio::test(start_paused = true)]
async fn test_search_trims_key() {
    let c = controller(geocoder(), FakeDealers::default());

    c.on_search(&format!("  {SPRINGFIELD} ")).await;

    assert!(c.location(SPRINGFIELD).await.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_searching_same_address_replaces_visuals() {
    let c = controller(geocoder(), FakeDealers::default());

    c.on_search(SPRINGFIELD).await;
    c.on_radius_chosen(SPRINGFIELD, 15.0).await;
    c.on_search(SPRINGFIELD).await;

    let records = c.locations().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].radius_miles, None);
    assert_eq!(records[0].poi_results, None);
    assert_eq!(c.view().live().len(), 1);
    assert_handles_consistent(&c).await;
}

#[tokio::test(start_paused = true)]
async fn test_unknown_address_notifies_and_changes_nothing() {
    let c = controller(geocoder(), FakeDealers::default());

    c.on_search("Atlantis").await;

    assert!(c.locations().await.is_empty());
    assert_eq!(c.view().notices(), vec!["Address not found."]);
}

#[tokio::test(start_paused = true)]
async fn test_blank_search_asks_for_address() {
    let c = controller(geocoder(), FakeDealers::default());

    c.on_search("   ").await;

    assert_eq!(c.view().notices(), vec!["Please enter an address."]);
}

#[tokio::test(start_paused = true)]
async fn test_geocoder_outage_shows_generic_message() {
    let mut g = geocoder();
    g.unavailable = true;
    let c = controller(g, FakeDealers::default());

    c.on_search(SPRINGFIELD).await;

    assert_eq!(
        c.view().notices(),
        vec!["There was an error processing your request."]
    );
}

#[tokio::test(start_paused = true)]
async fn test_radius_draws_circle_and_lists_pois() {
    let c = controller(geocoder(), FakeDealers::default());
    c.on_search(SPRINGFIELD).await;

    c.on_radius_chosen(SPRINGFIELD, 15.0).await;

    let record = c.location(SPRINGFIELD).await.unwrap();
    assert_eq!(record.radius_miles, Some(15.0));
    assert_eq!(record.pois().len(), 2);
    assert!(c.has_radii().await);

    let circles: Vec<f64> = c
        .view()
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Circle(_, meters) => Some(meters),
            _ => None,
        })
        .collect();
    assert_eq!(circles.len(), 1);
    assert!((circles[0] - 24140.1).abs() < 1e-6);

    let lists = c.view().poi_lists();
    assert_eq!(lists.len(), 1);
    let (key, pois) = &lists[0];
    assert_eq!(key, SPRINGFIELD);
    assert_eq!(pois[0].name, "Main Street Motors");
    assert_eq!(pois[1].name, "Valley Auto");
    assert!(pois[0].distance_miles < pois[1].distance_miles);
    // ~0.7 mi reads in feet, ~6.9 mi in miles
    assert!(pois[0].distance_label.ends_with(" ft"));
    assert_eq!(pois[1].distance_label, "6.9 mi");

    let marker = record.visual_handles.marker.unwrap();
    let label = c.view().last_label(marker).unwrap();
    assert_eq!(label.title, SPRINGFIELD);
    assert_eq!(label.subtitle, "Small - 15 mi (2 nearby)");
    assert_handles_consistent(&c).await;
}

#[tokio::test(start_paused = true)]
async fn test_radius_without_location_asks_for_search() {
    let c = controller(geocoder(), FakeDealers::default());

    c.on_radius_chosen("nowhere", 15.0).await;
    c.on_radius_chosen_for_active(30.0).await;

    assert_eq!(
        c.view().notices(),
        vec![
            "Please search for an address first.",
            "Please search for an address first."
        ]
    );
    let resets = c
        .view()
        .events()
        .into_iter()
        .filter(|e| *e == Event::SelectorReset)
        .count();
    assert_eq!(resets, 2);
    assert_eq!(c.view().live().len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_radius_is_rejected() {
    let c = controller(geocoder(), FakeDealers::default());
    c.on_search(SPRINGFIELD).await;

    c.on_radius_chosen(SPRINGFIELD, -5.0).await;

    assert_eq!(c.location(SPRINGFIELD).await.unwrap().radius_miles, None);
    assert!(c.view().events().contains(&Event::SelectorReset));
    assert!(!c.has_radii().await);
}

#[tokio::test(start_paused = true)]
async fn test_changing_radius_replaces_circle() {
    let c = controller(geocoder(), FakeDealers::default());
    c.on_search(SPRINGFIELD).await;

    c.on_radius_chosen(SPRINGFIELD, 15.0).await;
    c.on_radius_chosen(SPRINGFIELD, 30.0).await;

    let record = c.location(SPRINGFIELD).await.unwrap();
    assert_eq!(record.radius_miles, Some(30.0));
    assert_eq!(record.pois().len(), 3);
    assert_eq!(c.view().live().len(), 2);
    assert_handles_consistent(&c).await;
}

#[tokio::test(start_paused = true)]
async fn test_rapid_radius_change_keeps_only_latest_results() {
    let dealers = FakeDealers {
        delay: Duration::from_millis(300),
        ..FakeDealers::default()
    };
    let c = controller(geocoder(), dealers);
    c.on_search(SPRINGFIELD).await;

    tokio::join!(c.on_radius_chosen(SPRINGFIELD, 15.0), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        c.on_radius_chosen(SPRINGFIELD, 30.0).await;
    });

    let record = c.location(SPRINGFIELD).await.unwrap();
    assert_eq!(record.radius_miles, Some(30.0));
    assert_eq!(record.pois().len(), 3);
    assert_eq!(c.cache_stats().misses, 2);
    assert_eq!(c.view().poi_lists().len(), 1);
    assert_handles_consistent(&c).await;
}

#[tokio::test(start_paused = true)]
async fn test_results_for_replaced_record_are_discarded() {
    let dealers = FakeDealers {
        delay: Duration::from_secs(2),
        ..FakeDealers::default()
    };
    let c = controller(geocoder(), dealers);
    c.on_search(SPRINGFIELD).await;

    tokio::join!(c.on_radius_chosen(SPRINGFIELD, 15.0), async {
        // Lands after the debounce, while the query is in flight
        tokio::time::sleep(Duration::from_millis(800)).await;
        c.on_search(SPRINGFIELD).await;
    });

    let record = c.location(SPRINGFIELD).await.unwrap();
    assert_eq!(record.radius_miles, None);
    assert_eq!(record.poi_results, None);
    assert!(c.view().poi_lists().is_empty());
    assert_handles_consistent(&c).await;
}

#[tokio::test(start_paused = true)]
async fn test_results_for_deleted_record_are_discarded() {
    let dealers = FakeDealers {
        delay: Duration::from_secs(2),
        ..FakeDealers::default()
    };
    let c = controller(geocoder(), dealers);
    c.on_search(SPRINGFIELD).await;

    tokio::join!(c.on_radius_chosen(SPRINGFIELD, 15.0), async {
        tokio::time::sleep(Duration::from_millis(800)).await;
        c.on_delete_requested(SPRINGFIELD).await;
    });

    assert!(c.locations().await.is_empty());
    assert!(c.view().poi_lists().is_empty());
    assert!(c.view().live().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_lookup_shows_empty_list() {
    let dealers = FakeDealers {
        fail: true,
        ..FakeDealers::default()
    };
    let c = controller(geocoder(), dealers);
    c.on_search(SPRINGFIELD).await;

    c.on_radius_chosen(SPRINGFIELD, 15.0).await;

    let record = c.location(SPRINGFIELD).await.unwrap();
    assert_eq!(record.poi_results, Some(Vec::new()));
    assert!(c.view().notices().is_empty());
    let marker = record.visual_handles.marker.unwrap();
    assert_eq!(
        c.view().last_label(marker).unwrap().subtitle,
        "Small - 15 mi (0 nearby)"
    );
}

#[tokio::test(start_paused = true)]
async fn test_repeat_lookup_is_served_from_cache() {
    let c = controller(geocoder(), FakeDealers::default());

    c.on_search(SPRINGFIELD).await;
    c.on_radius_chosen(SPRINGFIELD, 15.0).await;
    c.on_delete_requested(SPRINGFIELD).await;
    c.on_search(SPRINGFIELD).await;
    c.on_radius_chosen(SPRINGFIELD, 15.0).await;

    let stats = c.cache_stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));
    assert_eq!(c.location(SPRINGFIELD).await.unwrap().pois().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_delete_removes_visuals_and_is_idempotent() {
    let c = controller(geocoder(), FakeDealers::default());
    c.on_search(SPRINGFIELD).await;
    c.on_search(SHELBYVILLE).await;
    c.on_radius_chosen(SPRINGFIELD, 15.0).await;

    c.on_delete_requested(SPRINGFIELD).await;
    c.on_delete_requested(SPRINGFIELD).await;
    c.on_delete_requested("never added").await;

    assert!(c.location(SPRINGFIELD).await.is_none());
    assert!(c.location(SHELBYVILLE).await.is_some());
    assert!(!c.has_radii().await);
    assert_eq!(c.active_location().await, None);
    assert_handles_consistent(&c).await;
}

#[tokio::test(start_paused = true)]
async fn test_circle_click_selects_for_deletion() {
    let c = controller(geocoder(), FakeDealers::default());
    c.on_search(SPRINGFIELD).await;

    assert!(!c.on_circle_clicked(SPRINGFIELD).await);
    c.on_radius_chosen(SPRINGFIELD, 15.0).await;
    assert!(c.on_circle_clicked(SPRINGFIELD).await);
    assert_eq!(c.selected_location().await.as_deref(), Some(SPRINGFIELD));

    c.on_delete_selected().await;

    assert!(c.locations().await.is_empty());
    assert_eq!(c.selected_location().await, None);
    assert!(c.view().live().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clear_all_resets_everything() {
    let c = controller(geocoder(), FakeDealers::default());
    c.on_search(SPRINGFIELD).await;
    c.on_search(SHELBYVILLE).await;
    c.on_radius_chosen(SPRINGFIELD, 15.0).await;
    c.on_radius_chosen(SHELBYVILLE, 30.0).await;

    c.on_clear_all().await;

    assert!(c.locations().await.is_empty());
    assert!(c.view().live().is_empty());
    assert!(!c.has_radii().await);
    assert_eq!(c.active_location().await, None);
    assert_eq!(c.view().events().last(), Some(&Event::Reset));
}

#[tokio::test(start_paused = true)]
async fn test_map_click_ignored_unless_pin_mode() {
    let mut g = geocoder();
    g.reverse = Some(AddressParts {
        display_name: Some("Capitol, Springfield, Sangamon County, Illinois, 62701".to_string()),
        city: Some("Springfield".to_string()),
        state: Some("IL".to_string()),
        postcode: Some("62701".to_string()),
        ..AddressParts::default()
    });
    let c = controller(g, FakeDealers::default());

    c.on_map_clicked(39.8, -89.65).await;
    assert!(c.locations().await.is_empty());

    c.on_pin_mode_toggled(true).await;
    c.on_map_clicked(39.8, -89.65).await;

    let record = c.location("Springfield, IL, 62701").await.unwrap();
    assert_eq!(record.coordinates, GeoPoint::new(39.8, -89.65));
    let marker = record.visual_handles.marker.unwrap();
    assert_eq!(
        c.view().last_label(marker).unwrap().tooltip.as_deref(),
        Some("Capitol, Springfield, Sangamon County, Illinois, 62701")
    );
    assert_eq!(
        c.view().notices(),
        vec![
            "Turn on \"Add Pins by Clicking Map\" to place pins",
            "Click-to-add is turned ON"
        ]
    );
    assert_eq!(
        c.active_location().await.as_deref(),
        Some("Springfield, IL, 62701")
    );
}

#[tokio::test(start_paused = true)]
async fn test_map_click_drops_selection_and_reminds() {
    let c = controller(geocoder(), FakeDealers::default());
    c.on_search(SPRINGFIELD).await;
    c.on_radius_chosen(SPRINGFIELD, 15.0).await;
    assert!(c.on_circle_clicked(SPRINGFIELD).await);
    assert_eq!(c.selected_location().await.as_deref(), Some(SPRINGFIELD));

    c.on_map_clicked(40.5, -75.5).await;

    assert_eq!(c.selected_location().await, None);
    assert_eq!(
        c.view().notices(),
        vec!["Turn on \"Add Pins by Clicking Map\" to place pins"]
    );

    // Nothing is selected any more, so delete is a no-op
    c.on_delete_selected().await;
    assert!(c.location(SPRINGFIELD).await.is_some());
    assert_eq!(c.locations().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_map_click_without_address_notifies() {
    let c = controller(geocoder(), FakeDealers::default());
    c.on_pin_mode_toggled(true).await;

    c.on_map_clicked(0.0, -30.0).await;
    c.on_pin_mode_toggled(false).await;

    assert!(c.locations().await.is_empty());
    assert_eq!(
        c.view().notices(),
        vec![
            "Click-to-add is turned ON",
            "Could not find address for this location.",
            "Click-to-add is turned OFF"
        ]
    );
    assert!(!c.pin_mode().await);
}

#[tokio::test(start_paused = true)]
async fn test_selected_location_receives_radius() {
    let c = controller(geocoder(), FakeDealers::default());
    c.on_search(SPRINGFIELD).await;
    c.on_radius_chosen(SPRINGFIELD, 15.0).await;
    c.on_search(SHELBYVILLE).await;

    let selected = c.on_location_selected(SPRINGFIELD).await.unwrap();
    assert_eq!(selected.radius_miles, Some(15.0));
    c.on_radius_chosen_for_active(30.0).await;

    assert_eq!(
        c.location(SPRINGFIELD).await.unwrap().radius_miles,
        Some(30.0)
    );
    assert_eq!(c.location(SHELBYVILLE).await.unwrap().radius_miles, None);
    assert!(c.on_location_selected("elsewhere").await.is_none());
}
