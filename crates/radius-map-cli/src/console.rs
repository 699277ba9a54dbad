//! A [`MapView`] that prints to the terminal

use std::sync::atomic::{AtomicU64, Ordering};

use radius_map::{GeoPoint, HandleId, MapView, MarkerLabel, NearbyPoi};

#[derive(Debug, Default)]
pub struct ConsoleView {
    next_handle: AtomicU64,
}

impl ConsoleView {
    fn handle(&self) -> HandleId {
        HandleId(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

pub fn describe_marker(label: &MarkerLabel) -> String {
    let mut line = label.title.clone();
    if !label.subtitle.is_empty() {
        line.push_str(&format!(" [{}]", label.subtitle));
    }
    if let Some(tooltip) = &label.tooltip {
        line.push_str(&format!(" ({tooltip})"));
    }
    line
}

impl MapView for ConsoleView {
    fn place_marker(&self, at: GeoPoint, label: &MarkerLabel) -> HandleId {
        let id = self.handle();
        println!("+ marker #{} at {}: {}", id.0, at, describe_marker(label));
        id
    }

    fn update_marker(&self, marker: HandleId, label: &MarkerLabel) {
        println!("~ marker #{}: {}", marker.0, describe_marker(label));
    }

    fn draw_circle(&self, center: GeoPoint, radius_meters: f64) -> HandleId {
        let id = self.handle();
        println!("+ circle #{} around {}, {:.0} m", id.0, center, radius_meters);
        id
    }

    fn remove(&self, handle: HandleId) {
        println!("- #{}", handle.0);
    }

    fn show_pois(&self, key: &str, pois: &[NearbyPoi]) {
        println!("{} nearby {}:", pois.len(), key);
        for poi in pois {
            match &poi.brand {
                Some(brand) if *brand != poi.name => {
                    println!("  {:>9}  {} ({})", poi.distance_label, poi.name, brand)
                }
                _ => println!("  {:>9}  {}", poi.distance_label, poi.name),
            }
        }
    }

    fn notify(&self, message: &str) {
        println!("! {message}");
    }

    fn reset_radius_selector(&self) {
        println!("~ radius selector reset");
    }

    fn reset(&self) {
        println!("~ map cleared");
    }
}
