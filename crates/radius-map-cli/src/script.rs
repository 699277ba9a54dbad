//! Feeds lines of input to the map controller
//!
//! Geocoding commands finish before the next line is read, since later lines
//! name the locations they create. Radius commands run in the background, so
//! a later radius or delete can supersede a lookup that is still in flight.

use std::sync::Arc;

use radius_map::{GeocodingSource, MapController, MapView, PoiSource};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error};

use crate::commands::{Command, HELP};
use crate::error::Result;

pub async fn run_script<G, P, V, R>(
    controller: Arc<MapController<G, P, V>>,
    input: R,
) -> Result<()>
where
    G: GeocodingSource + 'static,
    P: PoiSource + 'static,
    V: MapView + 'static,
    R: AsyncBufRead + Unpin,
{
    let mut lookups = JoinSet::new();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match command {
            Command::Quit => break,
            command @ Command::Radius { .. } => {
                let controller = Arc::clone(&controller);
                lookups.spawn(async move {
                    if let Err(e) = run(&controller, command).await {
                        error!(error = %e, "Radius command failed");
                    }
                });
            }
            command => run(&controller, command).await?,
        }

        while let Some(done) = lookups.try_join_next() {
            reap(done);
        }
    }

    debug!(pending = lookups.len(), "Input finished, waiting for lookups");
    while let Some(done) = lookups.join_next().await {
        reap(done);
    }
    Ok(())
}

fn reap(done: std::result::Result<(), JoinError>) {
    if let Err(e) = done {
        error!(error = %e, "Radius task failed");
    }
}

async fn run<G, P, V>(controller: &MapController<G, P, V>, command: Command) -> Result<()>
where
    G: GeocodingSource,
    P: PoiSource,
    V: MapView,
{
    match command {
        Command::Search(address) => controller.on_search(&address).await,
        Command::Click { lat, lon } => controller.on_map_clicked(lat, lon).await,
        Command::PinMode(enabled) => controller.on_pin_mode_toggled(enabled).await,
        Command::Select(key) => match controller.on_location_selected(&key).await {
            Some(record) => match record.radius_miles {
                Some(miles) => println!(
                    "active: {} ({})",
                    record.key,
                    controller.presets().label(miles)
                ),
                None => println!("active: {} (no radius)", record.key),
            },
            None => println!("no location named {key:?}"),
        },
        Command::Radius { miles, key: Some(key) } => {
            controller.on_radius_chosen(&key, miles).await
        }
        Command::Radius { miles, key: None } => {
            controller.on_radius_chosen_for_active(miles).await
        }
        Command::Circle(key) => {
            if controller.on_circle_clicked(&key).await {
                println!("selected {key:?}; delete to remove it");
            } else {
                println!("no circle for {key:?}");
            }
        }
        Command::Delete(Some(key)) => controller.on_delete_requested(&key).await,
        Command::Delete(None) => controller.on_delete_selected().await,
        Command::Clear => controller.on_clear_all().await,
        Command::List => list(controller).await,
        Command::Stats => println!("{}", serde_json::to_string(&controller.cache_stats())?),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

async fn list<G, P, V>(controller: &MapController<G, P, V>)
where
    G: GeocodingSource,
    P: PoiSource,
    V: MapView,
{
    let records = controller.locations().await;
    if records.is_empty() {
        println!("no locations");
        return;
    }

    let active = controller.active_location().await;
    for record in records {
        let marker = if active.as_deref() == Some(record.key.as_str()) {
            '*'
        } else {
            ' '
        };
        let radius = match (record.radius_miles, &record.poi_results) {
            (None, _) => "no radius".to_string(),
            (Some(miles), None) => format!("{}, searching", controller.presets().label(miles)),
            (Some(miles), Some(pois)) => {
                format!("{}, {} nearby", controller.presets().label(miles), pois.len())
            }
        };
        println!("{marker} {} at {}: {radius}", record.key, record.coordinates);
    }
    if controller.has_radii().await {
        println!("(clear removes all radii)");
    }
}
