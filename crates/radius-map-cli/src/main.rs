//! Radius map in the terminal
//!
//! Reads one command per line from stdin (or a script file), drives the map
//! controller against Nominatim and Overpass, and prints what a map would draw.

mod commands;
mod console;
mod error;
mod script;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use nominatim_client::{NominatimClient, NominatimOptions};
use overpass_client::{OverpassClient, OverpassOptions, TagFilter};
use radius_map::{MapConfig, MapController, OverpassPoiSource};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::console::ConsoleView;
use crate::error::{CliError, Result};

type Controller = MapController<NominatimClient, OverpassPoiSource, ConsoleView>;

#[derive(Parser, Debug)]
#[command(author, version, about = "Search addresses, draw radii and list nearby places")]
struct Args {
    /// Read commands from a file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Start with click-to-place turned on
    #[arg(long)]
    pin_mode: bool,
}

// One thread, so handlers start in the order their lines were read
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::from_default_env()
        .add_directive("radius_map=info".parse()?)
        .add_directive("radius_map_cli=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    let config = MapConfig::from_env()?;
    info!(
        nominatim = %config.nominatim_url,
        overpass = %config.overpass_url,
        poi_tag = %config.poi_tag,
        "Starting radius map"
    );

    let controller = Arc::new(build_controller(&config)?);
    if args.pin_mode {
        controller.on_pin_mode_toggled(true).await;
    }

    let radii: Vec<String> = config
        .radius_presets
        .iter()
        .map(|(miles, label)| format!("{miles} ({label})"))
        .collect();
    println!("radius choices: {}; type help for commands", radii.join(", "));

    let input: Box<dyn AsyncBufRead + Unpin> = match &args.script {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    script::run_script(controller, input).await?;

    info!("Done");
    Ok(())
}

fn build_controller(config: &MapConfig) -> Result<Controller> {
    let geocoder = NominatimClient::with_options(NominatimOptions {
        base_url: config.nominatim_url.clone(),
        user_agent: config.user_agent.clone(),
        min_interval: config.geocode_interval,
        ..NominatimOptions::default()
    })?;

    let overpass = OverpassClient::with_options(OverpassOptions {
        endpoint: config.overpass_url.clone(),
        user_agent: config.user_agent.clone(),
        timeout: config.lookup.request_timeout,
    })?;
    let filter: TagFilter = config.poi_tag.parse().map_err(CliError::Config)?;

    Ok(MapController::new(
        geocoder,
        OverpassPoiSource::new(overpass, filter),
        ConsoleView::default(),
        config,
    ))
}
