//! Error types for the radius map CLI

use std::fmt;

#[derive(Debug)]
pub enum CliError {
    Map(radius_map::MapError),
    Nominatim(nominatim_client::NominatimError),
    Overpass(overpass_client::OverpassError),
    Io(std::io::Error),
    Config(String),
    /// A line of input that is not a command
    Parse(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Map(err) => write!(f, "{}", err),
            CliError::Nominatim(err) => write!(f, "Geocoder setup failed: {}", err),
            CliError::Overpass(err) => write!(f, "POI service setup failed: {}", err),
            CliError::Io(err) => write!(f, "IO error: {}", err),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Parse(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Map(err) => Some(err),
            CliError::Nominatim(err) => Some(err),
            CliError::Overpass(err) => Some(err),
            CliError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<radius_map::MapError> for CliError {
    fn from(err: radius_map::MapError) -> Self {
        CliError::Map(err)
    }
}

impl From<nominatim_client::NominatimError> for CliError {
    fn from(err: nominatim_client::NominatimError) -> Self {
        CliError::Nominatim(err)
    }
}

impl From<overpass_client::OverpassError> for CliError {
    fn from(err: overpass_client::OverpassError) -> Self {
        CliError::Overpass(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for CliError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
