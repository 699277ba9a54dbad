//! Error kinds for the radius map core

use std::fmt;

/// Shown for any failure that is not the user's to fix
pub const GENERIC_FAILURE_MESSAGE: &str = "There was an error processing your request.";

#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    /// No geocoding result, no reverse address, or no such location
    NotFound(String),
    /// Network failure, non-success status, malformed response, timeout
    Service(String),
    /// Missing address, unusable coordinates, radius with no location
    Validation(String),
    /// Bad configuration value
    Config(String),
}

impl MapError {
    /// The single notification shown to the user for this error
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(msg) | Self::Validation(msg) => msg.clone(),
            Self::Service(_) | Self::Config(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::Service(msg) => write!(f, "Service error: {}", msg),
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for MapError {}

impl From<nominatim_client::NominatimError> for MapError {
    fn from(err: nominatim_client::NominatimError) -> Self {
        use nominatim_client::NominatimError as E;
        match err {
            E::NotFound(_) => Self::NotFound("Address not found.".to_string()),
            E::EmptyQuery => Self::Validation("Please enter an address.".to_string()),
            E::InvalidCoordinates(lat, lon) => {
                Self::Validation(format!("Invalid coordinates: {lat}, {lon}"))
            }
            E::Http(_) | E::ApiError(_) => Self::Service(err.to_string()),
        }
    }
}

impl From<overpass_client::OverpassError> for MapError {
    fn from(err: overpass_client::OverpassError) -> Self {
        Self::Service(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
