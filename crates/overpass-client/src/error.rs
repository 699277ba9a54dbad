//! Error types for the Overpass client

use std::fmt;

/// Errors from the Overpass client
#[derive(Debug)]
pub enum OverpassError {
    /// The query could not be built from the given inputs
    InvalidQuery(String),
    /// Transport failure, timeout, or a body that was not the expected JSON
    Http(reqwest::Error),
    /// Non-success status from the interpreter
    ApiError(String),
}

impl fmt::Display for OverpassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuery(msg) => write!(f, "Invalid Overpass query: {msg}"),
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::ApiError(msg) => write!(f, "API error: {msg}"),
        }
    }
}

impl std::error::Error for OverpassError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OverpassError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

pub type Result<T> = std::result::Result<T, OverpassError>;
