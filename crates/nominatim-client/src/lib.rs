//! Nominatim Geocoding Client
//!
//! A Rust client for the [Nominatim](https://nominatim.org/) search and reverse
//! geocoding APIs with built-in rate limiting and moka async caching.

mod client;
mod error;
mod types;

pub use client::{NominatimClient, NominatimOptions};
pub use error::{NominatimError, Result};
pub use types::{ForwardMatch, ReverseMatch};
