//! Overpass API Client
//!
//! Queries an [Overpass](https://wiki.openstreetmap.org/wiki/Overpass_API)
//! interpreter for OpenStreetMap nodes and ways carrying a tag within a
//! radius of a point.

mod client;
mod error;
mod types;

pub use client::{build_around_query, OverpassClient, OverpassOptions};
pub use error::{OverpassError, Result};
pub use types::{RawPoint, TagFilter};
