use serde::Deserialize;

use crate::error::NominatimError;

/// First candidate of a forward (address → coordinates) search
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardMatch {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: Option<String>,
}

/// Result of a reverse (coordinates → address) lookup
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseMatch {
    pub display_name: String,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
}

/// One hit from `/search?format=json`. Nominatim sends coordinates as strings.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    pub(crate) lat: String,
    pub(crate) lon: String,
    pub(crate) display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReverseResponse {
    pub(crate) display_name: Option<String>,
    #[serde(default)]
    pub(crate) address: ReverseAddress,
    pub(crate) error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReverseAddress {
    pub(crate) city: Option<String>,
    pub(crate) town: Option<String>,
    pub(crate) village: Option<String>,
    pub(crate) state: Option<String>,
    pub(crate) postcode: Option<String>,
}

impl SearchHit {
    /// Malformed coordinates are a service fault, not a missing result
    pub(crate) fn into_match(self) -> crate::Result<ForwardMatch> {
        let parse = |raw: &str| raw.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        let (Some(latitude), Some(longitude)) = (parse(&self.lat), parse(&self.lon)) else {
            return Err(NominatimError::ApiError(format!(
                "unparseable coordinates {:?}, {:?}",
                self.lat, self.lon
            )));
        };
        Ok(ForwardMatch {
            latitude,
            longitude,
            display_name: self.display_name,
        })
    }
}

impl ReverseResponse {
    /// Returns `None` when the service reported an error or sent no display name
    pub(crate) fn into_match(self) -> Option<ReverseMatch> {
        if self.error.is_some() {
            return None;
        }
        let display_name = self.display_name.filter(|s| !s.trim().is_empty())?;
        let addr = self.address;

        Some(ReverseMatch {
            display_name,
            city: addr.city,
            town: addr.town,
            village: addr.village,
            state: addr.state,
            postcode: addr.postcode,
        })
    }
}
