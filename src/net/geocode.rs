//! City name to coordinate lookup
//!
//! Talks to a Nominatim-compatible search endpoint. Only the first result is
//! used; ranking is left to the provider.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::geo::Coordinate;

/// Lookup failures
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Search text is empty")]
    EmptyQuery,

    #[error("City not found: {city}")]
    NotFound { city: String },

    #[error("Geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Geocoding response was not understood: {0}")]
    InvalidResponse(String),
}

/// Resolves free-text place names
pub trait GeoLookup: Send + Sync {
    fn lookup(&self, city: &str) -> Result<Coordinate, LookupError>;
}

/// One entry of the provider's result array. Extra fields are ignored.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Blocking client for a Nominatim-style `/search` endpoint
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    search_url: String,
}

impl NominatimClient {
    /// Builds a client. Public Nominatim instances refuse requests without a
    /// descriptive user agent.
    pub fn new(
        search_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, search_url))
    }

    /// Uses an already configured HTTP client
    pub fn with_client(client: Client, search_url: impl Into<String>) -> Self {
        Self {
            client,
            search_url: search_url.into(),
        }
    }
}

impl GeoLookup for NominatimClient {
    fn lookup(&self, city: &str) -> Result<Coordinate, LookupError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(LookupError::EmptyQuery);
        }

        log::debug!("Geocoding '{}' via {}", city, self.search_url);
        let body = self
            .client
            .get(&self.search_url)
            .query(&[("city", city), ("format", "json")])
            .send()?
            .error_for_status()?
            .text()?;

        first_place(city, &body)
    }
}

/// Extracts the first result of a search response body
pub fn first_place(city: &str, body: &str) -> Result<Coordinate, LookupError> {
    let places: Vec<Place> = serde_json::from_str(body)
        .map_err(|err| LookupError::InvalidResponse(err.to_string()))?;

    let place = places.first().ok_or_else(|| LookupError::NotFound {
        city: city.to_string(),
    })?;

    let latitude = parse_degrees("lat", &place.lat)?;
    let longitude = parse_degrees("lon", &place.lon)?;
    Coordinate::new(latitude, longitude)
        .map_err(|err| LookupError::InvalidResponse(err.to_string()))
}

fn parse_degrees(field: &str, value: &str) -> Result<f64, LookupError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| LookupError::InvalidResponse(format!("{field} is not a number: {value:?}")))
}
