//! Free-text place lookup against the public Nominatim service.

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use shaperoute_core::{ClientError, Position};
use tracing::debug;

/// Fixed Nominatim search endpoint.
pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

const CLIENT_USER_AGENT: &str = concat!("ShapeRouteGenerator/", env!("CARGO_PKG_VERSION"));

/// Resolves free text to a single position.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Return the best match for `query`, or [`ClientError::Lookup`] when
    /// nothing matched.
    async fn search(&self, query: &str) -> Result<Position, ClientError>;
}

/// Nominatim returns coordinates as decimal strings.
#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Geocoder backed by Nominatim
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    endpoint: String,
    http: reqwest::Client,
}

impl NominatimGeocoder {
    pub fn new() -> Self {
        Self::with_endpoint(NOMINATIM_SEARCH_URL)
    }

    /// Point the geocoder at a different search endpoint
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(&self, query: &str) -> Result<Position, ClientError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("format", "json"), ("q", query), ("limit", "1")])
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .map_err(ClientError::network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::protocol(format!(
                "geocoder returned {}",
                status.as_u16()
            )));
        }

        let bytes = response.bytes().await.map_err(ClientError::network)?;
        let places: Vec<Place> = serde_json::from_slice(&bytes).map_err(ClientError::protocol)?;
        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::lookup(query))?;

        let position = parse_place(&place)?;
        debug!("Geocoded '{}' to {}", query, position);
        Ok(position)
    }
}

fn parse_place(place: &Place) -> Result<Position, ClientError> {
    let lat = place
        .lat
        .trim()
        .parse::<f64>()
        .map_err(|e| ClientError::protocol(format!("bad latitude '{}': {}", place.lat, e)))?;
    let lon = place
        .lon
        .trim()
        .parse::<f64>()
        .map_err(|e| ClientError::protocol(format!("bad longitude '{}': {}", place.lon, e)))?;
    Ok(Position::new(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_place() {
        let place = Place {
            lat: "48.8588897".into(),
            lon: "2.3200410".into(),
        };
        assert_eq!(parse_place(&place).unwrap(), Position::new(48.8588897, 2.320041));
    }

    #[test]
    fn test_parse_place_rejects_garbage() {
        let place = Place {
            lat: "north".into(),
            lon: "2.0".into(),
        };
        assert!(parse_place(&place).unwrap_err().is_protocol());
    }
}
