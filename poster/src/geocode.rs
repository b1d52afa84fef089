//! City lookup against a Nominatim endpoint.

use std::time::Duration;

use serde::Deserialize;
use shared::{GeoPoint, LocationInfo};
use tracing::{debug, info};

use crate::ingest::BoxFuture;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const UNKNOWN_CITY: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoding service answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("location not found: {0}")]
    NotFound(String),
    #[error("malformed geocoding answer: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("geocoding answer has an invalid coordinate {0:?}")]
    InvalidCoordinate(String),
}

/// Resolves free text or a point into a named location.
pub trait Geocoder: Send + Sync {
    fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<LocationInfo, GeocodeError>>;

    fn reverse(&self, point: GeoPoint) -> BoxFuture<'_, Result<LocationInfo, GeocodeError>>;
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: Option<String>,
    lon: Option<String>,
    name: Option<String>,
    #[serde(default)]
    address: Address,
}

impl Place {
    fn city(&self) -> String {
        let address = &self.address;
        [
            &address.city,
            &address.town,
            &address.village,
            &address.municipality,
            &address.county,
            &self.name,
        ]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| UNKNOWN_CITY.to_string())
    }

    fn country(&self) -> String {
        self.address.country.clone().unwrap_or_default()
    }
}

fn parse_coordinate(value: Option<&str>) -> Result<f64, GeocodeError> {
    let raw = value.unwrap_or_default();
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeocodeError::InvalidCoordinate(raw.to_string()))
}

/// First hit of a `/search` answer.
pub fn parse_search(body: &str, query: &str) -> Result<LocationInfo, GeocodeError> {
    let places: Vec<Place> = serde_json::from_str(body)?;
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::NotFound(query.to_string()))?;

    Ok(LocationInfo {
        lat: parse_coordinate(place.lat.as_deref())?,
        lon: parse_coordinate(place.lon.as_deref())?,
        city: place.city(),
        country: place.country(),
    })
}

/// A `/reverse` answer. The location keeps the point that was looked up.
pub fn parse_reverse(body: &str, point: GeoPoint) -> Result<LocationInfo, GeocodeError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
        debug!("reverse lookup for {point:?} returned {message:?}");
    }
    let place: Place = serde_json::from_value(value)?;

    Ok(LocationInfo {
        city: place.city(),
        country: place.country(),
        lat: point.lat,
        lon: point.lon,
    })
}

#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String, GeocodeError> {
        let response = self
            .http
            .get(format!("{}/{endpoint}", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status()));
        }
        Ok(response.text().await?)
    }
}

impl Geocoder for NominatimClient {
    fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<LocationInfo, GeocodeError>> {
        Box::pin(async move {
            info!("geocoding {query:?}");
            let body = self
                .get(
                    "search",
                    &[
                        ("q", query.to_string()),
                        ("format", "json".into()),
                        ("limit", "1".into()),
                        ("addressdetails", "1".into()),
                    ],
                )
                .await?;
            parse_search(&body, query)
        })
    }

    fn reverse(&self, point: GeoPoint) -> BoxFuture<'_, Result<LocationInfo, GeocodeError>> {
        Box::pin(async move {
            info!("reverse geocoding {:.5},{:.5}", point.lat, point.lon);
            let body = self
                .get(
                    "reverse",
                    &[
                        ("lat", point.lat.to_string()),
                        ("lon", point.lon.to_string()),
                        ("format", "json".into()),
                        ("addressdetails", "1".into()),
                    ],
                )
                .await?;
            parse_reverse(&body, point)
        })
    }
}
