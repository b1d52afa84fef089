use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Meters covered by one degree of latitude in the equirectangular approximation.
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Visible geographic region of a poster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
    pub center: GeoPoint,
    pub radius_m: f64,
}

impl Bounds {
    /// Square-ish box around `center` reaching `radius_m` in every direction.
    ///
    /// Longitude span is widened by `1 / cos(lat)` so the box covers the same
    /// ground distance on both axes. No validation happens here.
    pub fn around(center: GeoPoint, radius_m: f64) -> Self {
        let lat_delta = radius_m / METERS_PER_DEGREE_LAT;
        let lon_delta = radius_m / (METERS_PER_DEGREE_LAT * center.lat.to_radians().cos());

        Self {
            south: center.lat - lat_delta,
            north: center.lat + lat_delta,
            west: center.lon - lon_delta,
            east: center.lon + lon_delta,
            center,
            radius_m,
        }
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lon >= self.west
            && point.lon <= self.east
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureCategory {
    Road,
    Water,
    Park,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: i64,
    pub coordinates: Vec<GeoPoint>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub category: FeatureCategory,
    /// Highway subtype (`motorway`, `residential`, ...) for roads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_type: Option<String>,
}

impl Feature {
    pub fn road_type(&self) -> &str {
        self.road_type.as_deref().unwrap_or("")
    }
}

/// Categorized features for one (location, radius) fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDataSnapshot {
    pub roads: Vec<Feature>,
    pub water: Vec<Feature>,
    pub parks: Vec<Feature>,
    pub bounds: Bounds,
}

impl MapDataSnapshot {
    pub fn empty(bounds: Bounds) -> Self {
        Self {
            roads: Vec::new(),
            water: Vec::new(),
            parks: Vec::new(),
            bounds,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.roads.len() + self.water.len() + self.parks.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl LocationInfo {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// User overrides for the poster captions. Blank fields mean "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomText {
    pub title: String,
    pub subtitle: String,
    pub name: String,
}

impl CustomText {
    pub fn title(&self) -> Option<&str> {
        non_blank(&self.title)
    }

    pub fn subtitle(&self) -> Option<&str> {
        non_blank(&self.subtitle)
    }

    pub fn name(&self) -> Option<&str> {
        non_blank(&self.name)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Preview,
    #[default]
    Export,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterRequest {
    /// Free-text place search. Takes precedence over `center`.
    #[serde(default)]
    pub query: Option<String>,
    /// Coordinates to reverse geocode when no query is given.
    #[serde(default)]
    pub center: Option<GeoPoint>,
    #[serde(default = "default_radius_m")]
    pub radius_m: f64,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default)]
    pub custom_text: CustomText,
    #[serde(default)]
    pub mode: RenderMode,
    #[serde(default = "default_display_width")]
    pub display_width: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterResponse {
    pub filename: String,
    pub png_base64: String,
    pub width: u32,
    pub height: u32,
    pub progress: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeSummary {
    pub key: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeSummary {
    pub key: String,
    pub label: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

pub fn default_radius_m() -> f64 {
    10_000.0
}

pub fn default_theme() -> String {
    "noir".to_string()
}

pub fn default_size() -> String {
    "portrait".to_string()
}

pub fn default_display_width() -> u32 {
    600
}
