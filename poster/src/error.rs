use thiserror::Error;

use crate::canvas::CanvasError;
use crate::encoder::EncodeError;
use crate::geocode::GeocodeError;
use crate::ingest::FetchError;
use crate::projection::BoundsError;

#[derive(Debug, Error)]
pub enum PosterError {
    #[error("either a place query or center coordinates are required")]
    MissingLocation,
    #[error("invalid bounds: {0}")]
    Bounds(#[from] BoundsError),
    #[error("geocoding failed: {0}")]
    Geocode(#[from] GeocodeError),
    #[error("map data fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("canvas error: {0}")]
    Canvas(#[from] CanvasError),
    #[error("failed to encode poster: {0}")]
    Encode(#[from] EncodeError),
    #[error("render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
