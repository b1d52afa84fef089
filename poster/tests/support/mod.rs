#![allow(dead_code)]

use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use poster::{
    cache::SnapshotCache,
    geocode::{GeocodeError, Geocoder},
    ingest::{BoxFuture, FeatureSource, FetchError},
    overpass::parse_response,
    projection::bounds_around,
    service::PosterService,
};
use shared::{GeoPoint, LocationInfo, MapDataSnapshot};

pub const SAMPLE_OVERPASS: &str = include_str!("../../data/sample_overpass.json");

pub fn paris() -> LocationInfo {
    LocationInfo {
        city: "Paris".into(),
        country: "France".into(),
        lat: 48.8566,
        lon: 2.3522,
    }
}

/// Answers every search with one fixed place; "nowhere" is never found.
pub struct StaticGeocoder {
    pub location: LocationInfo,
}

impl Geocoder for StaticGeocoder {
    fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<LocationInfo, GeocodeError>> {
        Box::pin(async move {
            if query.eq_ignore_ascii_case("nowhere") {
                Err(GeocodeError::NotFound(query.to_string()))
            } else {
                Ok(self.location.clone())
            }
        })
    }

    fn reverse(&self, point: GeoPoint) -> BoxFuture<'_, Result<LocationInfo, GeocodeError>> {
        Box::pin(async move {
            Ok(LocationInfo {
                lat: point.lat,
                lon: point.lon,
                ..self.location.clone()
            })
        })
    }
}

/// Serves the bundled Overpass answer and counts how often it was asked.
#[derive(Default)]
pub struct FixtureSource {
    pub fetches: AtomicUsize,
}

impl FixtureSource {
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl FeatureSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn fetch(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> BoxFuture<'_, Result<MapDataSnapshot, FetchError>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let bounds = bounds_around(center, radius_m)?;
            parse_response(SAMPLE_OVERPASS, bounds)
        })
    }
}

/// Always fails as an unavailable upstream would.
pub struct FailingSource;

impl FeatureSource for FailingSource {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn fetch(
        &self,
        _center: GeoPoint,
        _radius_m: f64,
    ) -> BoxFuture<'_, Result<MapDataSnapshot, FetchError>> {
        Box::pin(async { Err(FetchError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE)) })
    }
}

pub fn service_with(source: Arc<dyn FeatureSource>) -> Arc<PosterService> {
    let geocoder = Arc::new(StaticGeocoder { location: paris() });
    let cache = Arc::new(SnapshotCache::in_memory(NonZeroUsize::MIN));
    Arc::new(PosterService::new(geocoder, source, cache))
}

pub fn fixture_service() -> (Arc<PosterService>, Arc<FixtureSource>) {
    let source = Arc::new(FixtureSource::default());
    (service_with(source.clone()), source)
}
