//! Geographic → canvas mapping for the small bounding boxes a poster covers.
//!
//! The mapping is a plain linear (equirectangular) stretch of the bounds onto
//! the padded drawing area. It is only meaningful for regions that neither
//! wrap the antimeridian nor touch a pole, which [`bounds_around`] enforces.

use shared::{Bounds, GeoPoint};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

/// Smallest radius that still yields a box with a usable span.
pub const MIN_RADIUS_M: f64 = 1.0;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BoundsError {
    #[error("radius must be at least 1 meter, got {0}")]
    InvalidRadius(f64),
    #[error("center ({lat}, {lon}) is not a valid coordinate")]
    InvalidCenter { lat: f64, lon: f64 },
    #[error("region reaches past a pole (south {south:.4}, north {north:.4})")]
    CrossesPole { south: f64, north: f64 },
    #[error("region crosses the antimeridian (west {west:.4}, east {east:.4})")]
    CrossesAntimeridian { west: f64, east: f64 },
}

/// Bounds of the region within `radius_m` of `center`, rejecting regions the
/// linear projection cannot represent.
pub fn bounds_around(center: GeoPoint, radius_m: f64) -> Result<Bounds, BoundsError> {
    if !radius_m.is_finite() || radius_m < MIN_RADIUS_M {
        return Err(BoundsError::InvalidRadius(radius_m));
    }
    if !center.lat.is_finite()
        || !center.lon.is_finite()
        || center.lat.abs() >= 90.0
        || center.lon.abs() > 180.0
    {
        return Err(BoundsError::InvalidCenter {
            lat: center.lat,
            lon: center.lon,
        });
    }

    let bounds = Bounds::around(center, radius_m);

    if bounds.south <= -90.0 || bounds.north >= 90.0 {
        return Err(BoundsError::CrossesPole {
            south: bounds.south,
            north: bounds.north,
        });
    }
    if !bounds.west.is_finite() || bounds.west < -180.0 || bounds.east > 180.0 {
        return Err(BoundsError::CrossesAntimeridian {
            west: bounds.west,
            east: bounds.east,
        });
    }

    if !(bounds.south < bounds.north && bounds.west < bounds.east) {
        return Err(BoundsError::InvalidRadius(radius_m));
    }

    Ok(bounds)
}

/// Map `point` into a `width`×`height` canvas with `padding` pixels on every side.
///
/// North maps to the top (smaller `y`). Points outside `bounds` are not
/// clamped and land outside the padded frame.
pub fn project(point: GeoPoint, bounds: &Bounds, width: f64, height: f64, padding: f64) -> CanvasPoint {
    let usable_width = width - padding * 2.0;
    let usable_height = height - padding * 2.0;

    CanvasPoint {
        x: padding + (point.lon - bounds.west) / (bounds.east - bounds.west) * usable_width,
        y: padding + (bounds.north - point.lat) / (bounds.north - bounds.south) * usable_height,
    }
}

/// Projection parameters for one canvas, so per-point calls don't repeat them.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    bounds: Bounds,
    width: f64,
    height: f64,
    padding: f64,
}

impl Projector {
    pub fn new(bounds: Bounds, width: f64, height: f64, padding: f64) -> Self {
        Self {
            bounds,
            width,
            height,
            padding,
        }
    }

    pub fn project(&self, point: GeoPoint) -> CanvasPoint {
        project(point, &self.bounds, self.width, self.height, self.padding)
    }

    pub fn project_all<'a>(
        &'a self,
        points: &'a [GeoPoint],
    ) -> impl Iterator<Item = CanvasPoint> + 'a {
        points.iter().map(|p| self.project(*p))
    }
}
