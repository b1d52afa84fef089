//! End-to-end poster pipeline: resolve a location, load its snapshot, render
//! and encode.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use shared::{
    CustomText, GeoPoint, LocationInfo, MapDataSnapshot, PosterRequest, PosterResponse, RenderMode,
};
use tracing::{debug, info};

use crate::cache::{SnapshotCache, SnapshotKey};
use crate::compositor::{RenderJob, RenderStats};
use crate::config::ServiceConfig;
use crate::encoder::{derive_filename, encode_png};
use crate::error::PosterError;
use crate::geocode::{Geocoder, NominatimClient};
use crate::ingest::FeatureSource;
use crate::overpass::OverpassClient;
use crate::pbf::PbfFeatureSource;
use crate::preview::{render_export, render_preview};
use crate::projection::bounds_around;
use crate::sizes::{poster_size, PosterSize};
use crate::theme::{get_theme, Theme};

/// Resolved styling choices for one poster.
#[derive(Debug, Clone)]
pub struct PosterOptions {
    pub theme: &'static Theme,
    pub size: &'static PosterSize,
    pub custom_text: CustomText,
}

impl PosterOptions {
    pub fn resolve(theme: &str, size: &str, custom_text: CustomText) -> Self {
        Self {
            theme: get_theme(theme),
            size: poster_size(size),
            custom_text,
        }
    }

    /// Title override, or the city name.
    pub fn display_name<'a>(&'a self, location: &'a LocationInfo) -> &'a str {
        self.custom_text.title().unwrap_or(&location.city)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    Export,
    Preview { display_width: u32 },
}

impl RenderTarget {
    pub fn from_request(mode: RenderMode, display_width: u32) -> Self {
        match mode {
            RenderMode::Export => RenderTarget::Export,
            RenderMode::Preview => RenderTarget::Preview { display_width },
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedPoster {
    pub png: Vec<u8>,
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub progress: Vec<String>,
    pub stats: RenderStats,
}

impl RenderedPoster {
    pub fn to_response(&self) -> PosterResponse {
        PosterResponse {
            filename: self.filename.clone(),
            png_base64: STANDARD.encode(&self.png),
            width: self.width,
            height: self.height,
            progress: self.progress.clone(),
        }
    }
}

/// Render and encode synchronously. Touches no network or disk.
pub fn render_poster(
    snapshot: &MapDataSnapshot,
    location: &LocationInfo,
    options: &PosterOptions,
    target: RenderTarget,
    timestamp: DateTime<Utc>,
) -> Result<RenderedPoster, PosterError> {
    let job = RenderJob {
        snapshot,
        location,
        theme: options.theme,
        custom_text: &options.custom_text,
    };

    let mut progress = Vec::new();
    let mut report = |phase: crate::compositor::RenderPhase| progress.push(phase.message().to_string());
    let rendered = match target {
        RenderTarget::Export => render_export(&job, options.size, &mut report)?,
        RenderTarget::Preview { display_width } => {
            render_preview(&job, options.size, display_width, &mut report)?
        }
    };

    let png = encode_png(&rendered.pixmap)?;
    let filename = derive_filename(options.display_name(location), options.theme.key, timestamp);
    debug!(
        "encoded {filename}: {} bytes, {} features drawn, {} skipped",
        png.len(),
        rendered.stats.drawn(),
        rendered.stats.skipped()
    );

    Ok(RenderedPoster {
        png,
        filename,
        width: rendered.pixmap.width(),
        height: rendered.pixmap.height(),
        progress,
        stats: rendered.stats,
    })
}

pub struct PosterService {
    geocoder: Arc<dyn Geocoder>,
    source: Arc<dyn FeatureSource>,
    cache: Arc<SnapshotCache>,
}

impl PosterService {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        source: Arc<dyn FeatureSource>,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        Self {
            geocoder,
            source,
            cache,
        }
    }

    /// Nominatim for places; Overpass for features unless a PBF extract is
    /// configured.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, reqwest::Error> {
        let geocoder = NominatimClient::new(
            config.nominatim_url.clone(),
            &config.user_agent,
            config.http_timeout,
        )?;
        let source: Arc<dyn FeatureSource> = match &config.pbf_path {
            Some(path) => Arc::new(PbfFeatureSource::new(path.clone())),
            None => Arc::new(OverpassClient::new(
                config.overpass_url.clone(),
                &config.user_agent,
                config.http_timeout,
            )?),
        };
        let cache = SnapshotCache::new(config.snapshot_cache_size, config.cache_dir.clone());
        info!("map features from {}", source.name());
        Ok(Self::new(Arc::new(geocoder), source, Arc::new(cache)))
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// A non-blank query wins over coordinates.
    pub async fn resolve_location(
        &self,
        query: Option<&str>,
        center: Option<GeoPoint>,
    ) -> Result<LocationInfo, PosterError> {
        match (query.map(str::trim).filter(|q| !q.is_empty()), center) {
            (Some(query), _) => Ok(self.geocoder.search(query).await?),
            (None, Some(center)) => {
                // Reject impossible coordinates before asking anyone about them.
                bounds_around(center, 1.0)?;
                Ok(self.geocoder.reverse(center).await?)
            }
            (None, None) => Err(PosterError::MissingLocation),
        }
    }

    pub async fn load_snapshot(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<Arc<MapDataSnapshot>, PosterError> {
        bounds_around(center, radius_m)?;

        let key = SnapshotKey::new(center, radius_m);
        if let Some(snapshot) = self.cache.get(&key).await {
            return Ok(snapshot);
        }

        let snapshot = self.source.fetch(center, radius_m).await?;
        info!(
            "fetched {} features around {:.5},{:.5} (r={radius_m} m)",
            snapshot.feature_count(),
            center.lat,
            center.lon
        );
        Ok(self.cache.insert(key, snapshot).await)
    }

    /// Render on a blocking thread that owns the surface until it finishes.
    pub async fn render_with(
        &self,
        snapshot: Arc<MapDataSnapshot>,
        location: LocationInfo,
        options: PosterOptions,
        target: RenderTarget,
    ) -> Result<RenderedPoster, PosterError> {
        tokio::task::spawn_blocking(move || {
            render_poster(&snapshot, &location, &options, target, Utc::now())
        })
        .await?
    }

    pub async fn render(&self, request: &PosterRequest) -> Result<RenderedPoster, PosterError> {
        let location = self
            .resolve_location(request.query.as_deref(), request.center)
            .await?;
        let snapshot = self.load_snapshot(location.center(), request.radius_m).await?;
        let options = PosterOptions::resolve(&request.theme, &request.size, request.custom_text.clone());
        let target = RenderTarget::from_request(request.mode, request.display_width);

        info!(
            "rendering {} ({}, {}) as {target:?}",
            location.city, options.theme.key, options.size.key
        );
        self.render_with(snapshot, location, options, target).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use shared::Bounds;

    use super::*;

    fn location() -> LocationInfo {
        LocationInfo {
            city: "San Francisco".into(),
            country: "United States".into(),
            lat: 37.7749,
            lon: -122.4194,
        }
    }

    #[test]
    fn filename_uses_custom_title_when_present() {
        let snapshot = MapDataSnapshot::empty(Bounds::around(GeoPoint::new(37.7749, -122.4194), 500.0));
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

        let plain = PosterOptions::resolve("ocean", "square", CustomText::default());
        let rendered = render_poster(
            &snapshot,
            &location(),
            &plain,
            RenderTarget::Preview { display_width: 100 },
            at,
        )
        .expect("render");
        assert_eq!(rendered.filename, "san_francisco_ocean_20250102030405.png");
        assert_eq!((rendered.width, rendered.height), (100, 100));
        assert_eq!(rendered.progress.len(), 7);
        assert_eq!(rendered.progress.last().map(String::as_str), Some("Done!"));

        let titled = PosterOptions::resolve(
            "nope",
            "square",
            CustomText {
                title: "Golden Gate".into(),
                ..CustomText::default()
            },
        );
        let rendered = render_poster(
            &snapshot,
            &location(),
            &titled,
            RenderTarget::Preview { display_width: 50 },
            at,
        )
        .expect("render");
        assert_eq!(rendered.filename, "golden_gate_noir_20250102030405.png");
    }

    #[test]
    fn response_carries_base64_png() {
        let rendered = RenderedPoster {
            png: vec![0x89, b'P', b'N', b'G'],
            filename: "x.png".into(),
            width: 1,
            height: 2,
            progress: vec!["Done!".into()],
            stats: RenderStats::default(),
        };
        let response = rendered.to_response();
        assert_eq!(response.png_base64, "iVBORw==");
        assert_eq!(response.height, 2);
    }

    #[test]
    fn request_mode_maps_to_target() {
        assert_eq!(
            RenderTarget::from_request(RenderMode::Preview, 640),
            RenderTarget::Preview { display_width: 640 }
        );
        assert_eq!(RenderTarget::from_request(RenderMode::Export, 640), RenderTarget::Export);
    }
}
