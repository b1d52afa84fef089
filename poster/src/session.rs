//! Interactive poster state: one location, the current choices, and the
//! export artifact built from them.
//!
//! Changing the theme, size or caption invalidates the export. Changing the
//! radius also drops the snapshot, which is refetched on the next render.

use std::sync::Arc;

use shared::{CustomText, GeoPoint, LocationInfo, MapDataSnapshot};
use tracing::debug;

use crate::error::PosterError;
use crate::service::{PosterOptions, PosterService, RenderTarget, RenderedPoster};
use crate::sizes::{poster_size, PosterSize};
use crate::theme::{get_theme, Theme};

pub const DEFAULT_RADIUS_M: f64 = 10_000.0;

pub struct PosterSession {
    service: Arc<PosterService>,
    theme: &'static Theme,
    size: &'static PosterSize,
    radius_m: f64,
    custom_text: CustomText,
    location: Option<LocationInfo>,
    snapshot: Option<Arc<MapDataSnapshot>>,
    export: Option<Arc<RenderedPoster>>,
}

impl PosterSession {
    pub fn new(service: Arc<PosterService>) -> Self {
        Self {
            service,
            theme: get_theme(crate::theme::DEFAULT_THEME),
            size: poster_size(crate::sizes::DEFAULT_SIZE),
            radius_m: DEFAULT_RADIUS_M,
            custom_text: CustomText::default(),
            location: None,
            snapshot: None,
            export: None,
        }
    }

    pub fn theme(&self) -> &'static Theme {
        self.theme
    }

    pub fn size(&self) -> &'static PosterSize {
        self.size
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn location(&self) -> Option<&LocationInfo> {
        self.location.as_ref()
    }

    pub fn snapshot(&self) -> Option<&Arc<MapDataSnapshot>> {
        self.snapshot.as_ref()
    }

    pub fn cached_export(&self) -> Option<&Arc<RenderedPoster>> {
        self.export.as_ref()
    }

    pub fn set_theme(&mut self, name: &str) {
        let theme = get_theme(name);
        if theme.key != self.theme.key {
            self.theme = theme;
            self.invalidate_export();
        }
    }

    pub fn set_size(&mut self, name: &str) {
        let size = poster_size(name);
        if size.key != self.size.key {
            self.size = size;
            self.invalidate_export();
        }
    }

    pub fn set_custom_text(&mut self, custom_text: CustomText) {
        if custom_text != self.custom_text {
            self.custom_text = custom_text;
            self.invalidate_export();
        }
    }

    pub fn set_radius(&mut self, radius_m: f64) {
        if radius_m != self.radius_m {
            self.radius_m = radius_m;
            self.snapshot = None;
            self.invalidate_export();
        }
    }

    /// Select a new location by search text or coordinates and fetch its map.
    pub async fn locate(
        &mut self,
        query: Option<&str>,
        center: Option<GeoPoint>,
    ) -> Result<&LocationInfo, PosterError> {
        let location = self.service.resolve_location(query, center).await?;
        let snapshot = self
            .service
            .load_snapshot(location.center(), self.radius_m)
            .await?;
        self.snapshot = Some(snapshot);
        self.invalidate_export();
        Ok(self.location.insert(location))
    }

    pub async fn preview(&mut self, display_width: u32) -> Result<RenderedPoster, PosterError> {
        self.render(RenderTarget::Preview { display_width }).await
    }

    /// Full-resolution poster, reused until a setting changes.
    pub async fn export(&mut self) -> Result<Arc<RenderedPoster>, PosterError> {
        if let Some(export) = &self.export {
            debug!("reusing cached export {}", export.filename);
            return Ok(Arc::clone(export));
        }
        let export = Arc::new(self.render(RenderTarget::Export).await?);
        self.export = Some(Arc::clone(&export));
        Ok(export)
    }

    async fn render(&mut self, target: RenderTarget) -> Result<RenderedPoster, PosterError> {
        let location = self.location.clone().ok_or(PosterError::MissingLocation)?;
        let snapshot = match &self.snapshot {
            Some(snapshot) => Arc::clone(snapshot),
            None => {
                let snapshot = self
                    .service
                    .load_snapshot(location.center(), self.radius_m)
                    .await?;
                self.snapshot = Some(Arc::clone(&snapshot));
                snapshot
            }
        };
        let options = PosterOptions {
            theme: self.theme,
            size: self.size,
            custom_text: self.custom_text.clone(),
        };
        self.service
            .render_with(snapshot, location, options, target)
            .await
    }

    fn invalidate_export(&mut self) {
        if self.export.take().is_some() {
            debug!("export invalidated");
        }
    }
}
