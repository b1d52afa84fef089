//! The fixed paint sequence that turns a snapshot into a poster.
//!
//! Phases run strictly in order and each one owns the surface for its
//! duration. Progress is reported synchronously through a callback before
//! each phase begins.

use std::fmt;

use shared::{CustomText, Feature, LocationInfo, MapDataSnapshot};
use tiny_skia::Pixmap;
use tracing::debug;

use crate::canvas::{self, FadeEdge, PenStyle, Rgb};
use crate::projection::Projector;
use crate::style;
use crate::theme::Theme;
use crate::typography;

/// Fraction of the canvas width kept clear around the projected map.
pub const PADDING_FRACTION: f64 = 0.05;
/// Height of each gradient band as a fraction of the canvas height.
pub const FADE_FRACTION: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPhase {
    Background,
    Water,
    Parks,
    Roads,
    Fades,
    Typography,
    Done,
}

impl RenderPhase {
    pub const ALL: [RenderPhase; 7] = [
        RenderPhase::Background,
        RenderPhase::Water,
        RenderPhase::Parks,
        RenderPhase::Roads,
        RenderPhase::Fades,
        RenderPhase::Typography,
        RenderPhase::Done,
    ];

    pub fn message(self) -> &'static str {
        match self {
            RenderPhase::Background => "Rendering background...",
            RenderPhase::Water => "Rendering water...",
            RenderPhase::Parks => "Rendering parks...",
            RenderPhase::Roads => "Rendering roads...",
            RenderPhase::Fades => "Adding gradient fades...",
            RenderPhase::Typography => "Adding typography...",
            RenderPhase::Done => "Done!",
        }
    }
}

impl fmt::Display for RenderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Everything one render needs. Borrowed so preview and export can share a
/// snapshot without cloning it.
#[derive(Debug, Clone, Copy)]
pub struct RenderJob<'a> {
    pub snapshot: &'a MapDataSnapshot,
    pub location: &'a LocationInfo,
    pub theme: &'static Theme,
    pub custom_text: &'a CustomText,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerStats {
    pub drawn: usize,
    pub skipped: usize,
}

impl LayerStats {
    fn record(&mut self, drawn: bool) {
        if drawn {
            self.drawn += 1;
        } else {
            self.skipped += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub water: LayerStats,
    pub parks: LayerStats,
    pub roads: LayerStats,
}

impl RenderStats {
    pub fn drawn(&self) -> usize {
        self.water.drawn + self.parks.drawn + self.roads.drawn
    }

    pub fn skipped(&self) -> usize {
        self.water.skipped + self.parks.skipped + self.roads.skipped
    }
}

/// Paint `job` onto `pixmap` at the pixmap's own resolution.
pub fn compose(
    pixmap: &mut Pixmap,
    job: &RenderJob<'_>,
    progress: &mut dyn FnMut(RenderPhase),
) -> RenderStats {
    let width = pixmap.width() as f64;
    let height = pixmap.height() as f64;
    let theme = job.theme;
    let projector = Projector::new(job.snapshot.bounds, width, height, width * PADDING_FRACTION);
    let mut stats = RenderStats::default();

    enter(RenderPhase::Background, progress);
    canvas::fill_background(pixmap, theme.bg);

    enter(RenderPhase::Water, progress);
    stats.water = fill_areas(pixmap, &projector, &job.snapshot.water, theme.water);
    log_layer("water", stats.water);

    enter(RenderPhase::Parks, progress);
    stats.parks = fill_areas(pixmap, &projector, &job.snapshot.parks, theme.parks);
    log_layer("parks", stats.parks);

    enter(RenderPhase::Roads, progress);
    stats.roads = stroke_roads(pixmap, &projector, &job.snapshot.roads, theme, width);
    log_layer("roads", stats.roads);

    enter(RenderPhase::Fades, progress);
    canvas::fill_vertical_fade(pixmap, theme.gradient_color, FadeEdge::Top, FADE_FRACTION);
    canvas::fill_vertical_fade(pixmap, theme.gradient_color, FadeEdge::Bottom, FADE_FRACTION);

    enter(RenderPhase::Typography, progress);
    let plan = typography::plan_typography(width, height, job.location, job.custom_text);
    typography::draw_text(pixmap, &plan.title, theme.text);
    typography::draw_rule(pixmap, &plan.rule, theme.text);
    for item in plan.text_items().skip(1) {
        typography::draw_text(pixmap, item, theme.text);
    }

    enter(RenderPhase::Done, progress);
    stats
}

fn enter(phase: RenderPhase, progress: &mut dyn FnMut(RenderPhase)) {
    debug!("{}", phase.message());
    progress(phase);
}

fn log_layer(layer: &str, stats: LayerStats) {
    if stats.skipped > 0 {
        debug!(
            "{layer}: drew {}, skipped {} degenerate features",
            stats.drawn, stats.skipped
        );
    }
}

fn fill_areas(
    pixmap: &mut Pixmap,
    projector: &Projector,
    features: &[Feature],
    color: Rgb,
) -> LayerStats {
    let pen = PenStyle::fill(color);
    let mut stats = LayerStats::default();
    for feature in features {
        let drawn = style::is_drawable_area(feature)
            && canvas::fill_polygon(pixmap, projector.project_all(&feature.coordinates), &pen);
        stats.record(drawn);
    }
    stats
}

fn stroke_roads(
    pixmap: &mut Pixmap,
    projector: &Projector,
    roads: &[Feature],
    theme: &Theme,
    canvas_width: f64,
) -> LayerStats {
    let mut stats = LayerStats::default();
    for road in style::sort_roads_for_drawing(roads) {
        let road_type = road.road_type();
        let pen = PenStyle::stroke(
            style::road_color(road_type, theme),
            style::road_width(road_type, canvas_width) as f32,
        );
        let drawn = style::is_drawable_line(road)
            && canvas::stroke_polyline(pixmap, projector.project_all(&road.coordinates), &pen);
        stats.record(drawn);
    }
    stats
}
