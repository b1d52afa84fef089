//! Drawing surface and the small set of primitives the compositor needs.
//!
//! There is no implicit "current style": every primitive takes the
//! [`PenStyle`] it draws with, so nothing leaks from one phase into the next.

use tiny_skia::{
    Color, FillRule, GradientStop, LineCap, LineJoin, LinearGradient, Paint, PathBuilder, Pixmap,
    Point, Rect, SpreadMode, Stroke, Transform,
};

use crate::projection::CanvasPoint;
use crate::sizes::OutputSize;

/// Longest side of any surface; the largest poster preset.
pub const MAX_SIDE: u32 = 5333;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CanvasError {
    #[error("cannot allocate a {width}x{height} drawing surface")]
    Allocation { width: u32, height: u32 },
    #[error("a {width}x{height} surface exceeds the 5333 px side limit")]
    Oversized { width: u32, height: u32 },
}

/// Sides above [`MAX_SIDE`] are refused before anything is allocated.
pub fn allocate(size: OutputSize) -> Result<Pixmap, CanvasError> {
    if size.width > MAX_SIDE || size.height > MAX_SIDE {
        return Err(CanvasError::Oversized {
            width: size.width,
            height: size.height,
        });
    }
    Pixmap::new(size.width, size.height).ok_or(CanvasError::Allocation {
        width: size.width,
        height: size.height,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB` → color.
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    /// Parses `#RRGGBB` or `RRGGBB`.
    pub fn parse(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('#').unwrap_or(value);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::hex)
    }

    pub fn with_opacity(self, opacity: f32) -> Color {
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color::from_rgba8(self.r, self.g, self.b, alpha)
    }

    pub fn opaque(self) -> Color {
        self.with_opacity(1.0)
    }
}

/// Style of a single draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenStyle {
    pub color: Rgb,
    pub opacity: f32,
    pub line_width: f32,
}

impl PenStyle {
    pub fn fill(color: Rgb) -> Self {
        Self {
            color,
            opacity: 1.0,
            line_width: 1.0,
        }
    }

    pub fn stroke(color: Rgb, line_width: f32) -> Self {
        Self {
            color,
            opacity: 1.0,
            line_width,
        }
    }

    pub fn with_opacity(self, opacity: f32) -> Self {
        Self { opacity, ..self }
    }

    fn paint(&self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(self.color.with_opacity(self.opacity));
        paint.anti_alias = true;
        paint
    }
}

pub fn fill_background(pixmap: &mut Pixmap, color: Rgb) {
    pixmap.fill(color.opaque());
}

/// Fills the closed polygon through `points`. Returns `false` when nothing
/// drawable could be built (fewer than three points, non-finite or zero-area
/// geometry).
pub fn fill_polygon(
    pixmap: &mut Pixmap,
    points: impl IntoIterator<Item = CanvasPoint>,
    pen: &PenStyle,
) -> bool {
    let mut builder = PathBuilder::new();
    let count = trace(&mut builder, points);
    if count < 3 {
        return false;
    }
    builder.close();

    let Some(path) = builder.finish() else {
        return false;
    };
    pixmap.fill_path(
        &path,
        &pen.paint(),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
    true
}

/// Strokes the open polyline through `points` with round caps and joins.
pub fn stroke_polyline(
    pixmap: &mut Pixmap,
    points: impl IntoIterator<Item = CanvasPoint>,
    pen: &PenStyle,
) -> bool {
    let mut builder = PathBuilder::new();
    if trace(&mut builder, points) < 2 {
        return false;
    }

    let Some(path) = builder.finish() else {
        return false;
    };
    let stroke = Stroke {
        width: pen.line_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &pen.paint(), &stroke, Transform::identity(), None);
    true
}

/// Straight segment with butt caps.
pub fn draw_line(pixmap: &mut Pixmap, from: CanvasPoint, to: CanvasPoint, pen: &PenStyle) -> bool {
    let mut builder = PathBuilder::new();
    builder.move_to(from.x as f32, from.y as f32);
    builder.line_to(to.x as f32, to.y as f32);
    let Some(path) = builder.finish() else {
        return false;
    };
    let stroke = Stroke {
        width: pen.line_width,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &pen.paint(), &stroke, Transform::identity(), None);
    true
}

pub fn fill_rects(pixmap: &mut Pixmap, rects: impl IntoIterator<Item = Rect>, pen: &PenStyle) -> bool {
    let mut builder = PathBuilder::new();
    let mut any = false;
    for rect in rects {
        builder.push_rect(rect);
        any = true;
    }
    if !any {
        return false;
    }
    let Some(path) = builder.finish() else {
        return false;
    };
    pixmap.fill_path(
        &path,
        &pen.paint(),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
    true
}

/// Which end of a fade band is fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeEdge {
    Top,
    Bottom,
}

/// Vertical alpha fade covering `fraction` of the canvas height at `edge`,
/// opaque at the canvas edge and transparent toward the middle.
pub fn fill_vertical_fade(pixmap: &mut Pixmap, color: Rgb, edge: FadeEdge, fraction: f32) -> bool {
    let width = pixmap.width() as f32;
    let height = pixmap.height() as f32;
    let band = height * fraction;

    let (stops, top) = match edge {
        FadeEdge::Top => (
            vec![
                GradientStop::new(0.0, color.opaque()),
                GradientStop::new(fraction, color.with_opacity(0.0)),
            ],
            0.0,
        ),
        FadeEdge::Bottom => (
            vec![
                GradientStop::new(1.0 - fraction, color.with_opacity(0.0)),
                GradientStop::new(1.0, color.opaque()),
            ],
            height - band,
        ),
    };

    let Some(shader) = LinearGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(0.0, height),
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    ) else {
        return false;
    };
    let Some(rect) = Rect::from_xywh(0.0, top, width, band) else {
        return false;
    };

    let paint = Paint {
        shader,
        anti_alias: false,
        ..Paint::default()
    };
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    true
}

fn trace(builder: &mut PathBuilder, points: impl IntoIterator<Item = CanvasPoint>) -> usize {
    let mut count = 0;
    for point in points {
        let (x, y) = (point.x as f32, point.y as f32);
        if count == 0 {
            builder.move_to(x, y);
        } else {
            builder.line_to(x, y);
        }
        count += 1;
    }
    count
}
