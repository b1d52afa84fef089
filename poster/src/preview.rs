//! Export and preview render paths.
//!
//! Export renders straight at the preset resolution. Preview renders at the
//! preset's working resolution and scales the result to the display width.
//! Both go through the same [`compose`] call, so layout only differs by scale.

use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};
use tracing::debug;

use crate::canvas::{self, CanvasError};
use crate::compositor::{compose, RenderJob, RenderPhase, RenderStats};
use crate::sizes::{OutputSize, PosterSize};

pub struct Rendered {
    pub pixmap: Pixmap,
    pub stats: RenderStats,
}

impl Rendered {
    pub fn size(&self) -> OutputSize {
        OutputSize::new(self.pixmap.width(), self.pixmap.height())
    }
}

/// Render onto a fresh surface of exactly `size`.
pub fn render_at(
    job: &RenderJob<'_>,
    size: OutputSize,
    progress: &mut dyn FnMut(RenderPhase),
) -> Result<Rendered, CanvasError> {
    let mut pixmap = canvas::allocate(size)?;
    let stats = compose(&mut pixmap, job, progress);
    Ok(Rendered { pixmap, stats })
}

pub fn render_export(
    job: &RenderJob<'_>,
    preset: &PosterSize,
    progress: &mut dyn FnMut(RenderPhase),
) -> Result<Rendered, CanvasError> {
    let size = preset.export_size();
    debug!("export render at {}x{}", size.width, size.height);
    render_at(job, size, progress)
}

pub fn render_preview(
    job: &RenderJob<'_>,
    preset: &PosterSize,
    display_width: u32,
    progress: &mut dyn FnMut(RenderPhase),
) -> Result<Rendered, CanvasError> {
    let working = render_at(job, preset.preview_size(), progress)?;
    let shown = preset.display_size(display_width);
    debug!(
        "preview render at {}x{}, shown at {}x{}",
        working.pixmap.width(),
        working.pixmap.height(),
        shown.width,
        shown.height
    );
    let pixmap = scale_to(&working.pixmap, shown)?;
    Ok(Rendered {
        pixmap,
        stats: working.stats,
    })
}

/// Resample `source` onto a new surface of `size`.
pub fn scale_to(source: &Pixmap, size: OutputSize) -> Result<Pixmap, CanvasError> {
    let mut target = canvas::allocate(size)?;
    let sx = size.width as f32 / source.width() as f32;
    let sy = size.height as f32 / source.height() as f32;
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    target.draw_pixmap(0, 0, source.as_ref(), &paint, Transform::from_scale(sx, sy), None);
    Ok(target)
}
