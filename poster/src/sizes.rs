pub const DEFAULT_SIZE: &str = "portrait";

/// Long edge of the intermediate surface a preview is rendered on.
pub const PREVIEW_LONG_EDGE: u32 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A named export resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosterSize {
    pub key: &'static str,
    pub width: u32,
    pub height: u32,
    pub label: &'static str,
}

impl PosterSize {
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn export_size(&self) -> OutputSize {
        OutputSize::new(self.width, self.height)
    }

    /// Working resolution for previews: same aspect, long edge of [`PREVIEW_LONG_EDGE`].
    pub fn preview_size(&self) -> OutputSize {
        let aspect = self.aspect_ratio();
        if self.width >= self.height {
            OutputSize::new(PREVIEW_LONG_EDGE, scaled(PREVIEW_LONG_EDGE as f64 / aspect))
        } else {
            OutputSize::new(scaled(PREVIEW_LONG_EDGE as f64 * aspect), PREVIEW_LONG_EDGE)
        }
    }

    /// On-screen size for a preview `display_width` pixels wide.
    pub fn display_size(&self, display_width: u32) -> OutputSize {
        let width = display_width.max(1);
        OutputSize::new(width, scaled(width as f64 / self.aspect_ratio()))
    }
}

fn scaled(value: f64) -> u32 {
    (value.round() as u32).max(1)
}

pub static POSTER_SIZES: [PosterSize; 3] = [
    PosterSize {
        key: "portrait",
        width: 4000,
        height: 5333,
        label: "Portrait (3:4)",
    },
    PosterSize {
        key: "square",
        width: 4000,
        height: 4000,
        label: "Square (1:1)",
    },
    PosterSize {
        key: "landscape",
        width: 5333,
        height: 4000,
        label: "Landscape (4:3)",
    },
];

/// Look up a size preset, falling back to [`DEFAULT_SIZE`] for unknown names.
pub fn poster_size(name: &str) -> &'static PosterSize {
    POSTER_SIZES
        .iter()
        .find(|size| size.key == name)
        .unwrap_or_else(|| {
            tracing::debug!("unknown size {name:?}, falling back to {DEFAULT_SIZE}");
            &POSTER_SIZES[0]
        })
}

pub fn size_names() -> impl Iterator<Item = &'static str> {
    POSTER_SIZES.iter().map(|size| size.key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_size_falls_back_to_portrait() {
        assert_eq!(poster_size("a0").key, "portrait");
        assert_eq!(poster_size("square").height, 4000);
    }

    #[test]
    fn preview_keeps_aspect_with_800_long_edge() {
        let portrait = poster_size("portrait").preview_size();
        assert_eq!(portrait, OutputSize::new(600, 800));

        let landscape = poster_size("landscape").preview_size();
        assert_eq!(landscape, OutputSize::new(800, 600));

        let square = poster_size("square").preview_size();
        assert_eq!(square, OutputSize::new(800, 800));
    }

    #[test]
    fn display_size_follows_aspect() {
        let size = poster_size("portrait").display_size(450);
        assert_eq!(size.width, 450);
        assert_eq!(size.height, 600);
    }

    #[test]
    fn display_size_never_zero() {
        let size = poster_size("landscape").display_size(0);
        assert!(size.width >= 1 && size.height >= 1);
    }
}
