//! Caption layout and bitmap text rendering.
//!
//! Glyphs come from the 8×8 tables in `font8x8`. A glyph cell is stretched to
//! an advance of [`ADVANCE_EM`] × size horizontally and one em vertically, so
//! the title fitting rule (which assumes 0.6 em per character) is exact.

use font8x8::{UnicodeFonts, BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, GREEK_FONTS, LATIN_FONTS};
use shared::{CustomText, LocationInfo};
use tiny_skia::{Pixmap, Rect};

use crate::canvas::{self, PenStyle, Rgb};
use crate::projection::CanvasPoint;

pub const ADVANCE_EM: f64 = 0.6;
/// Part of the em box above the baseline.
const ASCENT_EM: f64 = 0.8;
const MIN_TITLE_SIZE: f64 = 24.0;
const TITLE_LETTER_SPACING: usize = 2;

pub const ATTRIBUTION: &str = "© OpenStreetMap contributors";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    /// Anchor x: the center for [`TextAlign::Center`], the right edge for
    /// [`TextAlign::Right`].
    pub x: f64,
    /// Baseline.
    pub y: f64,
    pub size: f64,
    pub align: TextAlign,
    pub opacity: f32,
}

impl TextItem {
    pub fn width(&self) -> f64 {
        text_width(&self.text, self.size)
    }

    pub fn left(&self) -> f64 {
        match self.align {
            TextAlign::Center => self.x - self.width() / 2.0,
            TextAlign::Right => self.x - self.width(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub from: CanvasPoint,
    pub to: CanvasPoint,
    pub width: f64,
}

/// Every caption element of a poster, in draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct TypographyPlan {
    pub title: TextItem,
    pub rule: Rule,
    pub subtitle: TextItem,
    pub coordinates: Option<TextItem>,
    pub name: Option<TextItem>,
    pub attribution: TextItem,
}

impl TypographyPlan {
    pub fn text_items(&self) -> impl Iterator<Item = &TextItem> {
        [Some(&self.title), Some(&self.subtitle)]
            .into_iter()
            .chain([self.coordinates.as_ref(), self.name.as_ref()])
            .chain([Some(&self.attribution)])
            .flatten()
    }
}

/// Join the characters of `text` with `spacing` spaces.
pub fn space_letters(text: &str, spacing: usize) -> String {
    let gap = " ".repeat(spacing);
    let mut out = String::with_capacity(text.len() * (spacing + 1));
    for (idx, ch) in text.chars().enumerate() {
        if idx > 0 {
            out.push_str(&gap);
        }
        out.push(ch);
    }
    out
}

/// `48.8566° N / 2.3522° E`
pub fn format_coordinates(lat: f64, lon: f64) -> String {
    let lat_dir = if lat >= 0.0 { 'N' } else { 'S' };
    let lon_dir = if lon >= 0.0 { 'E' } else { 'W' };
    format!(
        "{:.4}° {} / {:.4}° {}",
        lat.abs(),
        lat_dir,
        lon.abs(),
        lon_dir
    )
}

/// Largest size (at least 24 px) that fits `spaced` into 80% of the canvas
/// width, capped at 6% of the width.
pub fn title_font_size(spaced: &str, canvas_width: f64) -> f64 {
    let chars = spaced.chars().count().max(1) as f64;
    let fitted = (canvas_width * 0.8 / (chars * ADVANCE_EM)).max(MIN_TITLE_SIZE);
    fitted.min(canvas_width * 0.06)
}

pub fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * ADVANCE_EM
}

pub fn plan_typography(
    width: f64,
    height: f64,
    location: &LocationInfo,
    custom: &CustomText,
) -> TypographyPlan {
    let center_x = width / 2.0;
    let show_coordinates = custom.title().is_none();

    let title_text = custom.title().unwrap_or(&location.city).to_uppercase();
    let spaced_title = space_letters(&title_text, TITLE_LETTER_SPACING);
    let title = TextItem {
        size: title_font_size(&spaced_title, width),
        text: spaced_title,
        x: center_x,
        y: height * 0.86,
        align: TextAlign::Center,
        opacity: 1.0,
    };

    let rule = Rule {
        from: CanvasPoint {
            x: width * 0.4,
            y: height * 0.875,
        },
        to: CanvasPoint {
            x: width * 0.6,
            y: height * 0.875,
        },
        width: width * 0.0005,
    };

    let subtitle = TextItem {
        text: custom
            .subtitle()
            .unwrap_or(&location.country)
            .to_uppercase(),
        x: center_x,
        y: height * 0.90,
        size: width * 0.022,
        align: TextAlign::Center,
        opacity: 1.0,
    };

    let coordinates = show_coordinates.then(|| TextItem {
        text: format_coordinates(location.lat, location.lon),
        x: center_x,
        y: height * 0.93,
        size: width * 0.014,
        align: TextAlign::Center,
        opacity: 0.7,
    });

    let name = custom.name().map(|name| TextItem {
        text: name.to_string(),
        x: center_x,
        y: if show_coordinates {
            height * 0.955
        } else {
            height * 0.93
        },
        size: width * 0.016,
        align: TextAlign::Center,
        opacity: 0.6,
    });

    let attribution = TextItem {
        text: ATTRIBUTION.to_string(),
        x: width * 0.98,
        y: height * 0.98,
        size: width * 0.008,
        align: TextAlign::Right,
        opacity: 0.5,
    };

    TypographyPlan {
        title,
        rule,
        subtitle,
        coordinates,
        name,
        attribution,
    }
}

fn glyph(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
        .or_else(|| BOX_FONTS.get(ch))
        .or_else(|| BLOCK_FONTS.get(ch))
}

/// Ink rectangles for `item`, one per horizontal run of set glyph bits.
pub fn glyph_rects(item: &TextItem) -> Vec<Rect> {
    let advance = item.size * ADVANCE_EM;
    let cell_w = advance / 8.0;
    let cell_h = item.size / 8.0;
    let top = item.y - item.size * ASCENT_EM;
    let left = item.left();

    let mut rects = Vec::new();
    for (idx, ch) in item.text.chars().enumerate() {
        let Some(rows) = glyph(ch) else {
            continue;
        };
        let origin = left + idx as f64 * advance;

        for (row, bits) in rows.iter().enumerate() {
            let y = top + row as f64 * cell_h;
            let mut col = 0;
            while col < 8 {
                if bits & (1 << col) == 0 {
                    col += 1;
                    continue;
                }
                let start = col;
                while col < 8 && bits & (1 << col) != 0 {
                    col += 1;
                }
                let rect = Rect::from_xywh(
                    (origin + start as f64 * cell_w) as f32,
                    y as f32,
                    ((col - start) as f64 * cell_w) as f32,
                    cell_h as f32,
                );
                rects.extend(rect);
            }
        }
    }
    rects
}

pub fn draw_text(pixmap: &mut Pixmap, item: &TextItem, color: Rgb) -> bool {
    let pen = PenStyle::fill(color).with_opacity(item.opacity);
    canvas::fill_rects(pixmap, glyph_rects(item), &pen)
}

pub fn draw_rule(pixmap: &mut Pixmap, rule: &Rule, color: Rgb) -> bool {
    let pen = PenStyle::stroke(color, rule.width as f32);
    canvas::draw_line(pixmap, rule.from, rule.to, &pen)
}
