use chrono::{DateTime, Utc};
use tiny_skia::Pixmap;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const EXTENSION: &str = "png";
const FALLBACK_STEM: &str = "poster";

#[derive(Debug, thiserror::Error)]
#[error("failed to encode poster as PNG: {0}")]
pub struct EncodeError(#[from] png::EncodingError);

/// Lossless PNG bytes for `pixmap`.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, EncodeError> {
    Ok(pixmap.encode_png()?)
}

/// `<display name>_<theme>_<timestamp>.png`, with the display name lowercased
/// and every whitespace run collapsed to one underscore.
///
/// Path separators are replaced as well so the result is always a bare file
/// name.
pub fn derive_filename(display_name: &str, theme: &str, timestamp: DateTime<Utc>) -> String {
    let stem = normalize_name(display_name);
    let stem = if stem.is_empty() { FALLBACK_STEM } else { &stem };
    format!(
        "{stem}_{theme}_{}.{EXTENSION}",
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::canvas::{self, Rgb};
    use crate::sizes::OutputSize;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap()
    }

    #[test]
    fn filename_is_lowercased_and_underscored() {
        assert_eq!(
            derive_filename("New  York\tCity", "noir", at()),
            "new_york_city_noir_20240309070502.png"
        );
    }

    #[test]
    fn blank_name_gets_a_stem() {
        assert_eq!(derive_filename("   ", "ocean", at()), "poster_ocean_20240309070502.png");
    }

    #[test]
    fn separators_never_escape_the_directory() {
        let name = derive_filename("A/B\\C", "forest", at());
        assert_eq!(name, "a_b_c_forest_20240309070502.png");
    }

    #[test]
    fn timestamps_sort_chronologically() {
        let earlier = derive_filename("x", "noir", at());
        let later = derive_filename("x", "noir", Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap());
        assert!(earlier < later);
    }

    #[test]
    fn encodes_a_decodable_png() {
        let mut pixmap = canvas::allocate(OutputSize::new(3, 2)).expect("pixmap");
        canvas::fill_background(&mut pixmap, Rgb::new(1, 2, 3));
        let bytes = encode_png(&pixmap).expect("encode");

        let decoder = png::Decoder::new(bytes.as_slice());
        let mut reader = decoder.read_info().expect("png header");
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).expect("frame");
        assert_eq!((info.width, info.height), (3, 2));
        assert_eq!(&buf[..4], &[1, 2, 3, 255]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_filename_has_no_whitespace(name in "\\PC{0,24}") {
                let filename = derive_filename(&name, "noir", at());
                prop_assert!(!filename.chars().any(char::is_whitespace));
                prop_assert!(filename.ends_with("_noir_20240309070502.png"));
                prop_assert!(!filename.contains('/'));
            }
        }
    }
}
