use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::canvas::Rgb;

pub const DEFAULT_THEME: &str = "noir";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadPalette {
    pub motorway: Rgb,
    pub primary: Rgb,
    pub secondary: Rgb,
    pub tertiary: Rgb,
    pub residential: Rgb,
    pub default: Rgb,
}

/// Named color palette applied uniformly across one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub bg: Rgb,
    pub text: Rgb,
    pub gradient_color: Rgb,
    pub water: Rgb,
    pub parks: Rgb,
    pub roads: RoadPalette,
}

const fn roads(
    motorway: u32,
    primary: u32,
    secondary: u32,
    tertiary: u32,
    residential: u32,
    default: u32,
) -> RoadPalette {
    RoadPalette {
        motorway: Rgb::hex(motorway),
        primary: Rgb::hex(primary),
        secondary: Rgb::hex(secondary),
        tertiary: Rgb::hex(tertiary),
        residential: Rgb::hex(residential),
        default: Rgb::hex(default),
    }
}

#[allow(clippy::too_many_arguments)]
const fn theme(
    key: &'static str,
    name: &'static str,
    description: &'static str,
    bg: u32,
    text: u32,
    water: u32,
    parks: u32,
    roads: RoadPalette,
) -> Theme {
    Theme {
        key,
        name,
        description,
        bg: Rgb::hex(bg),
        text: Rgb::hex(text),
        // Every preset fades into its own background.
        gradient_color: Rgb::hex(bg),
        water: Rgb::hex(water),
        parks: Rgb::hex(parks),
        roads,
    }
}

pub static THEMES: [Theme; 17] = [
    theme(
        "noir",
        "Noir",
        "Pure black background with white roads",
        0x0D0D0D,
        0xFFFFFF,
        0x1A1A1A,
        0x151515,
        roads(0xFFFFFF, 0xE0E0E0, 0xC0C0C0, 0xA0A0A0, 0x707070, 0x808080),
    ),
    theme(
        "midnight_blue",
        "Midnight Blue",
        "Navy background with gold roads",
        0x0A1628,
        0xFFD700,
        0x0D1E36,
        0x0F2440,
        roads(0xFFD700, 0xE6C200, 0xCCB000, 0xB39900, 0x8C7700, 0x997700),
    ),
    theme(
        "blueprint",
        "Blueprint",
        "Architectural blueprint aesthetic",
        0x1E3A5F,
        0xFFFFFF,
        0x2A4A70,
        0x254060,
        roads(0xFFFFFF, 0xE8F0F8, 0xD0E0F0, 0xB8D0E8, 0x90B0D0, 0xA0C0E0),
    ),
    theme(
        "neon_cyberpunk",
        "Neon Cyberpunk",
        "Dark with electric pink and cyan",
        0x0D0D0D,
        0xFF00FF,
        0x00CED1,
        0x1A1A2E,
        roads(0xFF1493, 0xFF69B4, 0xDA70D6, 0xBA55D3, 0x9370DB, 0x8A2BE2),
    ),
    theme(
        "warm_beige",
        "Warm Beige",
        "Vintage sepia tones",
        0xF5F0E6,
        0x3D3D3D,
        0xD4C8B8,
        0xE8E0D0,
        roads(0x2D2D2D, 0x4A4A4A, 0x5A5A5A, 0x6A6A6A, 0x8A8A8A, 0x7A7A7A),
    ),
    theme(
        "pastel_dream",
        "Pastel Dream",
        "Soft muted pastels",
        0xFFF5F5,
        0x4A4A6A,
        0xE8E0F0,
        0xE8F5E8,
        roads(0x6B5B7A, 0x7A6A8A, 0x8A7A9A, 0x9A8AAA, 0xBAA0CA, 0xAA90BA),
    ),
    theme(
        "japanese_ink",
        "Japanese Ink",
        "Minimalist ink wash style",
        0xFAF8F5,
        0x2C2C2C,
        0xE8E4E0,
        0xF0ECE8,
        roads(0x1A1A1A, 0x2A2A2A, 0x3A3A3A, 0x4A4A4A, 0x6A6A6A, 0x5A5A5A),
    ),
    theme(
        "forest",
        "Forest",
        "Deep greens and sage",
        0x1A2F1A,
        0xC8E6C8,
        0x1A3530,
        0x2A4A2A,
        roads(0x90EE90, 0x7CDB7C, 0x68C868, 0x54B554, 0x3C8C3C, 0x48A048),
    ),
    theme(
        "ocean",
        "Ocean",
        "Blues and teals for coastal cities",
        0x0A1929,
        0x00D4FF,
        0x0D2137,
        0x0F2940,
        roads(0x00D4FF, 0x00BFEA, 0x00AAD5, 0x0095C0, 0x006B96, 0x0080AB),
    ),
    theme(
        "terracotta",
        "Terracotta",
        "Mediterranean warmth",
        0x2D1810,
        0xE8A87C,
        0x3A2015,
        0x352515,
        roads(0xE8A87C, 0xD89868, 0xC88858, 0xB87848, 0x986030, 0xA8683C),
    ),
    theme(
        "sunset",
        "Sunset",
        "Warm oranges and pinks",
        0x1A0A1A,
        0xFF6B6B,
        0x2A1020,
        0x251520,
        roads(0xFF6B6B, 0xFF8E72, 0xFFB179, 0xFFD480, 0xFFC87F, 0xFFB87D),
    ),
    theme(
        "autumn",
        "Autumn",
        "Seasonal burnt oranges and reds",
        0x1F1208,
        0xFF7F50,
        0x2A1A0A,
        0x35200A,
        roads(0xFF7F50, 0xFF6347, 0xE55A3C, 0xCC5030, 0x993820, 0xB34828),
    ),
    theme(
        "copper_patina",
        "Copper Patina",
        "Oxidized copper aesthetic",
        0x1A2A28,
        0x7FCEA0,
        0x203530,
        0x254038,
        roads(0x7FCEA0, 0x6DB88C, 0x5BA278, 0x498C64, 0x306040, 0x3D7050),
    ),
    theme(
        "monochrome_blue",
        "Monochrome Blue",
        "Single blue color family",
        0x0A1520,
        0x4A90D9,
        0x0D1A28,
        0x101F30,
        roads(0x4A90D9, 0x4080C9, 0x3670B9, 0x2C60A9, 0x1E4080, 0x255090),
    ),
    theme(
        "feature_based",
        "Feature Based",
        "Classic black and white with road hierarchy",
        0xFFFFFF,
        0x000000,
        0xC0C0C0,
        0xF0F0F0,
        roads(0x0A0A0A, 0x1A1A1A, 0x2A2A2A, 0x3A3A3A, 0x4A4A4A, 0x3A3A3A),
    ),
    theme(
        "gradient_roads",
        "Gradient Roads",
        "Smooth gradient shading",
        0xF8F8F8,
        0x333333,
        0xD8D8D8,
        0xE8E8E8,
        roads(0x1A1A1A, 0x2A2A2A, 0x3A3A3A, 0x4A4A4A, 0x5A5A5A, 0x4A4A4A),
    ),
    theme(
        "contrast_zones",
        "Contrast Zones",
        "High contrast urban density",
        0xFAFAFA,
        0x1A1A1A,
        0xB0B0B0,
        0xD0D0D0,
        roads(0x000000, 0x1A1A1A, 0x2A2A2A, 0x3A3A3A, 0x5A5A5A, 0x4A4A4A),
    ),
];

static THEME_INDEX: Lazy<HashMap<&'static str, &'static Theme>> =
    Lazy::new(|| THEMES.iter().map(|theme| (theme.key, theme)).collect());

/// Look up a theme by key, falling back to [`DEFAULT_THEME`] for unknown names.
pub fn get_theme(name: &str) -> &'static Theme {
    THEME_INDEX.get(name).copied().unwrap_or_else(|| {
        tracing::debug!("unknown theme {name:?}, falling back to {DEFAULT_THEME}");
        &THEMES[0]
    })
}

pub fn theme_names() -> impl Iterator<Item = &'static str> {
    THEMES.iter().map(|theme| theme.key)
}
