//! Road classification, widths and draw order.

use shared::Feature;

use crate::canvas::Rgb;
use crate::theme::Theme;

pub const MIN_LINE_POINTS: usize = 2;
pub const MIN_AREA_POINTS: usize = 3;

/// Canvas width that corresponds to a base road width of one pixel.
const BASE_WIDTH_DIVISOR: f64 = 800.0;

/// Least important first, so the most important roads end up on top.
pub const ROAD_DRAW_ORDER: [&str; 13] = [
    "unclassified",
    "living_street",
    "residential",
    "tertiary_link",
    "tertiary",
    "secondary_link",
    "secondary",
    "primary_link",
    "primary",
    "trunk_link",
    "trunk",
    "motorway_link",
    "motorway",
];

/// Color for a highway subtype.
///
/// Matching is by substring on purpose: `motorway_link` draws as a motorway,
/// anything mentioning `primary` or `trunk` as primary.
pub fn road_color(road_type: &str, theme: &Theme) -> Rgb {
    let roads = &theme.roads;

    if road_type.contains("motorway") {
        roads.motorway
    } else if road_type.contains("trunk") || road_type.contains("primary") {
        roads.primary
    } else if road_type.contains("secondary") {
        roads.secondary
    } else if road_type.contains("tertiary") {
        roads.tertiary
    } else if road_type.contains("residential") || road_type == "living_street" {
        roads.residential
    } else {
        roads.default
    }
}

/// Width relative to the base width, keyed by exact subtype.
pub fn relative_road_width(road_type: &str) -> f64 {
    match road_type {
        "motorway" => 4.0,
        "motorway_link" => 3.0,
        "trunk" => 3.5,
        "trunk_link" => 2.5,
        "primary" => 3.0,
        "primary_link" => 2.0,
        "secondary" => 2.5,
        "secondary_link" => 1.8,
        "tertiary" => 2.0,
        "tertiary_link" => 1.5,
        "residential" => 1.2,
        "living_street" | "unclassified" => 1.0,
        _ => 1.0,
    }
}

pub fn base_road_width(canvas_width: f64) -> f64 {
    canvas_width / BASE_WIDTH_DIVISOR
}

pub fn road_width(road_type: &str, canvas_width: f64) -> f64 {
    relative_road_width(road_type) * base_road_width(canvas_width)
}

/// Position in [`ROAD_DRAW_ORDER`]; unknown subtypes sort before everything.
pub fn road_priority(road_type: &str) -> i32 {
    ROAD_DRAW_ORDER
        .iter()
        .position(|known| *known == road_type)
        .map(|idx| idx as i32)
        .unwrap_or(-1)
}

/// Roads in paint order. The sort is stable, so equal subtypes keep their
/// input order.
pub fn sort_roads_for_drawing(roads: &[Feature]) -> Vec<&Feature> {
    let mut sorted: Vec<&Feature> = roads.iter().collect();
    sorted.sort_by_key(|road| road_priority(road.road_type()));
    sorted
}

pub fn is_drawable_line(feature: &Feature) -> bool {
    feature.coordinates.len() >= MIN_LINE_POINTS
}

pub fn is_drawable_area(feature: &Feature) -> bool {
    feature.coordinates.len() >= MIN_AREA_POINTS
}
