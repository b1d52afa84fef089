//! Turning raw OSM nodes and ways into a categorized [`MapDataSnapshot`].

use std::{
    collections::{BTreeMap, HashMap},
    future::Future,
    io,
    pin::Pin,
};

use shared::{Bounds, Feature, FeatureCategory, GeoPoint, MapDataSnapshot};
use tracing::debug;

use crate::projection::BoundsError;
use crate::style::{MIN_LINE_POINTS, ROAD_DRAW_ORDER};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub const WATERWAY_KINDS: [&str; 4] = ["river", "riverbank", "stream", "canal"];
pub const PARK_LANDUSE_KINDS: [&str; 3] = ["grass", "forest", "meadow"];

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("map data request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("map data service answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed map data: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("failed to read OSM extract: {0}")]
    Pbf(#[from] osmpbf::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("map data task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Bounds(#[from] BoundsError),
}

/// Anything that can produce the map features around a point.
pub trait FeatureSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn fetch(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> BoxFuture<'_, Result<MapDataSnapshot, FetchError>>;
}

/// Category of a way from its tags, plus the road subtype for roads.
///
/// Precedence is highway, then water, then park; anything else is dropped.
pub fn classify(tags: &BTreeMap<String, String>) -> Option<(FeatureCategory, Option<String>)> {
    if let Some(highway) = tags.get("highway") {
        return Some((FeatureCategory::Road, Some(highway.clone())));
    }
    if tags.get("natural").map(String::as_str) == Some("water") || tags.contains_key("waterway") {
        return Some((FeatureCategory::Water, None));
    }
    if tags.get("leisure").map(String::as_str) == Some("park") || tags.contains_key("landuse") {
        return Some((FeatureCategory::Park, None));
    }
    None
}

/// Whether a way would be selected by the Overpass query for a poster.
///
/// Values are matched by substring, as the Overpass `~` operator does with an
/// unanchored pattern.
pub fn matches_query(tags: &[(&str, &str)]) -> bool {
    let tag = |key: &str| tags.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);
    let any_of = |key: &str, kinds: &[&str]| {
        tag(key).is_some_and(|value| kinds.iter().any(|kind| value.contains(kind)))
    };

    any_of("highway", &ROAD_DRAW_ORDER)
        || tag("natural") == Some("water")
        || any_of("waterway", &WATERWAY_KINDS)
        || tag("leisure") == Some("park")
        || any_of("landuse", &PARK_LANDUSE_KINDS)
}

#[derive(Debug, Clone)]
struct RawWay {
    id: i64,
    refs: Vec<i64>,
    tags: BTreeMap<String, String>,
}

/// Collects nodes and ways, then resolves and classifies them in way order.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    nodes: HashMap<i64, GeoPoint>,
    ways: Vec<RawWay>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: i64, point: GeoPoint) {
        self.nodes.insert(id, point);
    }

    pub fn add_way(&mut self, id: i64, refs: Vec<i64>, tags: BTreeMap<String, String>) {
        self.ways.push(RawWay { id, refs, tags });
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn way_count(&self) -> usize {
        self.ways.len()
    }

    pub fn build(self, bounds: Bounds) -> MapDataSnapshot {
        let mut snapshot = MapDataSnapshot::empty(bounds);
        let mut unresolved = 0usize;
        let mut unclassified = 0usize;

        for way in self.ways {
            let coordinates: Vec<GeoPoint> = way
                .refs
                .iter()
                .filter_map(|id| self.nodes.get(id).copied())
                .collect();
            if coordinates.len() < MIN_LINE_POINTS {
                unresolved += 1;
                continue;
            }

            let Some((category, road_type)) = classify(&way.tags) else {
                unclassified += 1;
                continue;
            };

            let feature = Feature {
                id: way.id,
                coordinates,
                tags: way.tags,
                category,
                road_type,
            };
            match category {
                FeatureCategory::Road => snapshot.roads.push(feature),
                FeatureCategory::Water => snapshot.water.push(feature),
                FeatureCategory::Park => snapshot.parks.push(feature),
            }
        }

        debug!(
            "snapshot: {} roads, {} water, {} parks ({unresolved} unresolved, {unclassified} unclassified ways dropped)",
            snapshot.roads.len(),
            snapshot.water.len(),
            snapshot.parks.len()
        );
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn highway_wins_over_other_tags() {
        let result = classify(&tags(&[("highway", "residential"), ("landuse", "grass")]));
        assert_eq!(
            result,
            Some((FeatureCategory::Road, Some("residential".to_string())))
        );
    }

    #[test]
    fn water_and_parks_are_recognized() {
        assert_eq!(
            classify(&tags(&[("natural", "water")])),
            Some((FeatureCategory::Water, None))
        );
        assert_eq!(
            classify(&tags(&[("waterway", "ditch")])),
            Some((FeatureCategory::Water, None))
        );
        assert_eq!(
            classify(&tags(&[("leisure", "park")])),
            Some((FeatureCategory::Park, None))
        );
        assert_eq!(
            classify(&tags(&[("landuse", "industrial")])),
            Some((FeatureCategory::Park, None))
        );
        assert_eq!(classify(&tags(&[("building", "yes")])), None);
        assert_eq!(classify(&tags(&[("natural", "wood")])), None);
    }

    #[test]
    fn query_selectors_match_overpass() {
        assert!(matches_query(&[("highway", "primary")]));
        assert!(matches_query(&[("highway", "motorway_link")]));
        assert!(!matches_query(&[("highway", "footway")]));
        assert!(matches_query(&[("waterway", "river")]));
        assert!(!matches_query(&[("waterway", "ditch")]));
        assert!(matches_query(&[("landuse", "forest")]));
        assert!(!matches_query(&[("landuse", "industrial")]));
        assert!(matches_query(&[("leisure", "park")]));
        assert!(!matches_query(&[("building", "yes")]));
    }

    #[test]
    fn builder_resolves_nodes_and_drops_short_ways() {
        let mut builder = SnapshotBuilder::new();
        builder.add_node(1, GeoPoint::new(0.0, 0.0));
        builder.add_node(2, GeoPoint::new(0.0, 0.001));
        builder.add_node(3, GeoPoint::new(0.001, 0.001));

        builder.add_way(10, vec![1, 2], tags(&[("highway", "primary")]));
        // Only one of its nodes is known.
        builder.add_way(11, vec![1, 99], tags(&[("highway", "secondary")]));
        builder.add_way(12, vec![1, 2, 3, 1], tags(&[("natural", "water")]));
        builder.add_way(13, vec![1, 2, 3], tags(&[("leisure", "park")]));
        builder.add_way(14, vec![1, 2, 3], tags(&[("amenity", "school")]));

        let bounds = Bounds::around(GeoPoint::new(0.0, 0.0), 500.0);
        let snapshot = builder.build(bounds);

        assert_eq!(snapshot.roads.len(), 1);
        assert_eq!(snapshot.roads[0].id, 10);
        assert_eq!(snapshot.roads[0].road_type(), "primary");
        assert_eq!(snapshot.water.len(), 1);
        assert_eq!(snapshot.water[0].coordinates.len(), 4);
        assert_eq!(snapshot.parks.len(), 1);
        assert_eq!(snapshot.bounds, bounds);
    }

    #[test]
    fn ways_keep_input_order_within_category() {
        let mut builder = SnapshotBuilder::new();
        builder.add_node(1, GeoPoint::new(0.0, 0.0));
        builder.add_node(2, GeoPoint::new(0.0, 0.001));
        for id in [5, 3, 9] {
            builder.add_way(id, vec![1, 2], tags(&[("highway", "residential")]));
        }
        let snapshot = builder.build(Bounds::around(GeoPoint::new(0.0, 0.0), 500.0));
        let ids: Vec<i64> = snapshot.roads.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 3, 9]);
    }
}
