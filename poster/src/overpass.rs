//! Map features from an Overpass API endpoint.

use std::{collections::BTreeMap, time::Duration};

use serde::Deserialize;
use shared::{Bounds, GeoPoint, MapDataSnapshot};
use tracing::{debug, info};

use crate::ingest::{
    BoxFuture, FeatureSource, FetchError, SnapshotBuilder, PARK_LANDUSE_KINDS, WATERWAY_KINDS,
};
use crate::projection::bounds_around;
use crate::style::ROAD_DRAW_ORDER;

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const QUERY_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OverpassElement {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    #[serde(other)]
    Other,
}

/// Overpass QL selecting roads, water and parks inside `bounds`, with the
/// referenced nodes appended in skeleton form.
pub fn build_query(bounds: &Bounds) -> String {
    let bbox = format!(
        "{},{},{},{}",
        bounds.south, bounds.west, bounds.north, bounds.east
    );
    let highways = ROAD_DRAW_ORDER.join("|");
    let waterways = WATERWAY_KINDS.join("|");
    let landuse = PARK_LANDUSE_KINDS.join("|");

    format!(
        "[out:json][timeout:{QUERY_TIMEOUT_SECS}];\n\
         (\n\
         way[\"highway\"~\"{highways}\"]({bbox});\n\
         way[\"natural\"=\"water\"]({bbox});\n\
         way[\"waterway\"~\"{waterways}\"]({bbox});\n\
         relation[\"natural\"=\"water\"]({bbox});\n\
         way[\"leisure\"=\"park\"]({bbox});\n\
         way[\"landuse\"~\"{landuse}\"]({bbox});\n\
         relation[\"leisure\"=\"park\"]({bbox});\n\
         );\n\
         out body;\n\
         >;\n\
         out skel qt;"
    )
}

/// Categorize an Overpass JSON answer. Nodes may appear before or after the
/// ways that reference them.
pub fn parse_response(body: &str, bounds: Bounds) -> Result<MapDataSnapshot, FetchError> {
    let response: OverpassResponse = serde_json::from_str(body)?;
    let mut builder = SnapshotBuilder::new();

    for element in response.elements {
        match element {
            OverpassElement::Node { id, lat, lon } => builder.add_node(id, GeoPoint::new(lat, lon)),
            OverpassElement::Way { id, nodes, tags } => builder.add_way(id, nodes, tags),
            OverpassElement::Other => {}
        }
    }

    debug!(
        "overpass answer: {} nodes, {} ways",
        builder.node_count(),
        builder.way_count()
    );
    Ok(builder.build(bounds))
}

#[derive(Debug, Clone)]
pub struct OverpassClient {
    http: reqwest::Client,
    url: String,
}

impl OverpassClient {
    pub fn new(
        url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub async fn fetch_bounds(&self, bounds: Bounds) -> Result<MapDataSnapshot, FetchError> {
        let query = build_query(&bounds);
        info!("fetching map data from {}", self.url);

        let response = self
            .http
            .post(&self.url)
            .form(&[("data", query)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.text().await?;
        parse_response(&body, bounds)
    }
}

impl FeatureSource for OverpassClient {
    fn name(&self) -> &'static str {
        "overpass"
    }

    fn fetch(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> BoxFuture<'_, Result<MapDataSnapshot, FetchError>> {
        Box::pin(async move {
            let bounds = bounds_around(center, radius_m)?;
            self.fetch_bounds(bounds).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../data/sample_overpass.json");

    fn sample_bounds() -> Bounds {
        bounds_around(GeoPoint::new(48.8566, 2.3522), 500.0).expect("bounds")
    }

    #[test]
    fn query_lists_every_selector() {
        let bounds = Bounds {
            south: 1.0,
            north: 2.0,
            west: 3.0,
            east: 4.0,
            center: GeoPoint::new(1.5, 3.5),
            radius_m: 1000.0,
        };
        let query = build_query(&bounds);
        assert!(query.starts_with("[out:json][timeout:60];"));
        assert!(query.contains("way[\"highway\"~\"unclassified|living_street|residential|"));
        assert!(query.contains("way[\"waterway\"~\"river|riverbank|stream|canal\"](1,3,2,4);"));
        assert!(query.contains("way[\"landuse\"~\"grass|forest|meadow\"](1,3,2,4);"));
        assert!(query.contains("relation[\"leisure\"=\"park\"](1,3,2,4);"));
        assert!(query.ends_with("out body;\n>;\nout skel qt;"));
    }

    #[test]
    fn sample_answer_is_categorized() {
        let snapshot = parse_response(SAMPLE, sample_bounds()).expect("parse");
        assert_eq!(snapshot.roads.len(), 3);
        assert_eq!(snapshot.water.len(), 1);
        assert_eq!(snapshot.parks.len(), 1);

        let types: Vec<&str> = snapshot.roads.iter().map(|r| r.road_type()).collect();
        assert_eq!(types, vec!["motorway", "residential", "primary"]);
    }

    #[test]
    fn ways_with_missing_nodes_are_dropped() {
        let body = r#"{"elements":[
            {"type":"node","id":1,"lat":0.0,"lon":0.0},
            {"type":"way","id":7,"nodes":[1,2],"tags":{"highway":"primary"}},
            {"type":"relation","id":9,"members":[]}
        ]}"#;
        let bounds = bounds_around(GeoPoint::new(0.0, 0.0), 100.0).expect("bounds");
        let snapshot = parse_response(body, bounds).expect("parse");
        assert_eq!(snapshot.feature_count(), 0);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let bounds = bounds_around(GeoPoint::new(0.0, 0.0), 100.0).expect("bounds");
        assert!(matches!(
            parse_response("<html>", bounds),
            Err(FetchError::Payload(_))
        ));
    }
}
