//! Map features from a local OpenStreetMap PBF extract.

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use osmpbf::{Element, ElementReader};
use shared::{Bounds, GeoPoint, MapDataSnapshot};
use tracing::info;

use crate::ingest::{matches_query, BoxFuture, FeatureSource, FetchError, SnapshotBuilder};
use crate::projection::bounds_around;

type WayRecord = (i64, Vec<i64>, BTreeMap<String, String>);

#[derive(Debug, Clone)]
pub struct PbfFeatureSource {
    path: PathBuf,
}

impl PbfFeatureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeatureSource for PbfFeatureSource {
    fn name(&self) -> &'static str {
        "pbf"
    }

    fn fetch(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> BoxFuture<'_, Result<MapDataSnapshot, FetchError>> {
        let path = self.path.clone();
        Box::pin(async move {
            let bounds = bounds_around(center, radius_m)?;
            tokio::task::spawn_blocking(move || read_extract(&path, bounds)).await?
        })
    }
}

/// Read every poster feature touching `bounds` from the extract at `path`.
///
/// Three passes: node ids inside the bounds, selected ways with at least one
/// of those nodes, then coordinates for every node those ways reference, so
/// features crossing the frame edge keep their full geometry.
pub fn read_extract(path: &Path, bounds: Bounds) -> Result<MapDataSnapshot, FetchError> {
    info!("reading OSM extract {}", path.display());

    // PASS 1: nodes inside the frame
    let inside: HashSet<i64> = ElementReader::from_path(path)?
        .par_map_reduce(
            |element| -> Vec<i64> {
                match element {
                    Element::Node(node) if bounds.contains(GeoPoint::new(node.lat(), node.lon())) => {
                        vec![node.id()]
                    }
                    Element::DenseNode(node)
                        if bounds.contains(GeoPoint::new(node.lat(), node.lon())) =>
                    {
                        vec![node.id()]
                    }
                    _ => Vec::new(),
                }
            },
            Vec::new,
            |mut acc, ids| {
                acc.extend(ids);
                acc
            },
        )?
        .into_iter()
        .collect();

    // PASS 2: selected ways touching the frame
    let mut ways: Vec<WayRecord> = ElementReader::from_path(path)?.par_map_reduce(
        |element| -> Vec<WayRecord> {
            let Element::Way(way) = element else {
                return Vec::new();
            };
            let tags: Vec<(&str, &str)> = way.tags().collect();
            if !matches_query(&tags) {
                return Vec::new();
            }
            let refs: Vec<i64> = way.refs().collect();
            if !refs.iter().any(|id| inside.contains(id)) {
                return Vec::new();
            }
            let tags = tags
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            vec![(way.id(), refs, tags)]
        },
        Vec::new,
        |mut acc, found| {
            acc.extend(found);
            acc
        },
    )?;
    // Blocks are reduced in arbitrary order.
    ways.sort_by_key(|(id, _, _)| *id);

    // PASS 3: coordinates for every referenced node
    let needed: HashSet<i64> = ways
        .iter()
        .flat_map(|(_, refs, _)| refs.iter().copied())
        .collect();
    let nodes: Vec<(i64, GeoPoint)> = ElementReader::from_path(path)?.par_map_reduce(
        |element| -> Vec<(i64, GeoPoint)> {
            match element {
                Element::Node(node) if needed.contains(&node.id()) => {
                    vec![(node.id(), GeoPoint::new(node.lat(), node.lon()))]
                }
                Element::DenseNode(node) if needed.contains(&node.id()) => {
                    vec![(node.id(), GeoPoint::new(node.lat(), node.lon()))]
                }
                _ => Vec::new(),
            }
        },
        Vec::new,
        |mut acc, found| {
            acc.extend(found);
            acc
        },
    )?;

    info!(
        "extract: {} nodes inside frame, {} ways selected, {} nodes resolved",
        inside.len(),
        ways.len(),
        nodes.len()
    );

    let mut builder = SnapshotBuilder::new();
    for (id, point) in nodes {
        builder.add_node(id, point);
    }
    for (id, refs, tags) in ways {
        builder.add_way(id, refs, tags);
    }
    Ok(builder.build(bounds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_extract_is_an_error() {
        let bounds = bounds_around(GeoPoint::new(45.0, 5.0), 1000.0).expect("bounds");
        let err = read_extract(Path::new("/definitely/not/here.osm.pbf"), bounds).unwrap_err();
        assert!(matches!(err, FetchError::Pbf(_)));
    }

    #[tokio::test]
    async fn invalid_radius_fails_before_reading() {
        let source = PbfFeatureSource::new("/definitely/not/here.osm.pbf");
        let err = source
            .fetch(GeoPoint::new(45.0, 5.0), -1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Bounds(_)));
        assert_eq!(source.name(), "pbf");
    }

    #[test]
    fn garbage_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.osm.pbf");
        std::fs::write(&path, b"not a protobuf blob").expect("write");
        let bounds = bounds_around(GeoPoint::new(45.0, 5.0), 1000.0).expect("bounds");
        assert!(read_extract(&path, bounds).is_err());
    }
}
