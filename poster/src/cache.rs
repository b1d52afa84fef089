//! Snapshot cache: an in-memory LRU with an optional zstd-compressed disk
//! layer underneath.

use std::{
    fs::File,
    io::{self, BufReader},
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use lru::LruCache;
use shared::{GeoPoint, MapDataSnapshot};
use tracing::{debug, warn};

const ZSTD_LEVEL: i32 = 3;

/// One snapshot per (location, radius): the center rounded to 1e-5 degrees
/// (about a meter) and the radius rounded to whole meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    lat_e5: i64,
    lon_e5: i64,
    radius_m: i64,
}

impl SnapshotKey {
    pub fn new(center: GeoPoint, radius_m: f64) -> Self {
        Self {
            lat_e5: (center.lat * 1e5).round() as i64,
            lon_e5: (center.lon * 1e5).round() as i64,
            radius_m: radius_m.round() as i64,
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "snapshot_{}_{}_{}.json.zst",
            self.lat_e5, self.lon_e5, self.radius_m
        )
    }
}

pub fn write_compressed(snapshot: &MapDataSnapshot, path: impl AsRef<Path>) -> Result<(), io::Error> {
    let file = File::create(path)?;
    let mut encoder = zstd::stream::write::Encoder::new(file, ZSTD_LEVEL)?;
    serde_json::to_writer(&mut encoder, snapshot)?;
    encoder.finish()?;
    Ok(())
}

pub fn read_compressed(path: impl AsRef<Path>) -> Result<MapDataSnapshot, io::Error> {
    let file = File::open(path)?;
    let decoder = zstd::stream::read::Decoder::new(file)?;
    serde_json::from_reader(BufReader::new(decoder))
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

pub struct SnapshotCache {
    memory: Mutex<LruCache<SnapshotKey, Arc<MapDataSnapshot>>>,
    dir: Option<PathBuf>,
}

impl SnapshotCache {
    pub fn new(capacity: NonZeroUsize, dir: Option<PathBuf>) -> Self {
        Self {
            memory: Mutex::new(LruCache::new(capacity)),
            dir,
        }
    }

    pub fn in_memory(capacity: NonZeroUsize) -> Self {
        Self::new(capacity, None)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Memory first, then the disk layer. Disk hits are promoted to memory.
    pub async fn get(&self, key: &SnapshotKey) -> Option<Arc<MapDataSnapshot>> {
        let hit = self.lock().get(key).cloned();
        if let Some(hit) = hit {
            debug!("snapshot cache hit (memory) {key:?}");
            return Some(hit);
        }

        let path = self.dir.as_ref()?.join(key.file_name());
        let read = tokio::task::spawn_blocking({
            let path = path.clone();
            move || path.exists().then(|| read_compressed(&path))
        })
        .await;
        match read {
            Ok(None) => None,
            Ok(Some(Ok(snapshot))) => {
                debug!("snapshot cache hit (disk) {}", path.display());
                let snapshot = Arc::new(snapshot);
                self.lock().put(*key, Arc::clone(&snapshot));
                Some(snapshot)
            }
            Ok(Some(Err(err))) => {
                warn!("ignoring unreadable cached snapshot {}: {err}", path.display());
                None
            }
            Err(err) => {
                warn!("snapshot cache read task failed: {err}");
                None
            }
        }
    }

    pub async fn insert(&self, key: SnapshotKey, snapshot: MapDataSnapshot) -> Arc<MapDataSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.lock().put(key, Arc::clone(&snapshot));

        if let Some(dir) = self.dir.clone() {
            let path = dir.join(key.file_name());
            let written = tokio::task::spawn_blocking({
                let path = path.clone();
                let snapshot = Arc::clone(&snapshot);
                move || std::fs::create_dir_all(&dir).and_then(|_| write_compressed(&snapshot, &path))
            })
            .await;
            match written {
                Ok(Ok(())) => debug!("cached snapshot to {}", path.display()),
                Ok(Err(err)) => warn!("failed to cache snapshot to {}: {err}", path.display()),
                Err(err) => warn!("snapshot cache write task failed: {err}"),
            }
        }

        snapshot
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<SnapshotKey, Arc<MapDataSnapshot>>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use shared::Bounds;

    use super::*;

    fn snapshot(lat: f64) -> MapDataSnapshot {
        MapDataSnapshot::empty(Bounds {
            south: lat - 0.5,
            north: lat + 0.5,
            west: 1.5,
            east: 2.5,
            center: GeoPoint::new(lat, 2.0),
            radius_m: 1000.0,
        })
    }

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).expect("non-zero")
    }

    #[test]
    fn keys_round_to_about_a_meter() {
        let a = SnapshotKey::new(GeoPoint::new(48.856_601, 2.352_201), 10_000.2);
        let b = SnapshotKey::new(GeoPoint::new(48.856_604, 2.352_199), 9_999.9);
        assert_eq!(a, b);
        let c = SnapshotKey::new(GeoPoint::new(48.856_601, 2.352_201), 5_000.0);
        assert_ne!(a, c);
        assert_eq!(a.file_name(), "snapshot_4885660_235220_10000.json.zst");
    }

    #[tokio::test]
    async fn memory_layer_evicts_least_recent() {
        let cache = SnapshotCache::in_memory(capacity(2));
        let keys: Vec<SnapshotKey> = (0..3)
            .map(|i| SnapshotKey::new(GeoPoint::new(i as f64, 0.0), 1000.0))
            .collect();
        for (i, key) in keys.iter().enumerate() {
            cache.insert(*key, snapshot(i as f64)).await;
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&keys[0]).await.is_none());
        assert!(cache.get(&keys[2]).await.is_some());
    }

    #[tokio::test]
    async fn disk_layer_survives_a_new_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key = SnapshotKey::new(GeoPoint::new(10.0, 20.0), 3000.0);
        let original = snapshot(10.0);

        let first = SnapshotCache::new(capacity(4), Some(dir.path().to_path_buf()));
        first.insert(key, original.clone()).await;
        assert!(dir.path().join(key.file_name()).exists());

        let second = SnapshotCache::new(capacity(4), Some(dir.path().to_path_buf()));
        assert!(second.is_empty());
        let restored = second.get(&key).await.expect("disk hit");
        assert_eq!(*restored, original);
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_disk_entry_is_a_miss() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key = SnapshotKey::new(GeoPoint::new(1.0, 1.0), 100.0);
        std::fs::write(dir.path().join(key.file_name()), b"garbage").expect("write");

        let cache = SnapshotCache::new(capacity(1), Some(dir.path().to_path_buf()));
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn unwritable_dir_still_caches_in_memory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"file").expect("write");
        let key = SnapshotKey::new(GeoPoint::new(2.0, 2.0), 100.0);

        let cache = SnapshotCache::new(capacity(2), Some(blocker.join("cache")));
        cache.insert(key, snapshot(2.0)).await;
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key).await.is_some());
    }
}
