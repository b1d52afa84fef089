use std::{num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use tracing::warn;

use crate::geocode::DEFAULT_NOMINATIM_URL;
use crate::overpass::DEFAULT_OVERPASS_URL;

pub const DEFAULT_USER_AGENT: &str = concat!("terraposter/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SNAPSHOT_CACHE_SIZE: usize = 16;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub nominatim_url: String,
    pub overpass_url: String,
    pub user_agent: String,
    pub bind_addr: String,
    /// Serve map features from this extract instead of Overpass.
    pub pbf_path: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub snapshot_cache_size: NonZeroUsize,
    pub http_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let path = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        };

        let cache_size = parsed(&lookup, "SNAPSHOT_CACHE_SIZE", DEFAULT_SNAPSHOT_CACHE_SIZE);
        let timeout_secs = parsed(&lookup, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS);

        Self {
            nominatim_url: text("NOMINATIM_URL", DEFAULT_NOMINATIM_URL),
            overpass_url: text("OVERPASS_URL", DEFAULT_OVERPASS_URL),
            user_agent: text("POSTER_USER_AGENT", DEFAULT_USER_AGENT),
            bind_addr: text("BIND_ADDR", DEFAULT_BIND_ADDR),
            pbf_path: path("PBF_PATH"),
            cache_dir: path("CACHE_DIR"),
            snapshot_cache_size: NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN),
            http_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{key}={raw:?} is not valid, using {default}");
            default
        }),
    }
}
