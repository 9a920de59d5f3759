//! JSON config with defaults-on-failure loading.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Runtime configuration. Every field has a sensible default so a missing or
/// partial config file still yields a working pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture tick cadence in milliseconds.
    pub tick_interval_ms: u64,
    /// Requested palette size per tick.
    pub palette_size: usize,
    /// Transition duration passed to color commands, in milliseconds.
    pub transition_ms: u64,
    /// Brightness level sent once after connecting (1-100).
    pub initial_brightness: u16,
    /// Logical brightness channel: 2 targets the background light on
    /// dual-light models, anything else the main light.
    pub brightness_channel: u8,
    /// Delay between discovery broadcasts while searching, in milliseconds.
    pub discovery_poll_ms: u64,
    /// Capture sample grid width (frames are decimated to roughly this size).
    pub sample_width: u32,
    /// Capture sample grid height.
    pub sample_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1300,
            palette_size: 2,
            transition_ms: 500,
            initial_brightness: 100,
            brightness_channel: 1,
            discovery_poll_ms: 100,
            sample_width: 96,
            sample_height: 54,
        }
    }
}

/// Generic load for any Serde config type with a `Default` implementation.
/// Falls back to `T::default()` if the file is missing or unparsable.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path) -> T {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<T>(&content) {
            Ok(config) => {
                info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("failed to parse config {}: {e}; using defaults", path.display());
                T::default()
            }
        },
        Err(_) => {
            info!("no config file at {}; using defaults", path.display());
            T::default()
        }
    }
}

/// Generic save for any Serde config type.
pub fn save_json_config<T: Serialize>(path: &Path, config: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("glowsync.json");

        let config = Config {
            tick_interval_ms: 250,
            palette_size: 4,
            ..Config::default()
        };
        save_json_config(&path, &config).unwrap();

        let loaded: Config = load_json_config(&path);
        assert_eq!(loaded.tick_interval_ms, 250);
        assert_eq!(loaded.palette_size, 4);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let loaded: Config = load_json_config(Path::new("/nonexistent/glowsync.json"));
        assert_eq!(loaded.tick_interval_ms, Config::default().tick_interval_ms);
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("glowsync.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded: Config = load_json_config(&path);
        assert_eq!(loaded.palette_size, Config::default().palette_size);
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("glowsync.json");
        std::fs::write(&path, r#"{"tick_interval_ms": 700}"#).unwrap();

        let loaded: Config = load_json_config(&path);
        assert_eq!(loaded.tick_interval_ms, 700);
        assert_eq!(loaded.transition_ms, Config::default().transition_ms);
    }
}
