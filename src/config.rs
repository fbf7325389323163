// SPDX-License-Identifier: MPL-2.0

//! User configuration handling

use crate::backends::DevicePosition;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Persisted application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Camera position preferred at session setup
    pub preferred_position: DevicePosition,
    /// Whether to attach a microphone input (best-effort)
    pub enable_audio: bool,
    /// Override for the photo library pictures directory
    pub pictures_dir: Option<PathBuf>,
    /// Override for the photo library videos directory
    pub videos_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preferred_position: DevicePosition::Back,
            enable_audio: true,
            pictures_dir: None,
            videos_dir: None,
        }
    }
}

impl Config {
    /// Default config file location (`~/.config/avcam/config.json`)
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("avcam")
            .join("config.json")
    }

    /// Load from the given path, falling back to defaults if the file is
    /// missing or unreadable
    pub fn load(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded config");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Write to the given path, creating parent directories as needed
    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_prefer_back_camera() {
        let config = Config::default();
        assert_eq!(config.preferred_position, DevicePosition::Back);
        assert!(config.enable_audio);
    }

    #[test]
    fn round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.preferred_position = DevicePosition::Front;
        config.enable_audio = false;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path), config);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let loaded = Config::load(std::path::Path::new("/nonexistent/config.json"));
        assert_eq!(loaded, Config::default());
    }
}
