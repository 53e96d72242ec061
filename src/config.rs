//! Application configuration
//!
//! Settings for the gallery, camera, models, and cooldowns. Defaults give a
//! working demo out of the box (12 picsum photos, 1000/1500 ms cooldowns); an
//! optional JSON file in the working directory overrides them.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "gesture-gallery.json";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Ordered photo URLs shown in the gallery
    pub photos: Vec<String>,
    /// Camera index to open at startup
    pub camera_index: u32,
    /// Directory holding the model files; autodetected when unset
    pub model_dir: Option<PathBuf>,
    /// Maximum hands the detector reports
    pub max_hands: usize,
    /// Minimum gap between two scroll actions, milliseconds
    pub scroll_cooldown_ms: u64,
    /// Minimum gap between two like actions, milliseconds
    pub like_cooldown_ms: u64,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            photos: default_photos(),
            camera_index: 0,
            model_dir: None,
            max_hands: 1,
            scroll_cooldown_ms: crate::predict::SCROLL_COOLDOWN_MS,
            like_cooldown_ms: crate::predict::LIKE_COOLDOWN_MS,
        }
    }
}

impl GalleryConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {:?}", path))?;
        let config: GalleryConfig =
            serde_json::from_str(&text).with_context(|| format!("parsing config {:?}", path))?;
        Ok(config)
    }

    /// Load the default config file if present, otherwise fall back to defaults
    pub fn load_or_default() -> Self {
        let path = PathBuf::from(CONFIG_FILE);
        if path.exists() {
            match Self::load(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {:?}", path);
                    return config;
                }
                Err(e) => {
                    log::warn!("Ignoring bad config {:?}: {:#}", path, e);
                }
            }
        }
        Self::default()
    }
}

/// The built-in photo set: 12 externally hosted images
fn default_photos() -> Vec<String> {
    [
        "https://picsum.photos/id/1018/600/800",
        "https://picsum.photos/id/1025/600/800",
        "https://picsum.photos/id/1033/600/800",
        "https://picsum.photos/id/1040/600/800",
        "https://picsum.photos/id/1041/600/800",
        "https://picsum.photos/id/1042/600/800",
        "https://picsum.photos/id/1043/600/800",
        "https://picsum.photos/id/1044/600/800",
        "https://picsum.photos/id/1045/600/800",
        "https://picsum.photos/id/1046/600/800",
        "https://picsum.photos/id/1047/600/800",
        "https://picsum.photos/id/1048/600/800",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_twelve_photos() {
        let config = GalleryConfig::default();
        assert_eq!(config.photos.len(), 12);
        assert_eq!(config.max_hands, 1);
        assert_eq!(config.scroll_cooldown_ms, 1000);
        assert_eq!(config.like_cooldown_ms, 1500);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: GalleryConfig =
            serde_json::from_str(r#"{ "camera_index": 2, "like_cooldown_ms": 2000 }"#).unwrap();

        assert_eq!(config.camera_index, 2);
        assert_eq!(config.like_cooldown_ms, 2000);
        assert_eq!(config.photos.len(), 12);
        assert_eq!(config.scroll_cooldown_ms, 1000);
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = GalleryConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        let parsed: GalleryConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.photos, config.photos);
    }
}
