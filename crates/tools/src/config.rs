use std::fs;
use std::path::{Path, PathBuf};

use layers::Symbology;
use scene::{DEFAULT_VIEWPORT_PX, FlyToConfig, INITIAL_VIEW_STATE, ViewState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Viewer settings. Every section is optional in the JSON file and falls
/// back to the built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub initial_view: ViewState,
    pub fly_to: FlyToConfig,
    /// Width and height in CSS pixels.
    pub viewport_px: [f64; 2],
    pub symbology: Symbology,
    /// Show the curated landmark labels when data is loaded.
    pub landmarks: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            initial_view: INITIAL_VIEW_STATE,
            fly_to: FlyToConfig::default(),
            viewport_px: DEFAULT_VIEWPORT_PX,
            symbology: Symbology::default(),
            landmarks: true,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let payload = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&payload).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
