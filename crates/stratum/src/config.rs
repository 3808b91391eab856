//! Renderer and camera settings.
//!
//! Both structs are plain serde data with sensible defaults, so a JSON file
//! only needs the fields it changes:
//!
//! ```json
//! { "clear_color": { "r": 0.1, "g": 0.1, "b": 0.12, "a": 1.0 }, "cull_margin": 32.0 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};
use crate::render2d::Color;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for a [`Renderer`](crate::render2d::Renderer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Color the frame is cleared to.
    pub clear_color: Color,
    /// World units added around each camera viewport before culling.
    pub cull_margin: f32,
    /// Clip every camera to its screen viewport in multi-camera mode.
    pub split_scissor: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::BLACK,
            cull_margin: 0.0,
            split_scissor: true,
        }
    }
}

impl RenderConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }
}

/// Initial zoom settings for a [`Camera`](crate::camera::Camera).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

impl CameraConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
