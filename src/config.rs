//! Viewer configuration.
//!
//! Every field has a default matching the stock diorama, so a JSON file only
//! needs the keys it overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::animation::PLAYBACK_RATE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Asset loaded at startup
    pub asset: String,
    pub asset_dir: PathBuf,
    pub asset_extension: String,
    pub playback_rate: f32,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub scene: SceneConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset: "Samba Dancing".to_string(),
            asset_dir: PathBuf::from("assets"),
            asset_extension: "glb".to_string(),
            playback_rate: PLAYBACK_RATE,
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            scene: SceneConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid viewer config")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_json_str(&text).with_context(|| format!("In config file: {:?}", path))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Diorama".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    /// Fixed look-at point of the locked controls
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 1.0,
            far: 2000.0,
            position: [100.0, 200.0, 300.0],
            target: [0.0, 100.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// 0xRRGGBB
    pub background: u32,
    pub fog_near: f32,
    pub fog_far: f32,
    /// Uniform scale applied to loaded assets; glTF is authored in metres,
    /// the stage in centimetres
    pub asset_scale: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: 0xa0a0a0,
            fog_near: 200.0,
            fog_far: 1000.0,
            asset_scale: 100.0,
        }
    }
}
