// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::config::ViewerConfig;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "diorama")]
#[command(about = "Animated 3D asset diorama viewer", long_about = None)]
pub struct Cli {
    /// Asset name to load at startup, resolved as <asset-dir>/<name>.<extension>
    #[arg(long)]
    pub asset: Option<String>,

    /// Directory holding the assets
    #[arg(long = "asset-dir")]
    pub asset_dir: Option<PathBuf>,

    /// Asset file extension (glb or gltf)
    #[arg(long)]
    pub extension: Option<String>,

    /// JSON config file; command-line flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Animation playback rate
    #[arg(long)]
    pub rate: Option<f32>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,
}

impl Cli {
    /// Overlay the flags that were given onto `config`
    pub fn apply(&self, config: &mut ViewerConfig) {
        if let Some(asset) = &self.asset {
            config.asset = asset.clone();
        }
        if let Some(dir) = &self.asset_dir {
            config.asset_dir = dir.clone();
        }
        if let Some(ext) = &self.extension {
            config.asset_extension = ext.trim_start_matches('.').to_string();
        }
        if let Some(rate) = self.rate {
            config.playback_rate = rate;
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
    }

    /// Config file (if any) with the flags applied on top
    pub fn resolve_config(&self) -> anyhow::Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)?,
            None => ViewerConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }
}
