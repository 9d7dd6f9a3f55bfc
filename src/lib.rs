pub mod animation;
pub mod asset;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod gfx;
pub mod loaders;
pub mod math;
pub mod scene;
pub mod types;

pub use animation::{AnimationDriver, DriverState, PLAYBACK_RATE};
pub use asset::AssetHandle;
pub use config::ViewerConfig;
pub use crate::core::{FrameOutcome, Session};
pub use error::{LoadError, RenderError};
pub use scene::SceneGraph;
