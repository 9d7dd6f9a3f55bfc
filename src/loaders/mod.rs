pub mod asset_loader;
pub mod gltf;

pub use asset_loader::{
    completion_channel, AssetLoader, AssetPath, AssetSource, CompletionSender, LoadCompletion,
    LoadCompletions, LoadTicket, ThreadedLoader,
};
pub use gltf::{asset_from_gltf, load_gltf_slice, GltfSource};
