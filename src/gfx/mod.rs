//! wgpu backend for [`SceneRenderer`](crate::core::SceneRenderer).

pub mod mesh;
mod renderer;

pub use renderer::GpuRenderer;
