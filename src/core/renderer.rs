use super::surface::SurfaceSize;
use super::viewport::Camera;
use crate::error::RenderError;
use crate::scene::SceneGraph;

/// Rendering backend bound to a host drawable surface
pub trait SceneRenderer {
    /// Draw the scene from `camera` and present it
    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), RenderError>;

    /// Resize the render target
    fn resize(&mut self, size: SurfaceSize);

    /// Free surface and GPU resources; later calls must be harmless
    fn release(&mut self);
}

impl<R: SceneRenderer + ?Sized> SceneRenderer for Box<R> {
    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), RenderError> {
        (**self).render(scene, camera)
    }

    fn resize(&mut self, size: SurfaceSize) {
        (**self).resize(size)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
