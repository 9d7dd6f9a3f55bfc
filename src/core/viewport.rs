use glam::{Mat4, Vec3};

use super::renderer::SceneRenderer;
use super::surface::SurfaceSize;
use crate::config::CameraConfig;
use crate::error::RenderError;
use crate::scene::SceneGraph;

/// Perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            fov_y_degrees: config.fov_y_degrees,
            aspect,
            near: config.near,
            far: config.far,
            position: Vec3::from_array(config.position),
            target: Vec3::from_array(config.target),
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Right-handed projection with a 0..1 depth range
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Orbit-control state; the diorama keeps every interaction switched off
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_zoom: bool,
    pub enable_rotate: bool,
    pub enable_pan: bool,
}

impl OrbitControls {
    /// Controls with zoom, rotate and pan disabled
    pub fn locked(target: Vec3) -> Self {
        Self {
            target,
            enable_zoom: false,
            enable_rotate: false,
            enable_pan: false,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.enable_zoom || self.enable_rotate || self.enable_pan
    }

    /// Aim the camera at the control target
    pub fn update(&self, camera: &mut Camera) {
        camera.target = self.target;
    }
}

/// Camera, controls and the renderer drawing into the host surface
pub struct Viewport<R: SceneRenderer> {
    camera: Camera,
    controls: OrbitControls,
    renderer: R,
    size: SurfaceSize,
    released: bool,
}

impl<R: SceneRenderer> Viewport<R> {
    pub fn new(mut renderer: R, size: SurfaceSize, config: &CameraConfig) -> Self {
        let mut camera = Camera::new(config, size.aspect().unwrap_or(1.0));
        let controls = OrbitControls::locked(Vec3::from_array(config.target));
        controls.update(&mut camera);

        if !size.is_empty() {
            renderer.resize(size);
        }

        Self {
            camera,
            controls,
            renderer,
            size,
            released: false,
        }
    }

    /// Recompute the aspect ratio and resize the render target
    ///
    /// Empty sizes (minimised windows) are remembered but leave the camera and
    /// render target as they were.
    pub fn resize(&mut self, width: u32, height: u32) {
        let size = SurfaceSize::new(width, height);
        self.size = size;

        let Some(aspect) = size.aspect() else {
            log::debug!("Ignoring empty resize {}x{}", width, height);
            return;
        };
        if self.released {
            return;
        }

        self.camera.aspect = aspect;
        self.renderer.resize(size);
    }

    /// Draw `scene` from the camera; no-op once released
    pub fn render(&mut self, scene: &SceneGraph) -> Result<(), RenderError> {
        if self.released || self.size.is_empty() {
            return Ok(());
        }
        self.renderer.render(scene, &self.camera)
    }

    /// Free renderer surface resources
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.renderer.release();
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}
