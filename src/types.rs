use crate::core::Camera;
use crate::math::srgb_to_linear;
use crate::scene::SceneGraph;

/// Vertex layout shared by the ground, grid and asset pipelines
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Linear RGB plus alpha
    pub color: [f32; 4],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 4]) -> Self {
        Self {
            position,
            normal,
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-frame uniform block: camera, fog and the light rig
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub fog_color: [f32; 4],
    /// x = near, y = far
    pub fog_range: [f32; 4],
    /// w = intensity
    pub sky_color: [f32; 4],
    pub ground_color: [f32; 4],
    /// Unit vector towards the directional light
    pub light_dir: [f32; 4],
    /// w = intensity
    pub light_color: [f32; 4],
}

impl SceneUniforms {
    pub fn new(scene: &SceneGraph, camera: &Camera) -> Self {
        let fog = scene.fog();
        let [fr, fg, fb] = srgb_to_linear(fog.color);

        let (sky, ground, sky_intensity) = scene
            .hemisphere_light()
            .map(|h| (srgb_to_linear(h.sky_color), srgb_to_linear(h.ground_color), h.intensity))
            .unwrap_or(([0.0; 3], [0.0; 3], 0.0));

        let (dir, light, light_intensity) = scene
            .directional_light()
            .map(|d| (d.direction(), srgb_to_linear(d.color), d.intensity))
            .unwrap_or((glam::Vec3::Y, [0.0; 3], 0.0));

        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            fog_color: [fr, fg, fb, 1.0],
            fog_range: [fog.near, fog.far, 0.0, 0.0],
            sky_color: [sky[0], sky[1], sky[2], sky_intensity],
            ground_color: [ground[0], ground[1], ground[2], 0.0],
            light_dir: dir.extend(0.0).to_array(),
            light_color: [light[0], light[1], light[2], light_intensity],
        }
    }
}
