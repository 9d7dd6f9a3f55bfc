use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use super::mesh::{ground_mesh, grid_lines, AssetMesh};
use crate::core::{Camera, SceneRenderer, SurfaceSize};
use crate::error::RenderError;
use crate::math::srgb_to_linear;
use crate::scene::{SceneGraph, StaticEntity};
use crate::types::{MeshVertex, SceneUniforms};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// wgpu renderer drawing the diorama into a winit window
pub struct GpuRenderer {
    window: Arc<Window>,
    state: Option<GpuState>,
}

impl GpuRenderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let state = GpuState::new(window.clone()).await?;
        log::info!(
            "GPU renderer ready: {}x{} {:?}",
            state.config.width,
            state.config.height,
            state.config.format
        );
        Ok(Self {
            window,
            state: Some(state),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn is_released(&self) -> bool {
        self.state.is_none()
    }
}

impl SceneRenderer for GpuRenderer {
    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), RenderError> {
        match self.state.as_mut() {
            Some(state) => state.render(scene, camera),
            None => Ok(()),
        }
    }

    fn resize(&mut self, size: SurfaceSize) {
        if let Some(state) = self.state.as_mut() {
            state.resize(size);
        }
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            log::info!("Released GPU surface and buffers");
        }
    }
}

struct MeshBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

struct StaticGeometry {
    ground: Option<MeshBuffers>,
    grid: Option<(wgpu::Buffer, u32)>,
}

/// Buffers of the attached asset, tied to its scene generation
struct DynamicGeometry {
    generation: u64,
    mesh: AssetMesh,
    buffers: MeshBuffers,
    staging: Vec<MeshVertex>,
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    ground_pipeline: wgpu::RenderPipeline,
    asset_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    statics: Option<StaticGeometry>,
    dynamic: Option<DynamicGeometry>,
}

impl GpuState {
    async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::Init(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::Init(format!("no suitable adapter: {e}")))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Diorama Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| RenderError::Init(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| RenderError::Init("surface reports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, config.width, config.height);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Diorama Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Diorama Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipelines = PipelineBuilder {
            device: &device,
            layout: &layout,
            shader: &shader,
            format,
        };
        let ground_pipeline = pipelines.build(PipelineKind::Ground);
        let asset_pipeline = pipelines.build(PipelineKind::Asset);
        let grid_pipeline = pipelines.build(PipelineKind::Grid);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            uniform_buffer,
            bind_group,
            ground_pipeline,
            asset_pipeline,
            grid_pipeline,
            statics: None,
            dynamic: None,
        })
    }

    fn resize(&mut self, size: SurfaceSize) {
        if size.is_empty() {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, size.width, size.height);
    }

    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), RenderError> {
        let uniforms = SceneUniforms::new(scene, camera);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        if self.statics.is_none() {
            self.statics = Some(self.build_statics(scene));
        }
        self.sync_dynamic(scene);

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Err(RenderError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(RenderError::Timeout),
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Diorama Encoder"),
            });

        let [r, g, b] = srgb_to_linear(scene.background());
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Diorama Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.bind_group, &[]);

            // Ground first: it does not write depth, so the asset and grid
            // draw over it regardless of order.
            if let Some(ground) = self.statics.as_ref().and_then(|s| s.ground.as_ref()) {
                pass.set_pipeline(&self.ground_pipeline);
                draw_indexed(&mut pass, ground);
            }

            if let Some(dynamic) = &self.dynamic {
                pass.set_pipeline(&self.asset_pipeline);
                draw_indexed(&mut pass, &dynamic.buffers);
            }

            if let Some((grid, count)) = self.statics.as_ref().and_then(|s| s.grid.as_ref()) {
                pass.set_pipeline(&self.grid_pipeline);
                pass.set_vertex_buffer(0, grid.slice(..));
                pass.draw(0..*count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn build_statics(&self, scene: &SceneGraph) -> StaticGeometry {
        let mut statics = StaticGeometry {
            ground: None,
            grid: None,
        };

        for entity in scene.static_entities() {
            match entity {
                StaticEntity::Ground(ground) => {
                    let (vertices, indices) = ground_mesh(ground);
                    statics.ground = Some(self.mesh_buffers("Ground", &vertices, &indices));
                }
                StaticEntity::Grid(grid) => {
                    let vertices = grid_lines(grid);
                    let buffer = self
                        .device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("Grid Vertices"),
                            contents: bytemuck::cast_slice(&vertices),
                            usage: wgpu::BufferUsages::VERTEX,
                        });
                    statics.grid = Some((buffer, vertices.len() as u32));
                }
                StaticEntity::Hemisphere(_) | StaticEntity::Directional(_) => {}
            }
        }
        statics
    }

    /// Matches GPU buffers to the scene's current dynamic node and poses them
    fn sync_dynamic(&mut self, scene: &SceneGraph) {
        let Some(node) = scene.dynamic_asset() else {
            if self.dynamic.take().is_some() {
                log::debug!("Dropped dynamic asset buffers");
            }
            return;
        };

        let stale = self
            .dynamic
            .as_ref()
            .map_or(true, |d| d.generation != node.generation());
        if stale {
            let graph = node.handle().graph();
            let mesh = AssetMesh::new(graph);
            if mesh.indices().is_empty() {
                self.dynamic = None;
                return;
            }

            let staging = Vec::with_capacity(mesh.vertex_count());
            let buffers = MeshBuffers {
                vertices: self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Asset Vertices"),
                    size: (mesh.vertex_count() * std::mem::size_of::<MeshVertex>())
                        as wgpu::BufferAddress,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
                indices: self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Asset Indices"),
                        contents: bytemuck::cast_slice(mesh.indices()),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                index_count: mesh.indices().len() as u32,
            };

            log::debug!(
                "Uploaded {} ({} vertices, generation {})",
                node.handle().name(),
                mesh.vertex_count(),
                node.generation()
            );
            self.dynamic = Some(DynamicGeometry {
                generation: node.generation(),
                mesh,
                buffers,
                staging,
            });
        }

        if let Some(dynamic) = self.dynamic.as_mut() {
            dynamic
                .mesh
                .pose_vertices(node.handle().graph(), node.pose(), &mut dynamic.staging);
            self.queue.write_buffer(
                &dynamic.buffers.vertices,
                0,
                bytemuck::cast_slice(&dynamic.staging),
            );
        }
    }

    fn mesh_buffers(&self, label: &str, vertices: &[MeshVertex], indices: &[u32]) -> MeshBuffers {
        let vertex_label = format!("{label} Vertices");
        let index_label = format!("{label} Indices");
        MeshBuffers {
            vertices: self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&vertex_label),
                    contents: bytemuck::cast_slice(vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
            indices: self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&index_label),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
            index_count: indices.len() as u32,
        }
    }
}

fn draw_indexed(pass: &mut wgpu::RenderPass<'_>, mesh: &MeshBuffers) {
    pass.set_vertex_buffer(0, mesh.vertices.slice(..));
    pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineKind {
    /// Lit floor, depth-tested but never written
    Ground,
    /// Lit asset triangles with depth writes
    Asset,
    /// Unlit translucent lines
    Grid,
}

struct PipelineBuilder<'a> {
    device: &'a wgpu::Device,
    layout: &'a wgpu::PipelineLayout,
    shader: &'a wgpu::ShaderModule,
    format: wgpu::TextureFormat,
}

impl PipelineBuilder<'_> {
    fn build(&self, kind: PipelineKind) -> wgpu::RenderPipeline {
        let (label, fragment, topology, depth_write, blend) = match kind {
            PipelineKind::Ground => (
                "Ground Pipeline",
                "fs_lit",
                wgpu::PrimitiveTopology::TriangleList,
                false,
                wgpu::BlendState::REPLACE,
            ),
            PipelineKind::Asset => (
                "Asset Pipeline",
                "fs_lit",
                wgpu::PrimitiveTopology::TriangleList,
                true,
                wgpu::BlendState::REPLACE,
            ),
            PipelineKind::Grid => (
                "Grid Pipeline",
                "fs_unlit",
                wgpu::PrimitiveTopology::LineList,
                false,
                wgpu::BlendState::ALPHA_BLENDING,
            ),
        };

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(self.layout),
                vertex: wgpu::VertexState {
                    module: self.shader,
                    entry_point: Some("vs_main"),
                    buffers: &[MeshVertex::desc()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: self.shader,
                    entry_point: Some(fragment),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: depth_write,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }
}
