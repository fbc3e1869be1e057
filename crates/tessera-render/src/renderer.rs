use glam::{Mat4, Vec3};
use tessera_assets::{ChunkScene, MeshVertex};
use wgpu::util::DeviceExt;

use crate::chunk::{merge_scene, ChunkUniforms, GpuChunk};
use crate::debug_lines::DebugVertex;
use crate::lighting::SceneLight;

/// Maximum number of debug line vertices the buffer can hold.
const MAX_DEBUG_VERTICES: u64 = 4096;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

/// GPU camera uniform. Must match CameraUniforms in mesh.wgsl and debug_lines.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniforms {
    pub fn new(view_proj: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
        }
    }
}

/// Owns the pipelines and frame-level GPU resources. Per-chunk resources
/// live in `GpuChunk` handles created by `upload_chunk`.
pub struct Renderer {
    // Lit meshes
    mesh_pipeline: wgpu::RenderPipeline,
    frame_bind_group: wgpu::BindGroup,
    chunk_bgl: wgpu::BindGroupLayout,
    camera_uniform_buffer: wgpu::Buffer,
    #[allow(dead_code)] // Bound in frame_bind_group; static after init
    light_uniform_buffer: wgpu::Buffer,
    // Depth
    depth_view: wgpu::TextureView,
    // Debug lines
    debug_lines_pipeline: wgpu::RenderPipeline,
    debug_bind_group: wgpu::BindGroup,
    debug_vertex_buffer: wgpu::Buffer,
    debug_vertex_count: u32,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        light: &SceneLight,
    ) -> Self {
        let mesh_wgsl = include_str!("../../../shaders/render/mesh.wgsl");
        let debug_lines_wgsl = include_str!("../../../shaders/render/debug_lines.wgsl");

        let mesh_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh-shader"),
            source: wgpu::ShaderSource::Wgsl(mesh_wgsl.into()),
        });
        let debug_lines_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("debug-lines-shader"),
            source: wgpu::ShaderSource::Wgsl(debug_lines_wgsl.into()),
        });

        // -- Uniform buffers --
        let camera_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera-uniforms"),
            contents: bytemuck::bytes_of(&CameraUniforms::new(Mat4::IDENTITY)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let light_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("light-uniforms"),
            contents: bytemuck::bytes_of(&light.to_uniforms()),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        // -- Bind group layouts --
        let frame_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-bgl"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        let chunk_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("chunk-bgl"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        let debug_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("debug-bgl"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        // -- Bind groups --
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bg"),
            layout: &frame_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let debug_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("debug-bg"),
            layout: &debug_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_uniform_buffer.as_entire_binding(),
            }],
        });

        // -- Mesh pipeline --
        let mesh_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh-pipeline-layout"),
            bind_group_layouts: &[&frame_bgl, &chunk_bgl],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh-pipeline"),
            layout: Some(&mesh_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &mesh_module,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MeshVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 12,
                            shader_location: 1,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x4,
                            offset: 24,
                            shader_location: 2,
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &mesh_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        // -- Debug lines pipeline --
        let debug_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("debug-pipeline-layout"),
                bind_group_layouts: &[&debug_bgl],
                push_constant_ranges: &[],
            });

        let debug_vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("debug-vertex-buffer"),
            size: MAX_DEBUG_VERTICES * std::mem::size_of::<DebugVertex>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let debug_lines_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("debug-lines-pipeline"),
            layout: Some(&debug_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &debug_lines_module,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<DebugVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x4,
                            offset: 12,
                            shader_location: 1,
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            // Depth-tested against the meshes but never written.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &debug_lines_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        let depth_view = Self::create_depth_view(device, width, height);

        Self {
            mesh_pipeline,
            frame_bind_group,
            chunk_bgl,
            camera_uniform_buffer,
            light_uniform_buffer,
            depth_view,
            debug_lines_pipeline,
            debug_bind_group,
            debug_vertex_buffer,
            debug_vertex_count: 0,
        }
    }

    /// Recreate the depth buffer on canvas resize.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_view = Self::create_depth_view(device, width, height);
    }

    /// Upload a decoded chunk placed at `offset` in world space.
    pub fn upload_chunk(
        &self,
        device: &wgpu::Device,
        scene: &ChunkScene,
        offset: Vec3,
    ) -> GpuChunk {
        let (vertices, indices) = merge_scene(scene);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("chunk-vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("chunk-indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("chunk-uniforms"),
            contents: bytemuck::bytes_of(&ChunkUniforms::at(offset)),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("chunk-bg"),
            layout: &self.chunk_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        GpuChunk::new(
            vertex_buffer,
            index_buffer,
            indices.len() as u32,
            uniform_buffer,
            bind_group,
            scene,
            offset,
        )
    }

    /// Encode the mesh pass followed by the debug line pass.
    pub fn render<'a>(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        chunks: impl IntoIterator<Item = &'a GpuChunk>,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("world-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
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

        pass.set_pipeline(&self.mesh_pipeline);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        for chunk in chunks {
            if chunk.index_count == 0 {
                continue;
            }
            pass.set_bind_group(1, &chunk.bind_group, &[]);
            pass.set_vertex_buffer(0, chunk.vertex_buffer.slice(..));
            pass.set_index_buffer(chunk.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..chunk.index_count, 0, 0..1);
        }

        if self.debug_vertex_count > 0 {
            pass.set_pipeline(&self.debug_lines_pipeline);
            pass.set_bind_group(0, &self.debug_bind_group, &[]);
            pass.set_vertex_buffer(0, self.debug_vertex_buffer.slice(..));
            pass.draw(0..self.debug_vertex_count, 0..1);
        }
    }

    /// Upload the camera view-projection each frame.
    pub fn update_camera(&self, queue: &wgpu::Queue, view_proj: Mat4) {
        queue.write_buffer(
            &self.camera_uniform_buffer,
            0,
            bytemuck::bytes_of(&CameraUniforms::new(view_proj)),
        );
    }

    /// Replace the debug line vertices. Excess vertices are dropped.
    pub fn update_debug_lines(&mut self, queue: &wgpu::Queue, vertices: &[DebugVertex]) {
        let count = clamp_debug_count(vertices.len());
        self.debug_vertex_count = count as u32;
        if count > 0 {
            queue.write_buffer(
                &self.debug_vertex_buffer,
                0,
                bytemuck::cast_slice(&vertices[..count]),
            );
        }
    }

    // -- Private helpers --

    fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Debug lines are a LineList, so the count is kept even.
fn clamp_debug_count(len: usize) -> usize {
    len.min(MAX_DEBUG_VERTICES as usize) & !1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_uniforms_layout() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 64);
        let u = CameraUniforms::new(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(u.view_proj[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_mesh_vertex_stride_matches_attributes() {
        // position (12) + normal (12) + color (16)
        assert_eq!(std::mem::size_of::<MeshVertex>(), 40);
        assert_eq!(std::mem::size_of::<DebugVertex>(), 28);
    }

    #[test]
    fn test_debug_count_clamped_and_even() {
        assert_eq!(clamp_debug_count(0), 0);
        assert_eq!(clamp_debug_count(7), 6);
        assert_eq!(clamp_debug_count(24), 24);
        assert_eq!(clamp_debug_count(100_000), MAX_DEBUG_VERTICES as usize);
    }
}
