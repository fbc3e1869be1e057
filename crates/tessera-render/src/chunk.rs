use glam::{Mat4, Vec3};
use tessera_assets::{Bounds, ChunkScene, MeshVertex};

/// Per-chunk model uniform. Must match ChunkUniforms in mesh.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChunkUniforms {
    pub model: [[f32; 4]; 4],
}

impl ChunkUniforms {
    pub fn at(offset: Vec3) -> Self {
        Self {
            model: Mat4::from_translation(offset).to_cols_array_2d(),
        }
    }
}

/// Concatenate every mesh of a scene into one vertex and one index list,
/// with material colors folded into the vertices.
pub fn merge_scene(scene: &ChunkScene) -> (Vec<MeshVertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(scene.vertex_count());
    let mut indices = Vec::with_capacity(scene.triangle_count() * 3);
    for mesh in &scene.meshes {
        let base = vertices.len() as u32;
        vertices.extend(mesh.shaded_vertices());
        indices.extend(mesh.indices.iter().map(|i| base + i));
    }
    (vertices, indices)
}

/// GPU resources of one loaded chunk.
///
/// Owned by the chunk registry while loaded. `release` must be called on
/// unload; a plain drop defers freeing until wgpu reclaims the buffers.
pub struct GpuChunk {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
    pub(crate) uniform_buffer: wgpu::Buffer,
    pub(crate) bind_group: wgpu::BindGroup,
    offset: Vec3,
    world_bounds: Option<Bounds>,
    triangle_count: usize,
}

impl GpuChunk {
    pub(crate) fn new(
        vertex_buffer: wgpu::Buffer,
        index_buffer: wgpu::Buffer,
        index_count: u32,
        uniform_buffer: wgpu::Buffer,
        bind_group: wgpu::BindGroup,
        scene: &ChunkScene,
        offset: Vec3,
    ) -> Self {
        let world_bounds = scene.bounds().map(|b| Bounds {
            min: b.min + offset,
            max: b.max + offset,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count,
            uniform_buffer,
            bind_group,
            offset,
            world_bounds,
            triangle_count: scene.triangle_count(),
        }
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    /// Scene bounds translated to world space.
    pub fn world_bounds(&self) -> Option<Bounds> {
        self.world_bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Bytes held in GPU buffers.
    pub fn gpu_bytes(&self) -> u64 {
        self.vertex_buffer.size() + self.index_buffer.size() + self.uniform_buffer.size()
    }

    /// Destroy the GPU buffers. Consumes the handle so it cannot be drawn again.
    pub fn release(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.uniform_buffer.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_assets::ChunkMesh;

    fn triangle(name: &str, base_color: [f32; 4]) -> ChunkMesh {
        let up = [0.0, 1.0, 0.0];
        ChunkMesh {
            name: name.into(),
            base_color,
            vertices: vec![
                MeshVertex::new([0.0, 0.0, 0.0], up, [1.0; 4]),
                MeshVertex::new([0.0, 0.0, 1.0], up, [1.0; 4]),
                MeshVertex::new([1.0, 0.0, 0.0], up, [1.0; 4]),
            ],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_merge_offsets_indices() {
        let scene = ChunkScene {
            meshes: vec![
                triangle("terrain", [0.2, 0.6, 0.2, 1.0]),
                triangle("cube_0", [0.9, 0.1, 0.1, 1.0]),
            ],
        };
        let (vertices, indices) = merge_scene(&scene);
        assert_eq!(vertices.len(), 6);
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(vertices[0].color, [0.2, 0.6, 0.2, 1.0]);
        assert_eq!(vertices[3].color, [0.9, 0.1, 0.1, 1.0]);
    }

    #[test]
    fn test_chunk_uniforms_translation() {
        let u = ChunkUniforms::at(Vec3::new(-3000.0, 0.0, 1500.0));
        assert_eq!(u.model[3], [-3000.0, 0.0, 1500.0, 1.0]);
        assert_eq!(u.model[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(std::mem::size_of::<ChunkUniforms>(), 64);
    }
}
