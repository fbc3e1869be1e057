use glam::Vec3;

/// Vertex layout shared by the decoder and the GPU mesh pipeline.
/// Must match `VertexInput` in mesh.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 4]) -> Self {
        Self {
            position,
            normal,
            color,
        }
    }
}

/// One triangle list with a single material, in chunk-local space.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMesh {
    pub name: String,
    /// Material base color factor (linear RGBA).
    pub base_color: [f32; 4],
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    /// Vertices with the material base color folded into the vertex color.
    pub fn shaded_vertices(&self) -> Vec<MeshVertex> {
        self.vertices
            .iter()
            .map(|v| {
                let mut color = v.color;
                for (c, b) in color.iter_mut().zip(self.base_color) {
                    *c *= b;
                }
                MeshVertex { color, ..*v }
            })
            .collect()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Decoded contents of one chunk asset, positioned at the local origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkScene {
    pub meshes: Vec<ChunkMesh>,
}

impl ChunkScene {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices.len() / 3).sum()
    }

    /// `None` for a scene without vertices.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut iter = self
            .meshes
            .iter()
            .flat_map(|m| m.vertices.iter())
            .map(|v| Vec3::from(v.position));
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Bounds { min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> ChunkMesh {
        let up = [0.0, 1.0, 0.0];
        let white = [1.0; 4];
        ChunkMesh {
            name: "quad".into(),
            base_color: [0.5, 1.0, 0.25, 1.0],
            vertices: vec![
                MeshVertex::new([-1.0, 0.0, -1.0], up, white),
                MeshVertex::new([1.0, 0.0, -1.0], up, white),
                MeshVertex::new([1.0, 2.0, 1.0], up, [0.5, 0.5, 0.5, 1.0]),
                MeshVertex::new([-1.0, 0.0, 1.0], up, white),
            ],
            indices: vec![0, 2, 1, 0, 3, 2],
        }
    }

    #[test]
    fn test_counts_and_bounds() {
        let scene = ChunkScene {
            meshes: vec![quad()],
        };
        assert_eq!(scene.vertex_count(), 4);
        assert_eq!(scene.triangle_count(), 2);
        let bounds = scene.bounds().expect("non-empty");
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 1.0));
        assert_eq!(bounds.size(), Vec3::new(2.0, 2.0, 2.0));
        assert!(ChunkScene::default().bounds().is_none());
    }

    #[test]
    fn test_shaded_vertices_apply_base_color() {
        let shaded = quad().shaded_vertices();
        assert_eq!(shaded[0].color, [0.5, 1.0, 0.25, 1.0]);
        assert_eq!(shaded[2].color, [0.25, 0.5, 0.125, 1.0]);
        assert_eq!(shaded[2].position, [1.0, 2.0, 1.0]);
    }
}
