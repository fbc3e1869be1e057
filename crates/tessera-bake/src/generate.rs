use std::ops::{Range, RangeInclusive};

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera_assets::{ChunkMesh, ChunkScene, MeshVertex};
use tessera_core::constants::CHUNK_SIZE;
use tessera_core::types::ChunkCoord;

use crate::error::BakeError;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Upper bound on terrain edge cuts (a 1026x1026 vertex grid).
pub const MAX_SUBDIVISIONS: u32 = 1024;

/// Procedural terrain parameters. Lengths are in world units.
#[derive(Debug, Clone)]
pub struct BakeParams {
    pub seed: u64,
    pub chunk_size: f32,
    /// Edge cuts of the terrain plane; `n` cuts give `n + 2` vertices per side.
    pub subdivisions: u32,
    /// Only vertices with |x| and |z| below this are displaced, so chunk edges stay flat and tile.
    pub inner_extent: f32,
    pub elevation: Range<f32>,
    pub cube_count: RangeInclusive<u32>,
    /// Cubes are scattered over [-spread, spread] on both axes.
    pub cube_spread: f32,
    pub cube_height: Range<f32>,
    pub cube_size: f32,
    pub cube_scale: Range<f32>,
}

impl Default for BakeParams {
    fn default() -> Self {
        Self {
            seed: 0,
            chunk_size: CHUNK_SIZE,
            subdivisions: 8,
            inner_extent: 650.0,
            elevation: -5.0..20.0,
            cube_count: 8..=15,
            cube_spread: 600.0,
            cube_height: 2.0..15.0,
            cube_size: 5.0,
            cube_scale: 1.0..8.0,
        }
    }
}

impl BakeParams {
    /// Defaults with horizontal extents scaled to `chunk_size`.
    pub fn for_chunk_size(chunk_size: f32) -> Self {
        let defaults = Self::default();
        let k = chunk_size / defaults.chunk_size;
        Self {
            chunk_size,
            inner_extent: defaults.inner_extent * k,
            cube_spread: defaults.cube_spread * k,
            ..defaults
        }
    }

    pub fn validate(&self) -> Result<(), BakeError> {
        if !(self.chunk_size.is_finite() && self.chunk_size > 0.0) {
            return Err(BakeError::InvalidParams(format!(
                "chunk_size must be positive and finite, got {}",
                self.chunk_size
            )));
        }
        if !(self.cube_spread.is_finite() && self.cube_spread > 0.0) {
            return Err(BakeError::InvalidParams(format!(
                "cube_spread must be positive and finite, got {}",
                self.cube_spread
            )));
        }
        if self.cube_spread * 2.0 > self.chunk_size {
            return Err(BakeError::InvalidParams(format!(
                "cube_spread {} places cubes outside a {} chunk",
                self.cube_spread, self.chunk_size
            )));
        }
        if !(self.cube_size.is_finite() && self.cube_size > 0.0) {
            return Err(BakeError::InvalidParams(format!(
                "cube_size must be positive and finite, got {}",
                self.cube_size
            )));
        }
        if !self.inner_extent.is_finite() {
            return Err(BakeError::InvalidParams(format!(
                "inner_extent must be finite, got {}",
                self.inner_extent
            )));
        }
        if self.subdivisions > MAX_SUBDIVISIONS {
            return Err(BakeError::InvalidParams(format!(
                "subdivisions must be <= {MAX_SUBDIVISIONS}, got {}",
                self.subdivisions
            )));
        }
        let ranges = [
            ("elevation", &self.elevation),
            ("cube_height", &self.cube_height),
            ("cube_scale", &self.cube_scale),
        ];
        for (name, range) in ranges {
            if !(range.start.is_finite() && range.end.is_finite()) {
                return Err(BakeError::InvalidParams(format!(
                    "{name} range {range:?} must be finite"
                )));
            }
            if range.is_empty() {
                return Err(BakeError::InvalidParams(format!("{name} range is empty")));
            }
        }
        if self.cube_count.is_empty() {
            return Err(BakeError::InvalidParams("cube_count range is empty".into()));
        }
        Ok(())
    }
}

/// Per-chunk RNG seed. Distinct coordinates get unrelated streams.
pub fn chunk_seed(seed: u64, coord: ChunkCoord) -> u64 {
    let x = coord.x as u32 as u64;
    let z = coord.z as u32 as u64;
    // splitmix64 finalizer over the packed coordinate
    let mut h = seed ^ (x << 32 | z);
    h = (h ^ (h >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^ (h >> 31)
}

/// Terrain plane plus scattered cubes for one chunk, centered on the local origin.
pub fn generate_chunk(coord: ChunkCoord, params: &BakeParams) -> ChunkScene {
    let mut rng = StdRng::seed_from_u64(chunk_seed(params.seed, coord));

    let heights = terrain_heights(&mut rng, params);

    let cube_count = rng.random_range(params.cube_count.clone());
    let mut meshes = Vec::with_capacity(cube_count as usize + 1);
    for i in 0..cube_count {
        let x = rng.random_range(-params.cube_spread..params.cube_spread);
        let z = rng.random_range(-params.cube_spread..params.cube_spread);
        let y = rng.random_range(params.cube_height.clone());
        let scale = rng.random_range(params.cube_scale.clone());
        let color = random_material_color(&mut rng);
        meshes.push(cube_mesh(
            format!("Cube_{}_{}", coord.id(), i),
            Vec3::new(x, y, z),
            params.cube_size * scale * 0.5,
            color,
        ));
    }

    let terrain_color = random_material_color(&mut rng);
    let terrain = terrain_mesh(
        format!("Chunk_{}", coord.id()),
        params.chunk_size,
        params.subdivisions + 2,
        &heights,
        terrain_color,
    );
    meshes.insert(0, terrain);

    ChunkScene { meshes }
}

/// Row-major (z outer, x inner) heights for the terrain grid.
fn terrain_heights(rng: &mut StdRng, params: &BakeParams) -> Vec<f32> {
    let side = params.subdivisions + 2;
    let mut heights = Vec::with_capacity((side * side) as usize);
    for j in 0..side {
        for i in 0..side {
            let x = grid_coord(i, side, params.chunk_size);
            let z = grid_coord(j, side, params.chunk_size);
            let h = if x.abs() < params.inner_extent && z.abs() < params.inner_extent {
                rng.random_range(params.elevation.clone())
            } else {
                0.0
            };
            heights.push(h);
        }
    }
    heights
}

fn grid_coord(index: u32, side: u32, size: f32) -> f32 {
    -size * 0.5 + size * index as f32 / (side - 1) as f32
}

/// Square grid of `side * side` vertices with smooth normals, wound
/// counter-clockwise seen from above.
fn terrain_mesh(name: String, size: f32, side: u32, heights: &[f32], color: [f32; 4]) -> ChunkMesh {
    let positions: Vec<Vec3> = (0..side)
        .flat_map(|j| (0..side).map(move |i| (i, j)))
        .map(|(i, j)| {
            Vec3::new(
                grid_coord(i, side, size),
                heights[(j * side + i) as usize],
                grid_coord(j, side, size),
            )
        })
        .collect();

    let mut indices = Vec::with_capacity(((side - 1) * (side - 1) * 6) as usize);
    for j in 0..side - 1 {
        for i in 0..side - 1 {
            let p00 = j * side + i;
            let p10 = p00 + 1;
            let p01 = p00 + side;
            let p11 = p01 + 1;
            indices.extend_from_slice(&[p00, p01, p10, p10, p01, p11]);
        }
    }

    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| positions[i as usize]);
        let face = (b - a).cross(c - a);
        for &i in tri {
            normals[i as usize] += face;
        }
    }

    let vertices = positions
        .iter()
        .zip(&normals)
        .map(|(p, n)| {
            let n = n.try_normalize().unwrap_or(Vec3::Y);
            MeshVertex::new(p.to_array(), n.to_array(), WHITE)
        })
        .collect();

    ChunkMesh {
        name,
        base_color: color,
        vertices,
        indices,
    }
}

/// Axis-aligned cube with flat per-face normals.
fn cube_mesh(name: String, center: Vec3, half: f32, color: [f32; 4]) -> ChunkMesh {
    // (normal, u, v) with u x v == normal, so (0, 1, 2) is counter-clockwise from outside
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in FACES {
        let base = vertices.len() as u32;
        let face_center = center + normal * half;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = face_center + (u * su + v * sv) * half;
            vertices.push(MeshVertex::new(p.to_array(), normal.to_array(), WHITE));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    ChunkMesh {
        name,
        base_color: color,
        vertices,
        indices,
    }
}

/// Saturated random color: any hue, saturation 0.7..1, value 0.6..1.
fn random_material_color(rng: &mut StdRng) -> [f32; 4] {
    let hue: f32 = rng.random();
    let saturation = 0.7 + rng.random::<f32>() * 0.3;
    let value = 0.6 + rng.random::<f32>() * 0.4;
    let [r, g, b] = hsv_to_rgb(hue, saturation, value);
    [r, g, b, 1.0]
}

/// `h`, `s`, `v` in [0, 1].
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    if s <= 0.0 {
        return [v, v, v];
    }
    let h6 = (h.fract() + 1.0).fract() * 6.0;
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u32 % 6 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_hsv_primaries() {
        assert!(close(hsv_to_rgb(0.0, 1.0, 1.0), [1.0, 0.0, 0.0]));
        assert!(close(hsv_to_rgb(1.0 / 3.0, 1.0, 1.0), [0.0, 1.0, 0.0]));
        assert!(close(hsv_to_rgb(2.0 / 3.0, 1.0, 1.0), [0.0, 0.0, 1.0]));
        assert!(close(hsv_to_rgb(0.5, 0.0, 0.4), [0.4, 0.4, 0.4]));
    }

    #[test]
    fn test_chunk_is_deterministic_per_coord() {
        let params = BakeParams::default();
        let a = generate_chunk(ChunkCoord::new(1, -2), &params);
        let b = generate_chunk(ChunkCoord::new(1, -2), &params);
        let c = generate_chunk(ChunkCoord::new(-2, 1), &params);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_terrain_layout() {
        let params = BakeParams::default();
        let scene = generate_chunk(ChunkCoord::ORIGIN, &params);
        let terrain = &scene.meshes[0];
        assert_eq!(terrain.vertices.len(), 100);
        assert_eq!(terrain.indices.len(), 9 * 9 * 6);

        for v in &terrain.vertices {
            let [x, y, z] = v.position;
            assert!(x.abs() <= 750.0 + 1e-3 && z.abs() <= 750.0 + 1e-3);
            if x.abs() >= params.inner_extent || z.abs() >= params.inner_extent {
                assert_eq!(y, 0.0, "edge vertex displaced at ({x}, {z})");
            } else {
                assert!((-5.0..20.0).contains(&y));
            }
        }
    }

    #[test]
    fn test_terrain_faces_up() {
        let scene = generate_chunk(ChunkCoord::ORIGIN, &BakeParams::default());
        let terrain = &scene.meshes[0];
        for tri in terrain.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| Vec3::from_array(terrain.vertices[i as usize].position));
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn test_cube_count_and_winding() {
        let params = BakeParams::default();
        let scene = generate_chunk(ChunkCoord::new(2, 2), &params);
        let cubes = &scene.meshes[1..];
        assert!(params.cube_count.contains(&(cubes.len() as u32)));

        for cube in cubes {
            assert_eq!(cube.vertices.len(), 24);
            assert_eq!(cube.indices.len(), 36);
            for tri in cube.indices.chunks_exact(3) {
                let v = cube.vertices[tri[0] as usize];
                let [a, b, c] = [tri[0], tri[1], tri[2]]
                    .map(|i| Vec3::from_array(cube.vertices[i as usize].position));
                let face = (b - a).cross(c - a);
                assert!(face.dot(Vec3::from_array(v.normal)) > 0.0);
            }
        }
    }

    #[test]
    fn test_material_colors_saturated() {
        let scene = generate_chunk(ChunkCoord::new(-1, 0), &BakeParams::default());
        for mesh in &scene.meshes {
            let [r, g, b, a] = mesh.base_color;
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            assert_eq!(a, 1.0);
            assert!(max >= 0.6 - 1e-5 && max <= 1.0 + 1e-5);
            assert!((max - min) / max >= 0.7 - 1e-4);
        }
    }

    #[test]
    fn test_scaled_params_stay_valid() {
        let params = BakeParams::for_chunk_size(300.0);
        assert!((params.cube_spread - 120.0).abs() < 1e-3);
        assert!((params.inner_extent - 130.0).abs() < 1e-3);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_params() {
        assert!(BakeParams::default().validate().is_ok());
        let params = BakeParams {
            cube_spread: 800.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
        let params = BakeParams {
            elevation: 3.0..3.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_infinite_chunk_size() {
        let params = BakeParams::for_chunk_size(f32::INFINITY);
        assert!(matches!(
            params.validate(),
            Err(BakeError::InvalidParams(_))
        ));
        assert!(BakeParams::for_chunk_size(f32::NAN).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_spread() {
        for spread in [0.0, -10.0, f32::NAN] {
            let params = BakeParams {
                cube_spread: spread,
                ..Default::default()
            };
            assert!(params.validate().is_err(), "spread {spread} accepted");
        }
    }

    #[test]
    fn test_validate_rejects_unbounded_ranges() {
        let params = BakeParams {
            cube_height: 2.0..f32::INFINITY,
            ..Default::default()
        };
        assert!(params.validate().is_err());
        let params = BakeParams {
            subdivisions: MAX_SUBDIVISIONS + 1,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
