use crate::types::ChunkCoord;
use glam::Vec3;

/// Convert a continuous world position to its containing chunk coordinate.
/// Uses floor division so negative positions map to negative chunks
/// (x = -0.5 lies in chunk -1, not 0).
pub fn world_to_chunk(position: Vec3, chunk_size: f32) -> ChunkCoord {
    ChunkCoord::new(
        (position.x / chunk_size).floor() as i32,
        (position.z / chunk_size).floor() as i32,
    )
}

/// Position of a world point relative to its chunk's local origin.
pub fn world_to_local(position: Vec3, chunk_size: f32) -> Vec3 {
    Vec3::new(
        position.x.rem_euclid(chunk_size),
        position.y,
        position.z.rem_euclid(chunk_size),
    )
}

/// Inverse of `world_to_local`.
pub fn chunk_local_to_world(chunk: ChunkCoord, local: Vec3, chunk_size: f32) -> Vec3 {
    chunk.world_offset(chunk_size) + local
}

/// Linear interpolation factor applied once per frame, clamped to [0, 1].
pub fn lerp_vec3(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    from.lerp(to, t.clamp(0.0, 1.0))
}
