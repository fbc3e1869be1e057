use glam::{Quat, Vec3};
use tessera_core::math::world_to_chunk;
use tessera_core::types::ChunkCoord;

use crate::input::MoveKeys;

/// The walking viewpoint. Yaw 0 faces -Z; positive pitch looks up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl Player {
    /// Apply pointer motion. Moving the mouse right turns right, moving it down looks down.
    pub fn look(&mut self, dx: f32, dy: f32, sensitivity: f32, pitch_limit: f32) {
        self.yaw -= dx * sensitivity;
        self.pitch = (self.pitch - dy * sensitivity).clamp(-pitch_limit, pitch_limit);
    }

    /// Walk on the ground plane for `delta_s` seconds. Returns whether the player moved.
    pub fn step(&mut self, keys: MoveKeys, speed: f32, delta_s: f32) -> bool {
        let dir = move_direction(keys, self.yaw);
        if dir == Vec3::ZERO {
            return false;
        }
        self.position += dir * speed * delta_s;
        true
    }

    pub fn chunk(&self, chunk_size: f32) -> ChunkCoord {
        world_to_chunk(self.position, chunk_size)
    }
}

/// Unit walking direction for the held keys, rotated by `yaw` about +Y.
/// Zero when no key is held or opposing keys cancel out.
pub fn move_direction(keys: MoveKeys, yaw: f32) -> Vec3 {
    let mut dir = Vec3::ZERO;
    if keys.forward {
        dir.z -= 1.0;
    }
    if keys.backward {
        dir.z += 1.0;
    }
    if keys.left {
        dir.x -= 1.0;
    }
    if keys.right {
        dir.x += 1.0;
    }
    if dir.length_squared() == 0.0 {
        return Vec3::ZERO;
    }
    Quat::from_rotation_y(yaw) * dir.normalize()
}
