use glam::Vec3;

pub const CHUNK_OUTLINE_COLOR: [f32; 4] = [0.3, 1.0, 0.3, 0.6];
pub const PLAYER_CELL_COLOR: [f32; 4] = [1.0, 1.0, 0.3, 0.8];
pub const PLAYER_MARKER_COLOR: [f32; 4] = [1.0, 0.3, 0.3, 1.0];

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DebugVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl DebugVertex {
    pub fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// 12 edges of an axis-aligned box as a line list (24 vertices).
pub fn box_wireframe(min: Vec3, max: Vec3, color: [f32; 4]) -> Vec<DebugVertex> {
    let corners: [[f32; 3]; 8] = [
        [min.x, min.y, min.z],
        [max.x, min.y, min.z],
        [max.x, max.y, min.z],
        [min.x, max.y, min.z],
        [min.x, min.y, max.z],
        [max.x, min.y, max.z],
        [max.x, max.y, max.z],
        [min.x, max.y, max.z],
    ];
    let edges: [(usize, usize); 12] = [
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 0),
        (4, 5),
        (5, 6),
        (6, 7),
        (7, 4),
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ];

    let mut verts = Vec::with_capacity(24);
    for (a, b) in edges {
        verts.push(DebugVertex::new(corners[a], color));
        verts.push(DebugVertex::new(corners[b], color));
    }
    verts
}

/// Flat square covering the streaming cell `[x0, x0 + size) × [z0, z0 + size)` at height `y`.
pub fn cell_outline(x0: f32, z0: f32, size: f32, y: f32, color: [f32; 4]) -> Vec<DebugVertex> {
    let c = [
        [x0, y, z0],
        [x0 + size, y, z0],
        [x0 + size, y, z0 + size],
        [x0, y, z0 + size],
    ];
    (0..4)
        .flat_map(|i| {
            [
                DebugVertex::new(c[i], color),
                DebugVertex::new(c[(i + 1) % 4], color),
            ]
        })
        .collect()
}

/// Vertical post at the player plus a heading line along `yaw`.
/// Yaw 0 faces -Z, matching the camera rig.
pub fn player_marker(position: Vec3, yaw: f32, height: f32) -> Vec<DebugVertex> {
    let top = position + Vec3::Y * height;
    let heading = Vec3::new(-yaw.sin(), 0.0, -yaw.cos()) * height;
    vec![
        DebugVertex::new(position.to_array(), PLAYER_MARKER_COLOR),
        DebugVertex::new(top.to_array(), PLAYER_MARKER_COLOR),
        DebugVertex::new(top.to_array(), PLAYER_MARKER_COLOR),
        DebugVertex::new((top + heading).to_array(), PLAYER_MARKER_COLOR),
    ]
}
