use glam::Vec3;

/// GPU light uniform (48 bytes). Must match LightUniforms in mesh.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniforms {
    pub direction: [f32; 4],
    pub color: [f32; 4],
    pub ambient: [f32; 4],
}

/// One ambient term plus one directional light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLight {
    pub ambient_hex: u32,
    pub ambient_intensity: f32,
    pub sun_hex: u32,
    pub sun_intensity: f32,
    /// Position the directional light shines from; only its direction matters.
    pub sun_position: Vec3,
}

impl Default for SceneLight {
    fn default() -> Self {
        Self {
            ambient_hex: 0x404040,
            ambient_intensity: 0.4,
            sun_hex: 0xffffff,
            sun_intensity: 0.8,
            sun_position: Vec3::new(1.0, 2.0, 3.0),
        }
    }
}

impl SceneLight {
    pub fn to_uniforms(&self) -> LightUniforms {
        let dir = self.sun_position.try_normalize().unwrap_or(Vec3::Y);
        let sun = hex_to_linear(self.sun_hex).map(|c| c * self.sun_intensity);
        let ambient = hex_to_linear(self.ambient_hex).map(|c| c * self.ambient_intensity);
        LightUniforms {
            direction: [dir.x, dir.y, dir.z, 0.0],
            color: [sun[0], sun[1], sun[2], 1.0],
            ambient: [ambient[0], ambient[1], ambient[2], 1.0],
        }
    }
}

/// `0xRRGGBB` sRGB color to linear RGB.
pub fn hex_to_linear(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}
