use glam::{Mat4, Quat, Vec3};
use tessera_core::constants::{
    CAMERA_SMOOTHING, FAR_PLANE, FIRST_PERSON_HEIGHT, FOV_Y_DEG, NEAR_PLANE,
    THIRD_PERSON_DISTANCE, THIRD_PERSON_HEIGHT, THIRD_PERSON_LOOK_HEIGHT,
};
use tessera_core::math::lerp_vec3;

use crate::player::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    FirstPerson,
    ThirdPerson,
}

impl CameraMode {
    pub fn toggled(self) -> Self {
        match self {
            CameraMode::FirstPerson => CameraMode::ThirdPerson,
            CameraMode::ThirdPerson => CameraMode::FirstPerson,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CameraMode::FirstPerson => "First Person",
            CameraMode::ThirdPerson => "Third Person",
        }
    }
}

/// Camera that follows the player in either first- or third-person mode.
pub struct CameraRig {
    pub mode: CameraMode,
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_y_rad: f32,
}

impl CameraRig {
    pub fn new() -> Self {
        Self {
            mode: CameraMode::ThirdPerson,
            eye: Vec3::new(0.0, 5.0, 10.0),
            target: Vec3::ZERO,
            fov_y_rad: FOV_Y_DEG.to_radians(),
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    /// Advance one frame. Third-person eye movement is smoothed per frame.
    pub fn update(&mut self, player: &Player) {
        match self.mode {
            CameraMode::FirstPerson => {
                self.eye = player.position + Vec3::Y * FIRST_PERSON_HEIGHT;
                self.target = self.eye + look_direction(player.yaw, player.pitch);
            }
            CameraMode::ThirdPerson => {
                let desired = player.position + third_person_offset(player.yaw, player.pitch);
                self.eye = lerp_vec3(self.eye, desired, CAMERA_SMOOTHING);
                self.target = player.position + Vec3::Y * THIRD_PERSON_LOOK_HEIGHT;
            }
        }
    }

    pub fn view_proj(&self, width: f32, height: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, Vec3::Y);
        let aspect = width / height.max(1.0);
        let proj = Mat4::perspective_rh(self.fov_y_rad, aspect, NEAR_PLANE, FAR_PLANE);
        proj * view
    }
}

/// Unit view direction: -Z pitched about X, then turned about Y.
pub fn look_direction(yaw: f32, pitch: f32) -> Vec3 {
    Quat::from_rotation_y(yaw) * (Quat::from_rotation_x(pitch) * Vec3::NEG_Z)
}

/// Third-person offset from the player: behind and above, tilting with half the pitch.
pub fn third_person_offset(yaw: f32, pitch: f32) -> Vec3 {
    let base = Vec3::new(0.0, THIRD_PERSON_HEIGHT, THIRD_PERSON_DISTANCE);
    Quat::from_rotation_y(yaw) * (Quat::from_rotation_x(pitch * 0.5) * base)
}
