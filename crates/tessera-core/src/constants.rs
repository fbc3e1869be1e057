//! Single source of truth for shared constants.
//! `ViewerConfig` defaults are taken from here; the renderer and the baker
//! read the geometry constants directly.

/// Side length of a chunk in world units (x and z).
pub const CHUNK_SIZE: f32 = 1500.0;

/// Chebyshev radius (in chunks) of the square neighborhood kept loaded.
pub const VISIBLE_RADIUS: u32 = 2;

/// Largest accepted visible radius: a 129x129 neighborhood.
pub const MAX_VISIBLE_RADIUS: u32 = 64;

/// Half-extent of the baked chunk grid: assets exist for x, z in [-2, 2].
pub const AVAILABLE_RADIUS: i32 = 2;

/// Largest accepted availability half-extent.
pub const MAX_AVAILABLE_RADIUS: i32 = 1024;

/// Player walking speed in world units per second.
pub const PLAYER_SPEED: f32 = 200.0;

/// Mouse look sensitivity in radians per pixel of pointer movement.
pub const MOUSE_SENSITIVITY: f32 = 0.002;

/// Pitch clamp (60 degrees either side of the horizon).
pub const PITCH_LIMIT_RAD: f32 = std::f32::consts::FRAC_PI_3;

/// Eye height above the player origin in first-person mode.
pub const FIRST_PERSON_HEIGHT: f32 = 15.0;

/// Camera distance behind the player in third-person mode.
pub const THIRD_PERSON_DISTANCE: f32 = 15.0;

/// Camera height above the player in third-person mode.
pub const THIRD_PERSON_HEIGHT: f32 = 15.0;

/// Height above the player origin the third-person camera looks at.
pub const THIRD_PERSON_LOOK_HEIGHT: f32 = 8.0;

/// Per-frame lerp factor for third-person camera smoothing.
pub const CAMERA_SMOOTHING: f32 = 0.15;

/// Vertical field of view in degrees.
pub const FOV_Y_DEG: f32 = 75.0;

/// Near clip plane distance.
pub const NEAR_PLANE: f32 = 0.1;

/// Far clip plane distance. Covers the full loaded neighborhood diagonal.
pub const FAR_PLANE: f32 = 5000.0;

/// An in-flight chunk fetch older than this is treated as failed.
pub const FETCH_TIMEOUT_MS: f64 = 15_000.0;

/// Back-off before a failed chunk is requested again.
pub const RETRY_DELAY_MS: f64 = 3_000.0;

/// Directory (and URL sub-path) holding the chunk assets.
pub const CHUNK_ASSET_DIR: &str = "chunks";

/// File extension of chunk assets.
pub const CHUNK_ASSET_EXT: &str = "glb";

/// Default port of the static file server.
pub const SERVER_PORT: u16 = 3000;

/// Longest frame delta (ms) applied to movement; longer gaps are capped.
pub const MAX_FRAME_GAP_MS: f64 = 100.0;
