use glam::Vec3;
use tessera_core::math::world_to_chunk;
use tessera_world::ChunkCounts;

use crate::camera::CameraMode;

/// JavaScript `Math.round`: halves round towards +infinity.
fn js_round(v: f32) -> i64 {
    (v + 0.5).floor() as i64
}

/// `"{x}, {z} (Chunk: {cx}, {cz})"`
pub fn format_position(position: Vec3, chunk_size: f32) -> String {
    let chunk = world_to_chunk(position, chunk_size);
    format!(
        "{}, {} (Chunk: {}, {})",
        js_round(position.x),
        js_round(position.z),
        chunk.x,
        chunk.z
    )
}

/// `"{loaded} loaded, {loading} loading"`
pub fn format_chunk_counts(counts: ChunkCounts) -> String {
    format!("{} loaded, {} loading", counts.loaded, counts.loading)
}

/// Text overlay backed by page elements. Each element is optional; writes
/// to a missing one are dropped.
pub struct Hud {
    position: Option<web_sys::Element>,
    chunks: Option<web_sys::Element>,
    camera_mode: Option<web_sys::Element>,
}

impl Hud {
    pub fn from_document(document: &web_sys::Document) -> Self {
        let hud = Self {
            position: document.get_element_by_id("position"),
            chunks: document.get_element_by_id("chunks"),
            camera_mode: document.get_element_by_id("camera-mode"),
        };
        if hud.position.is_none() || hud.chunks.is_none() || hud.camera_mode.is_none() {
            log::info!("Some HUD elements are missing from the page; their text is skipped");
        }
        hud
    }

    pub fn set_position(&self, position: Vec3, chunk_size: f32) {
        set_text(&self.position, &format_position(position, chunk_size));
    }

    pub fn set_chunk_counts(&self, counts: ChunkCounts) {
        set_text(&self.chunks, &format_chunk_counts(counts));
    }

    pub fn set_camera_mode(&self, mode: CameraMode) {
        set_text(&self.camera_mode, mode.label());
    }
}

fn set_text(element: &Option<web_sys::Element>, text: &str) {
    if let Some(el) = element {
        el.set_text_content(Some(text));
    }
}
