use glam::Vec3;
use tessera_core::types::ChunkCoord;
use tessera_world::{ChunkCounts, CompletionOutcome};

const FRAME_WINDOW: usize = 60;

/// Streaming and frame statistics shown in the egui "Debug" window.
pub struct DebugPanel {
    adapter_name: String,
    backend: String,
    frame_times: [f64; FRAME_WINDOW],
    frame_index: usize,
    avg_frame_time_ms: f64,
    player_pos: Vec3,
    player_chunk: ChunkCoord,
    camera_mode: &'static str,
    pointer_locked: bool,
    counts: ChunkCounts,
    triangles: usize,
    gpu_bytes: u64,
    loaded_total: u64,
    failed_total: u64,
    discarded_total: u64,
    stale_total: u64,
}

impl DebugPanel {
    pub fn new(adapter_name: String, backend: String) -> Self {
        Self {
            adapter_name,
            backend,
            frame_times: [0.0; FRAME_WINDOW],
            frame_index: 0,
            avg_frame_time_ms: 0.0,
            player_pos: Vec3::ZERO,
            player_chunk: ChunkCoord::ORIGIN,
            camera_mode: "",
            pointer_locked: false,
            counts: ChunkCounts::default(),
            triangles: 0,
            gpu_bytes: 0,
            loaded_total: 0,
            failed_total: 0,
            discarded_total: 0,
            stale_total: 0,
        }
    }

    /// Record a frame's delta time and update the rolling average.
    pub fn update(&mut self, delta_ms: f64) {
        self.frame_times[self.frame_index] = delta_ms;
        self.frame_index = (self.frame_index + 1) % FRAME_WINDOW;
        let sum: f64 = self.frame_times.iter().sum();
        self.avg_frame_time_ms = sum / FRAME_WINDOW as f64;
    }

    pub fn set_player(&mut self, pos: Vec3, chunk: ChunkCoord, camera_mode: &'static str) {
        self.player_pos = pos;
        self.player_chunk = chunk;
        self.camera_mode = camera_mode;
    }

    pub fn set_pointer_locked(&mut self, locked: bool) {
        self.pointer_locked = locked;
    }

    pub fn set_chunk_info(&mut self, counts: ChunkCounts, triangles: usize, gpu_bytes: u64) {
        self.counts = counts;
        self.triangles = triangles;
        self.gpu_bytes = gpu_bytes;
    }

    pub fn record_completion(&mut self, outcome: CompletionOutcome) {
        match outcome {
            CompletionOutcome::Loaded => self.loaded_total += 1,
            CompletionOutcome::Failed => self.failed_total += 1,
            CompletionOutcome::Discarded => self.discarded_total += 1,
            CompletionOutcome::Stale => self.stale_total += 1,
        }
    }

    pub fn record_timeouts(&mut self, count: usize) {
        self.failed_total += count as u64;
    }

    pub fn fps(&self) -> f64 {
        if self.avg_frame_time_ms > 0.0 {
            1000.0 / self.avg_frame_time_ms
        } else {
            0.0
        }
    }

    pub fn show(&self, ctx: &egui::Context) {
        egui::Window::new("Debug")
            .default_open(true)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(&self.adapter_name);
                ui.label(&self.backend);
                ui.separator();
                ui.label(format!("{:.2} ms", self.avg_frame_time_ms));
                ui.label(format!("{:.0} FPS", self.fps()));
                ui.separator();
                ui.label(format!(
                    "Player: ({:.1}, {:.1}, {:.1})",
                    self.player_pos.x, self.player_pos.y, self.player_pos.z
                ));
                ui.label(format!("Chunk: {}", self.player_chunk));
                ui.label(format!("Camera: {}", self.camera_mode));
                if !self.pointer_locked {
                    ui.label("Click the view to look around");
                }
                ui.separator();
                ui.label(format!(
                    "Chunks: {} loaded | {} loading",
                    self.counts.loaded, self.counts.loading
                ));
                ui.label(format!(
                    "Triangles: {} | GPU: {:.1} MiB",
                    self.triangles,
                    self.gpu_bytes as f64 / (1024.0 * 1024.0)
                ));
                ui.label(format!(
                    "Fetches: {} ok | {} failed | {} dropped | {} stale",
                    self.loaded_total, self.failed_total, self.discarded_total, self.stale_total
                ));
            });
    }
}
