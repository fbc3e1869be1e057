use std::cell::RefCell;
use std::rc::Rc;

use crossbeam_channel::Receiver;
use glam::Vec3;
use tessera_assets::ChunkScene;
use tessera_core::constants::{FIRST_PERSON_HEIGHT, MAX_FRAME_GAP_MS};
use tessera_core::types::ChunkCoord;
use tessera_core::ViewerConfig;
use tessera_render::debug_lines::{
    box_wireframe, cell_outline, player_marker, CHUNK_OUTLINE_COLOR, PLAYER_CELL_COLOR,
};
use tessera_render::{GpuChunk, Renderer, SceneLight};
use tessera_world::{
    AvailabilitySet, ChunkBackend, ChunkCounts, ChunkManager, FetchTicket, StreamingPolicy,
};
use wasm_bindgen::prelude::*;

use crate::camera::{CameraMode, CameraRig};
use crate::fetch::{ChunkFetcher, FetchEvent};
use crate::gpu::GpuContext;
use crate::hud::Hud;
use crate::input::InputState;
use crate::player::Player;
use crate::ui::debug::DebugPanel;
use crate::ui::UiState;

type RafClosure = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Browser side effects of the chunk manager: fetches go to the fetcher,
/// payloads are uploaded to the GPU, count changes are remembered for the HUD.
struct ChunkLoader<'a> {
    device: &'a wgpu::Device,
    renderer: &'a Renderer,
    fetcher: &'a ChunkFetcher,
    changed: Option<ChunkCounts>,
}

impl ChunkBackend for ChunkLoader<'_> {
    type Payload = ChunkScene;
    type Handle = GpuChunk;

    fn request(&mut self, coord: ChunkCoord, ticket: FetchTicket) {
        self.fetcher.request(coord, ticket);
    }

    fn attach(&mut self, coord: ChunkCoord, scene: ChunkScene, offset: Vec3) -> GpuChunk {
        let chunk = self.renderer.upload_chunk(self.device, &scene, offset);
        log::info!(
            "Loaded chunk {} ({} meshes, {} triangles)",
            coord.id(),
            scene.meshes.len(),
            chunk.triangle_count()
        );
        chunk
    }

    fn release(&mut self, coord: ChunkCoord, handle: GpuChunk) {
        log::info!("Unloaded chunk {}", coord.id());
        handle.release();
    }

    fn chunks_changed(&mut self, counts: ChunkCounts) {
        self.changed = Some(counts);
    }
}

/// Owns every subsystem of the viewer. Lives in an `Rc<RefCell<_>>` shared
/// with the requestAnimationFrame closure.
pub struct Application {
    gpu: GpuContext,
    renderer: Renderer,
    ui_state: UiState,
    debug_panel: DebugPanel,
    canvas: web_sys::HtmlCanvasElement,
    input: Rc<RefCell<InputState>>,
    hud: Hud,
    config: ViewerConfig,
    player: Player,
    camera: CameraRig,
    manager: ChunkManager<GpuChunk>,
    fetcher: ChunkFetcher,
    completions: Receiver<FetchEvent>,
    last_frame_time: f64,
}

impl Application {
    pub fn new(
        gpu: GpuContext,
        dpi_scale: f32,
        canvas: web_sys::HtmlCanvasElement,
        input: Rc<RefCell<InputState>>,
        hud: Hud,
        config: ViewerConfig,
    ) -> Self {
        let (width, height) = gpu.size();
        let renderer = Renderer::new(
            &gpu.device,
            gpu.surface_format,
            width,
            height,
            &SceneLight::default(),
        );
        let ui_state = UiState::new(&gpu.device, gpu.surface_format, dpi_scale);
        let debug_panel = DebugPanel::new(gpu.adapter_name.clone(), gpu.backend.clone());

        let (sender, completions) = crossbeam_channel::unbounded();
        let fetcher = ChunkFetcher::new(config.asset_base_url.clone(), sender);
        let availability = AvailabilitySet::square(config.available_radius);
        log::info!(
            "{} chunk assets available, keeping radius {} loaded",
            availability.len(),
            config.visible_radius
        );
        let manager = ChunkManager::new(availability, StreamingPolicy::from(&config));

        let player = Player::default();
        let camera = CameraRig::new();
        hud.set_position(player.position, config.chunk_size);
        hud.set_chunk_counts(manager.counts());
        hud.set_camera_mode(camera.mode);

        Self {
            gpu,
            renderer,
            ui_state,
            debug_panel,
            canvas,
            input,
            hud,
            config,
            player,
            camera,
            manager,
            fetcher,
            completions,
            last_frame_time: 0.0,
        }
    }

    /// Start the requestAnimationFrame loop. The closure is created once.
    pub fn start_loop(app: Rc<RefCell<Self>>) {
        let closure: RafClosure = Rc::new(RefCell::new(None));
        let closure_clone = closure.clone();

        *closure.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
            {
                let mut app_ref = app.borrow_mut();
                let last = app_ref.last_frame_time;
                app_ref.last_frame_time = timestamp;

                let frame_ms = if last > 0.0 { timestamp - last } else { 0.0 };
                let move_ms = movement_delta_ms(last, timestamp);
                if frame_ms > MAX_FRAME_GAP_MS {
                    log::debug!("Capping movement after {:.0} ms gap", frame_ms);
                }
                app_ref.debug_panel.update(frame_ms);
                app_ref.update(timestamp, move_ms);
                app_ref.render_frame();
            }
            schedule_frame(&closure_clone);
        }) as Box<dyn FnMut(f64)>));

        schedule_frame(&closure);
    }

    /// Streaming, input and camera for one frame.
    fn update(&mut self, now_ms: f64, delta_ms: f64) {
        let frame = self.input.borrow_mut().take_frame();
        if frame.resized {
            self.handle_resize();
        }

        let Application {
            gpu,
            renderer,
            debug_panel,
            input,
            hud,
            config,
            player,
            camera,
            manager,
            fetcher,
            completions,
            ..
        } = self;

        let mut loader = ChunkLoader {
            device: &gpu.device,
            renderer: &*renderer,
            fetcher: &*fetcher,
            changed: None,
        };

        for event in completions.try_iter() {
            let outcome = manager.on_fetch_complete(
                event.coord,
                event.ticket,
                event.result,
                now_ms,
                &mut loader,
            );
            debug_panel.record_completion(outcome);
        }
        let expired = manager.expire_stalled(now_ms, &mut loader);
        debug_panel.record_timeouts(expired.len());

        player.look(
            frame.look_dx,
            frame.look_dy,
            config.mouse_sensitivity,
            config.pitch_limit_rad(),
        );
        if frame.toggle_camera {
            camera.toggle_mode();
            hud.set_camera_mode(camera.mode);
        }

        let moved = player.step(frame.keys, config.player_speed, (delta_ms / 1000.0) as f32);
        let chunk = player.chunk(config.chunk_size);
        // The first frame reconciles too: the manager has no focus yet.
        if manager.needs_reconcile(chunk) || manager.retry_due(now_ms) {
            manager.reconcile(chunk, config.visible_radius, now_ms, &mut loader);
        }

        if moved {
            hud.set_position(player.position, config.chunk_size);
        }
        if let Some(counts) = loader.changed {
            hud.set_chunk_counts(counts);
        }

        camera.update(player);
        let (width, height) = gpu.size();
        renderer.update_camera(&gpu.queue, camera.view_proj(width as f32, height as f32));

        if config.show_debug_panel {
            let mut lines = Vec::new();
            let mut triangles = 0;
            let mut gpu_bytes = 0;
            for (_, loaded) in manager.registry().handles() {
                if let Some(bounds) = loaded.world_bounds() {
                    lines.extend(box_wireframe(bounds.min, bounds.max, CHUNK_OUTLINE_COLOR));
                }
                triangles += loaded.triangle_count();
                gpu_bytes += loaded.gpu_bytes();
            }
            let cs = config.chunk_size;
            lines.extend(cell_outline(
                chunk.x as f32 * cs,
                chunk.z as f32 * cs,
                cs,
                0.5,
                PLAYER_CELL_COLOR,
            ));
            if camera.mode == CameraMode::ThirdPerson {
                lines.extend(player_marker(player.position, player.yaw, FIRST_PERSON_HEIGHT));
            }
            renderer.update_debug_lines(&gpu.queue, &lines);

            debug_panel.set_chunk_info(manager.counts(), triangles, gpu_bytes);
            debug_panel.set_player(player.position, chunk, camera.mode.label());
            debug_panel.set_pointer_locked(input.borrow().pointer_locked());
        }
    }

    /// Match the canvas backing store to its CSS size.
    fn handle_resize(&mut self) {
        let dpi_scale = web_sys::window()
            .map(|w| w.device_pixel_ratio() as f32)
            .unwrap_or_else(|| self.ui_state.ctx.pixels_per_point());
        let (width, height) = crate::physical_size(&self.canvas, dpi_scale);
        if width == 0 || height == 0 || (width, height) == self.gpu.size() {
            return;
        }
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.gpu.resize(width, height);
        self.renderer.resize(&self.gpu.device, width, height);
        self.ui_state.ctx.set_pixels_per_point(dpi_scale);
        log::info!("Resized to {}x{} (DPI: {:.2})", width, height, dpi_scale);
    }

    /// Render a single frame.
    fn render_frame(&mut self) {
        // Destructure self for disjoint field borrows.
        let Application {
            gpu,
            renderer,
            ui_state,
            debug_panel,
            config,
            manager,
            ..
        } = self;

        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.surface_config);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                return;
            }
            Err(e) => {
                log::error!("Surface error: {e:?}");
                return;
            }
        };

        let view = output.texture.create_view(&Default::default());

        // Run egui frame first (no encoder needed)
        let screen =
            ui_state.screen_descriptor(gpu.surface_config.width, gpu.surface_config.height);
        let raw_input = ui_state.raw_input(&screen);
        let full_output = ui_state.ctx.run(raw_input, |ctx| {
            if config.show_debug_panel {
                debug_panel.show(ctx);
            }
        });
        let clipped_primitives = ui_state
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        // 1. World: loaded chunks + debug lines
        renderer.render(
            &mut encoder,
            &view,
            manager.registry().handles().map(|(_, chunk)| chunk),
        );

        // 2. Upload egui textures and update buffers
        for (id, delta) in &full_output.textures_delta.set {
            ui_state
                .renderer
                .update_texture(&gpu.device, &gpu.queue, *id, delta);
        }
        ui_state.renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &clipped_primitives,
            &screen,
        );

        // 3. egui on top of the world pass
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui-pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            ui_state
                .renderer
                .render(&mut pass, &clipped_primitives, &screen);
        }

        for id in &full_output.textures_delta.free {
            ui_state.renderer.free_texture(id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

/// Milliseconds of movement to apply this frame: zero on the first frame,
/// capped at `MAX_FRAME_GAP_MS` after a long gap (backgrounded tab, slow
/// device) so the player never jumps. Streaming and rendering run regardless.
fn movement_delta_ms(last: f64, now: f64) -> f64 {
    if last <= 0.0 {
        return 0.0;
    }
    (now - last).clamp(0.0, MAX_FRAME_GAP_MS)
}

fn schedule_frame(closure: &RafClosure) {
    let Some(window) = web_sys::window() else {
        log::error!("No global window; render loop stopped");
        return;
    };
    if let Some(callback) = closure.borrow().as_ref() {
        if let Err(e) = window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            log::error!("requestAnimationFrame failed: {e:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_does_not_move() {
        assert_eq!(movement_delta_ms(0.0, 1234.0), 0.0);
    }

    #[test]
    fn test_regular_frame_moves() {
        assert_eq!(movement_delta_ms(1000.0, 1016.0), 16.0);
        assert_eq!(movement_delta_ms(1000.0, 1000.0 + MAX_FRAME_GAP_MS), MAX_FRAME_GAP_MS);
    }

    #[test]
    fn test_slow_frames_still_advance() {
        // A steady 120 ms cadence keeps producing capped movement every frame.
        let mut last = 0.0;
        let mut total = 0.0;
        for i in 1..=5 {
            let now = i as f64 * 120.0;
            total += movement_delta_ms(last, now);
            last = now;
        }
        assert_eq!(total, 4.0 * MAX_FRAME_GAP_MS);
    }

    #[test]
    fn test_long_gap_and_clock_skew_are_capped() {
        assert_eq!(movement_delta_ms(1000.0, 60_000.0), MAX_FRAME_GAP_MS);
        assert_eq!(movement_delta_ms(5000.0, 4990.0), 0.0);
    }
}
