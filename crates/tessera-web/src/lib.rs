mod app;
mod camera;
mod fetch;
mod gpu;
mod hud;
mod input;
mod player;
pub mod ui;

use std::cell::RefCell;
use std::rc::Rc;

use tessera_core::error::TesseraError;
use tessera_core::ViewerConfig;
use wasm_bindgen::prelude::*;

const CANVAS_ID: &str = "tessera-canvas";

/// WASM entry point. Sets the panic hook and initializes logging.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("logger init failed: {e}").into());
    }
    log::info!("Tessera starting...");

    wasm_bindgen_futures::spawn_local(async {
        if let Err(e) = run().await {
            show_error_to_user(&format!("{e}"));
        }
    });
}

/// Embedded `config/viewer.ron`, falling back to defaults if it does not parse.
fn load_config() -> ViewerConfig {
    match ViewerConfig::from_ron_str(include_str!("../../../config/viewer.ron")) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{e}; using default viewer config");
            ViewerConfig::default()
        }
    }
}

/// Canvas CSS size scaled to physical pixels.
pub(crate) fn physical_size(canvas: &web_sys::HtmlCanvasElement, dpi_scale: f32) -> (u32, u32) {
    let width = (canvas.client_width() as f32 * dpi_scale) as u32;
    let height = (canvas.client_height() as f32 * dpi_scale) as u32;
    (width, height)
}

#[cfg(target_arch = "wasm32")]
async fn run() -> Result<(), TesseraError> {
    let window =
        web_sys::window().ok_or_else(|| TesseraError::Browser("no global window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| TesseraError::Browser("no document".into()))?;

    let canvas = document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| TesseraError::MissingElement(format!("#{CANVAS_ID}")))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| TesseraError::MissingElement(format!("#{CANVAS_ID} is not a canvas")))?;

    let config = load_config();

    let dpi_scale = window.device_pixel_ratio() as f32;
    let (width, height) = physical_size(&canvas, dpi_scale);
    canvas.set_width(width);
    canvas.set_height(height);
    log::info!(
        "Canvas: {}x{} physical (DPI: {:.2})",
        width,
        height,
        dpi_scale
    );

    // Listeners are registered once and feed the shared input state.
    let input_state = Rc::new(RefCell::new(input::InputState::new()));
    input::register_input_listeners(&window, &document, &canvas, input_state.clone())?;

    let hud = hud::Hud::from_document(&document);
    let gpu_ctx = gpu::init_gpu(canvas.clone(), width, height).await?;
    let application =
        app::Application::new(gpu_ctx, dpi_scale, canvas, input_state, hud, config);
    app::Application::start_loop(Rc::new(RefCell::new(application)));

    Ok(())
}

/// Fatal errors go to an alert as well as the console.
fn show_error_to_user(msg: &str) {
    log::error!("{msg}");
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(&format!("Tessera error: {msg}"));
    }
}
