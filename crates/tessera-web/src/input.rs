use std::cell::RefCell;
use std::rc::Rc;

use tessera_core::error::TesseraError;
use wasm_bindgen::prelude::*;

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Forward,
    Backward,
    Left,
    Right,
    ToggleCamera,
}

/// Map a `KeyboardEvent.key` value to an action, ignoring case.
pub fn key_action(key: &str) -> Option<KeyAction> {
    match key.to_ascii_lowercase().as_str() {
        "w" => Some(KeyAction::Forward),
        "s" => Some(KeyAction::Backward),
        "a" => Some(KeyAction::Left),
        "d" => Some(KeyAction::Right),
        "c" => Some(KeyAction::ToggleCamera),
        _ => None,
    }
}

/// Held state of the movement keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// Input consumed by one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub keys: MoveKeys,
    pub look_dx: f32,
    pub look_dy: f32,
    pub toggle_camera: bool,
    pub resized: bool,
}

/// Accumulated input state written by DOM listeners and read each frame.
#[derive(Debug, Default)]
pub struct InputState {
    keys: MoveKeys,
    pointer_locked: bool,
    mouse_dx: f32,
    mouse_dy: f32,
    toggle_camera: bool,
    resized: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a key transition. Auto-repeated presses do not toggle the camera again.
    pub fn key(&mut self, key: &str, pressed: bool, repeat: bool) {
        let Some(action) = key_action(key) else {
            return;
        };
        match action {
            KeyAction::Forward => self.keys.forward = pressed,
            KeyAction::Backward => self.keys.backward = pressed,
            KeyAction::Left => self.keys.left = pressed,
            KeyAction::Right => self.keys.right = pressed,
            KeyAction::ToggleCamera => {
                if pressed && !repeat {
                    self.toggle_camera = !self.toggle_camera;
                }
            }
        }
    }

    /// Mouse motion only steers the view while the pointer is locked.
    pub fn mouse_moved(&mut self, dx: f32, dy: f32) {
        if self.pointer_locked {
            self.mouse_dx += dx;
            self.mouse_dy += dy;
        }
    }

    pub fn set_pointer_locked(&mut self, locked: bool) {
        self.pointer_locked = locked;
    }

    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    pub fn mark_resized(&mut self) {
        self.resized = true;
    }

    /// Drain per-frame deltas. Held keys persist.
    pub fn take_frame(&mut self) -> FrameInput {
        let frame = FrameInput {
            keys: self.keys,
            look_dx: self.mouse_dx,
            look_dy: self.mouse_dy,
            toggle_camera: self.toggle_camera,
            resized: self.resized,
        };
        self.mouse_dx = 0.0;
        self.mouse_dy = 0.0;
        self.toggle_camera = false;
        self.resized = false;
        frame
    }
}

fn listen<E>(
    target: &web_sys::EventTarget,
    event: &str,
    handler: impl FnMut(E) + 'static,
) -> Result<(), TesseraError>
where
    E: wasm_bindgen::convert::FromWasmAbi + 'static,
{
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(|e| TesseraError::Browser(format!("add {event} listener: {e:?}")))?;
    // Listeners live as long as the page.
    closure.forget();
    Ok(())
}

/// Register keyboard, pointer-lock, mouse and resize listeners once at init.
pub fn register_input_listeners(
    window: &web_sys::Window,
    document: &web_sys::Document,
    canvas: &web_sys::HtmlCanvasElement,
    state: Rc<RefCell<InputState>>,
) -> Result<(), TesseraError> {
    let doc_target: &web_sys::EventTarget = document.as_ref();

    {
        let state = state.clone();
        listen(doc_target, "keydown", move |e: web_sys::KeyboardEvent| {
            state.borrow_mut().key(&e.key(), true, e.repeat());
        })?;
    }

    {
        let state = state.clone();
        listen(doc_target, "keyup", move |e: web_sys::KeyboardEvent| {
            state.borrow_mut().key(&e.key(), false, false);
        })?;
    }

    {
        let canvas_clone = canvas.clone();
        listen(canvas.as_ref(), "click", move |_: web_sys::MouseEvent| {
            canvas_clone.request_pointer_lock();
        })?;
    }

    {
        let state = state.clone();
        let document_clone = document.clone();
        let canvas_element: web_sys::Element = canvas.clone().into();
        listen(doc_target, "pointerlockchange", move |_: web_sys::Event| {
            let locked = document_clone.pointer_lock_element().as_ref() == Some(&canvas_element);
            state.borrow_mut().set_pointer_locked(locked);
        })?;
    }

    {
        let state = state.clone();
        listen(doc_target, "mousemove", move |e: web_sys::MouseEvent| {
            state
                .borrow_mut()
                .mouse_moved(e.movement_x() as f32, e.movement_y() as f32);
        })?;
    }

    listen(window.as_ref(), "resize", move |_: web_sys::Event| {
        state.borrow_mut().mark_resized();
    })
}
