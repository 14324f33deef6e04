use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use kitsune_wgpu::{wgpu, WgpuBackend};

use crate::camera::PointerButton;
use crate::config::StageConfig;
use crate::render::StageRenderer;
use crate::scene::LoadedModel;
use crate::session::Session;

fn js_err(context: &str, e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{context}: {e}"))
}

/// Browser host. JavaScript forwards DOM events and drives `frame` from
/// requestAnimationFrame.
#[wasm_bindgen]
pub struct App {
    session: Session,
    renderer: StageRenderer,
    canvas: HtmlCanvasElement,
}

impl App {
    pub(crate) async fn new(canvas_id: &str, config: StageConfig) -> Result<App, JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("Canvas not found")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| "Element is not a canvas")?;

        let width = canvas.client_width().max(1) as u32;
        let height = canvas.client_height().max(1) as u32;
        let session = Session::new(config, width, height, window.device_pixel_ratio());
        let (buffer_width, buffer_height) = session.viewport().buffer_size();
        canvas.set_width(buffer_width);
        canvas.set_height(buffer_height);

        let backend = WgpuBackend::new(
            wgpu::SurfaceTarget::Canvas(canvas.clone()),
            buffer_width,
            buffer_height,
            session.config().lighting.shadow_map_size,
        )
        .await
        .map_err(|e| js_err("Failed to init renderer", e))?;
        let renderer = StageRenderer::new(backend, session.config())
            .map_err(|e| js_err("Failed to build stage", e))?;

        log::info!("stage ready at {buffer_width}x{buffer_height}");
        Ok(App {
            session,
            renderer,
            canvas,
        })
    }
}

#[wasm_bindgen]
impl App {
    /// Hand over the fetched `.glb` / embedded `.gltf` bytes. Frames before
    /// this call render the empty stage.
    pub fn load_model(&mut self, data: &[u8]) -> Result<(), JsValue> {
        let model = LoadedModel::from_slice(data).map_err(|e| js_err("Failed to load model", e))?;
        self.session
            .attach_actor(model)
            .map_err(|e| js_err("Unusable model", e))
    }

    /// `KeyboardEvent.key` of a keydown.
    pub fn key_down(&mut self, key: &str) {
        self.session.key_down(key);
    }

    pub fn key_up(&mut self, key: &str) {
        self.session.key_up(key);
    }

    pub fn blur(&mut self) {
        self.session.focus_lost();
    }

    /// `PointerEvent.button`: 0 rotates, 2 pans.
    pub fn pointer_down(&mut self, button: i16, x: f32, y: f32) {
        let button = match button {
            0 => PointerButton::Primary,
            2 => PointerButton::Secondary,
            _ => PointerButton::Middle,
        };
        self.session.pointer_down(button, x, y);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.session.pointer_move(x, y);
    }

    pub fn pointer_up(&mut self) {
        self.session.pointer_up();
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.session.wheel(delta_y);
    }

    /// CSS size of the canvas and the current `devicePixelRatio`.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) {
        self.session.resize(width, height, device_pixel_ratio);
        let (w, h) = self.session.viewport().buffer_size();
        self.canvas.set_width(w);
        self.canvas.set_height(h);
        self.renderer.resize(w, h);
    }

    /// One frame. `time` is the requestAnimationFrame timestamp in ms.
    pub fn frame(&mut self, time: f64) {
        self.session.on_frame(time / 1000.0);
        if let Err(e) = self.renderer.render(&self.session) {
            log::error!("render failed: {e}");
        }
    }

    /// "idle", "walk", or "loading" before the model arrives.
    pub fn gait(&self) -> String {
        self.session
            .gait()
            .map_or("loading", |g| g.as_str())
            .to_string()
    }

    pub fn actor_position(&self) -> Vec<f32> {
        self.session
            .actor()
            .map(|a| a.transform.position.to_array().to_vec())
            .unwrap_or_default()
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }
}
