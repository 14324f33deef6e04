//! Kitsune runtime
//!
//! Arrow-key driven character on a lit stage: glTF loading, clip mixing,
//! the idle/walk gait machine, per-frame movement, orbit camera, and the
//! glue that hands it all to the wgpu backend. Native hosts drive a
//! [`Session`] directly; in the browser the exported `App` does.

#[cfg(target_arch = "wasm32")]
mod app;
pub mod actor;
pub mod animation;
pub mod camera;
pub mod clock;
pub mod config;
pub mod error;
pub mod gait;
pub mod input;
pub mod motion;
pub mod render;
pub mod scene;
pub mod session;
pub mod skinning;
pub mod stage;
pub mod transform;

pub use actor::Actor;
pub use camera::{PointerButton, Viewport};
pub use config::{MovementPolicy, StageConfig};
pub use error::ModelError;
pub use gait::Gait;
pub use input::{Direction, InputState};
pub use render::StageRenderer;
pub use scene::LoadedModel;
pub use session::{FrameStats, Session};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Entry point, called when the WASM module loads.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
    log::info!("kitsune runtime initialized");
}

/// Create the stage on `canvas_id`. `config_toml` overrides stage defaults.
///
/// The model is fetched separately and passed to `App::load_model`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn create_app(canvas_id: String, config_toml: Option<String>) -> Result<app::App, JsValue> {
    let config = match config_toml {
        Some(text) => StageConfig::from_toml_str(&text)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {e}")))?,
        None => StageConfig::default(),
    };
    app::App::new(&canvas_id, config).await
}
