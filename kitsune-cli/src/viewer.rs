//! Native viewer window: winit event loop, wgpu surface, and a background
//! thread that loads the model while the empty stage is already drawing.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, TryRecvError};
use kitsune_runtime::{
    Direction, LoadedModel, ModelError, PointerButton, Session, StageConfig, StageRenderer,
};
use kitsune_wgpu::{wgpu, RenderError, WgpuBackend};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::WindowConfig;

/// Fully resolved settings for one viewer run.
#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub model: PathBuf,
    pub window: WindowConfig,
    pub stage: StageConfig,
}

/// Open the window and block until it is closed.
pub fn run(options: ViewerOptions) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let mut viewer = Viewer::new(options);
    event_loop.run_app(&mut viewer)?;
    match viewer.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct Viewer {
    options: ViewerOptions,
    session: Session,
    window: Option<Arc<Window>>,
    renderer: Option<StageRenderer>,
    loader: Option<Receiver<Result<LoadedModel, ModelError>>>,
    started: Instant,
    cursor: PhysicalPosition<f64>,
    failure: Option<anyhow::Error>,
}

impl Viewer {
    fn new(options: ViewerOptions) -> Self {
        let session = Session::new(
            options.stage.clone(),
            options.window.width,
            options.window.height,
            1.0,
        );
        Self {
            options,
            session,
            window: None,
            renderer: None,
            loader: None,
            started: Instant::now(),
            cursor: PhysicalPosition::new(0.0, 0.0),
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.options.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.options.window.width,
                self.options.window.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let size = window.inner_size();
        let scale = window.scale_factor();
        let logical = size.to_logical::<u32>(scale);
        self.session.resize(logical.width, logical.height, scale);

        let backend = pollster::block_on(WgpuBackend::new(
            window.clone(),
            size.width.max(1),
            size.height.max(1),
            self.options.stage.lighting.shadow_map_size,
        ))?;
        let info = backend.adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);
        self.renderer = Some(StageRenderer::new(backend, &self.options.stage)?);

        self.loader = Some(spawn_loader(self.options.model.clone()));
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.failure = Some(error);
        event_loop.exit();
    }

    /// Pick up the model once the loader thread is done.
    fn poll_loader(&mut self) -> anyhow::Result<()> {
        let Some(rx) = &self.loader else {
            return Ok(());
        };
        match rx.try_recv() {
            Ok(result) => {
                self.loader = None;
                // a bad model leaves the stage empty but running
                match result.and_then(|model| self.session.attach_actor(model)) {
                    Ok(()) => {}
                    Err(e) => log::error!("{}: {e}", self.options.model.display()),
                }
                Ok(())
            }
            Err(TryRecvError::Empty) => Ok(()),
            Err(TryRecvError::Disconnected) => {
                self.loader = None;
                anyhow::bail!("model loader thread exited without a result")
            }
        }
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        self.poll_loader()?;
        self.session.on_frame(self.started.elapsed().as_secs_f64());

        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };
        match renderer.render(&self.session) {
            Ok(()) => Ok(()),
            Err(RenderError::Frame(wgpu::SurfaceError::OutOfMemory)) => {
                anyhow::bail!("GPU out of memory")
            }
            Err(e) => {
                log::warn!("frame skipped: {e}");
                Ok(())
            }
        }
    }
}

fn spawn_loader(path: PathBuf) -> Receiver<Result<LoadedModel, ModelError>> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::spawn(move || {
        let started = Instant::now();
        let result = LoadedModel::load(&path);
        if result.is_ok() {
            log::info!("loaded {} in {:?}", path.display(), started.elapsed());
        }
        // receiver gone means the window already closed
        let _ = tx.send(result);
    });
    rx
}

/// Arrow keys by physical position.
pub fn direction_for(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::ArrowUp => Some(Direction::Forward),
        KeyCode::ArrowDown => Some(Direction::Backward),
        KeyCode::ArrowLeft => Some(Direction::Left),
        KeyCode::ArrowRight => Some(Direction::Right),
        _ => None,
    }
}

pub fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Browser-style `deltaY`: positive scrolls away from the content.
pub fn wheel_delta(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * 100.0,
        MouseScrollDelta::PixelDelta(p) => -p.y as f32,
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let logical = size.to_logical::<u32>(scale);
                self.session.resize(logical.width, logical.height, scale);
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width.max(1), size.height.max(1));
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape && state == ElementState::Pressed {
                    event_loop.exit();
                } else if let Some(direction) = direction_for(code) {
                    self.session.set_key(direction, state == ElementState::Pressed);
                }
            }
            WindowEvent::Focused(false) => self.session.focus_lost(),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = position;
                let p = position.to_logical::<f32>(scale);
                self.session.pointer_move(p.x, p.y);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = pointer_button(button) else {
                    return;
                };
                match state {
                    ElementState::Pressed => {
                        let p = self.cursor.to_logical::<f32>(scale);
                        self.session.pointer_down(button, p.x, p.y);
                    }
                    ElementState::Released => self.session.pointer_up(),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => self.session.wheel(wheel_delta(delta)),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_codes_map_to_directions() {
        assert_eq!(direction_for(KeyCode::ArrowUp), Some(Direction::Forward));
        assert_eq!(direction_for(KeyCode::ArrowDown), Some(Direction::Backward));
        assert_eq!(direction_for(KeyCode::ArrowLeft), Some(Direction::Left));
        assert_eq!(direction_for(KeyCode::ArrowRight), Some(Direction::Right));
        assert_eq!(direction_for(KeyCode::KeyW), None);
        assert_eq!(direction_for(KeyCode::Space), None);
    }

    #[test]
    fn test_mouse_buttons() {
        assert_eq!(pointer_button(MouseButton::Left), Some(PointerButton::Primary));
        assert_eq!(pointer_button(MouseButton::Right), Some(PointerButton::Secondary));
        assert_eq!(pointer_button(MouseButton::Back), None);
    }

    #[test]
    fn test_wheel_up_is_negative_delta() {
        assert!(wheel_delta(MouseScrollDelta::LineDelta(0.0, 1.0)) < 0.0);
        assert!(wheel_delta(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -30.0))) > 0.0);
    }

    #[test]
    fn test_loader_reports_missing_file() {
        let rx = spawn_loader(PathBuf::from("/nonexistent/Fox.glb"));
        let result = rx.recv().unwrap();
        assert!(matches!(result, Err(ModelError::Import(_))));
    }
}
