//! Per-page (or per-window) state: held keys, the actor once it has loaded,
//! the frame clock, and the orbit camera.
//!
//! Hosts call [`Session::key_down`]/[`Session::key_up`] from their input
//! handlers and [`Session::on_frame`] once per display refresh. Gait changes
//! happen inside the key handlers; position changes happen per frame.

use crate::actor::Actor;
use crate::camera::{OrbitControls, PerspectiveCamera, PointerButton, Viewport};
use crate::clock::FrameClock;
use crate::config::StageConfig;
use crate::error::ModelError;
use crate::gait::Gait;
use crate::input::{Direction, InputState};
use crate::motion::apply_movement;
use crate::scene::LoadedModel;

pub struct Session {
    config: StageConfig,
    input: InputState,
    actor: Option<Actor>,
    /// Bumped every time an actor is attached.
    actor_generation: u64,
    clock: FrameClock,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    viewport: Viewport,
}

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Seconds since the previous frame.
    pub delta: f32,
    pub moved: bool,
    pub camera_moved: bool,
}

impl Session {
    pub fn new(config: StageConfig, width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        let viewport = Viewport::new(width, height, device_pixel_ratio, config.max_pixel_ratio);
        let camera = PerspectiveCamera::from_config(&config.camera, viewport.aspect());
        let controls = OrbitControls::from_config(&config.camera);
        Self {
            config,
            input: InputState::new(),
            actor: None,
            actor_generation: 0,
            clock: FrameClock::new(),
            camera,
            controls,
            viewport,
        }
    }

    /// Install the loaded model as the actor. Replaces any previous actor.
    pub fn attach_actor(&mut self, model: LoadedModel) -> Result<(), ModelError> {
        let actor = Actor::new(model, &self.config.actor, &self.input)?;
        log::info!("actor ready, gait {}", actor.gait().as_str());
        self.actor = Some(actor);
        self.actor_generation += 1;
        Ok(())
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    /// Changes whenever [`Session::attach_actor`] installs a new actor, so a
    /// renderer can tell a replaced actor from the one it already uploaded.
    pub fn actor_generation(&self) -> u64 {
        self.actor_generation
    }

    pub fn gait(&self) -> Option<Gait> {
        self.actor.as_ref().map(Actor::gait)
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// DOM-style key press. Keys other than the four arrows are ignored.
    pub fn key_down(&mut self, key: &str) {
        if let Some(direction) = Direction::from_key(key) {
            self.set_key(direction, true);
        }
    }

    pub fn key_up(&mut self, key: &str) {
        if let Some(direction) = Direction::from_key(key) {
            self.set_key(direction, false);
        }
    }

    /// Record a key and re-evaluate the gait right away. Repeats are harmless.
    pub fn set_key(&mut self, direction: Direction, pressed: bool) {
        if self.input.set_key(direction, pressed) {
            log::trace!("{direction:?} {}", if pressed { "down" } else { "up" });
        }
        self.on_input_changed();
    }

    /// Bring the gait in line with the held keys. No-op until the actor exists.
    pub fn on_input_changed(&mut self) -> Option<Gait> {
        let input = self.input;
        self.actor.as_mut()?.sync_gait(&input)
    }

    /// Window or tab lost focus. Held keys are only released when configured,
    /// otherwise a key released while unfocused stays held.
    pub fn focus_lost(&mut self) {
        if self.config.release_keys_on_blur && self.input.release_all() {
            log::debug!("focus lost, released held keys");
            self.on_input_changed();
        }
    }

    /// Advance one frame to `elapsed` seconds since start.
    pub fn on_frame(&mut self, elapsed: f64) -> FrameStats {
        let delta = self.clock.tick(elapsed);

        let mut moved = false;
        if let Some(actor) = self.actor.as_mut() {
            if self.input.any_held() {
                let step = self.config.actor.movement.step(delta);
                apply_movement(&self.input, step, &mut actor.transform);
                moved = true;
            }
            actor.advance(delta);
        }

        let camera_moved = self.controls.update(&mut self.camera);
        FrameStats {
            delta,
            moved,
            camera_moved,
        }
    }

    /// Window or canvas resized, in logical pixels.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) {
        self.viewport = Viewport::new(width, height, device_pixel_ratio, self.config.max_pixel_ratio);
        self.camera.aspect = self.viewport.aspect();
    }

    pub fn pointer_down(&mut self, button: PointerButton, x: f32, y: f32) {
        self.controls.pointer_down(button, x, y);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let height = self.viewport.height as f32;
        self.controls.pointer_move(&self.camera, x, y, height);
    }

    pub fn pointer_up(&mut self) {
        self.controls.pointer_up();
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.controls.wheel(delta_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MovementPolicy;
    use crate::scene::test_models;
    use glam::Vec3;
    use std::f32::consts::{FRAC_PI_2, PI};

    const IDLE: usize = 0;
    const WALK: usize = 1;

    fn session() -> Session {
        Session::new(StageConfig::default(), 800, 600, 1.0)
    }

    fn loaded() -> Session {
        let mut s = session();
        s.attach_actor(test_models::two_clip_rig()).unwrap();
        s
    }

    fn position(s: &Session) -> Vec3 {
        s.actor().unwrap().transform.position
    }

    fn yaw(s: &Session) -> f32 {
        s.actor().unwrap().transform.yaw
    }

    fn approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    // ── before the model loads ──

    #[test]
    fn test_frames_and_keys_before_load_are_harmless() {
        let mut s = session();
        s.key_down("ArrowUp");
        let stats = s.on_frame(0.0);
        assert_eq!(stats.delta, 0.0);
        assert!(!stats.moved);
        s.on_frame(0.016);
        assert_eq!(s.gait(), None);
        assert!(s.input().forward);
        assert_eq!(s.on_input_changed(), None);
    }

    #[test]
    fn test_attach_with_key_already_held_walks() {
        let mut s = session();
        s.key_down("ArrowLeft");
        s.attach_actor(test_models::two_clip_rig()).unwrap();
        assert_eq!(s.gait(), Some(Gait::Walk));
        assert!(s.actor().unwrap().mixer().is_playing(WALK));
        assert!(!s.actor().unwrap().mixer().is_playing(IDLE));
    }

    #[test]
    fn test_attach_rejects_single_clip_model() {
        let mut s = session();
        let mut model = test_models::two_clip_rig();
        model.clips.truncate(1);
        assert!(s.attach_actor(model).is_err());
        assert!(s.actor().is_none());
        assert_eq!(s.actor_generation(), 0);
    }

    #[test]
    fn test_replacing_actor_bumps_generation() {
        let mut s = loaded();
        let first = s.actor_generation();
        s.attach_actor(test_models::two_clip_rig()).unwrap();
        assert_ne!(s.actor_generation(), first);

        let mut bad = test_models::two_clip_rig();
        bad.clips.truncate(1);
        let current = s.actor_generation();
        assert!(s.attach_actor(bad).is_err());
        assert_eq!(s.actor_generation(), current);
    }

    // ── gait ──

    #[test]
    fn test_initial_gait_idle() {
        let s = loaded();
        assert_eq!(s.gait(), Some(Gait::Idle));
        assert!(s.actor().unwrap().mixer().is_playing(IDLE));
    }

    #[test]
    fn test_gait_switches_on_key_event_not_frame() {
        let mut s = loaded();
        s.key_down("ArrowUp");
        // no frame yet
        assert_eq!(s.gait(), Some(Gait::Walk));
        assert!(s.actor().unwrap().mixer().is_playing(WALK));
        assert!(!s.actor().unwrap().mixer().is_playing(IDLE));

        s.key_up("ArrowUp");
        assert_eq!(s.gait(), Some(Gait::Idle));
    }

    #[test]
    fn test_walk_clip_not_restarted_by_second_key() {
        let mut s = loaded();
        s.on_frame(0.0);
        s.key_down("ArrowUp");
        s.on_frame(0.25);
        s.key_down("ArrowRight");
        s.key_down("ArrowRight");
        let t = s.actor().unwrap().mixer().action(WALK).unwrap().time;
        assert!((t - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_walk_while_any_key_held() {
        let mut s = loaded();
        s.key_down("ArrowUp");
        s.key_down("ArrowLeft");
        s.key_up("ArrowUp");
        assert_eq!(s.gait(), Some(Gait::Walk));
        s.key_up("ArrowLeft");
        assert_eq!(s.gait(), Some(Gait::Idle));
    }

    #[test]
    fn test_release_in_any_order_returns_to_idle() {
        let mut s = loaded();
        for key in ["ArrowDown", "ArrowUp", "ArrowRight", "ArrowLeft"] {
            s.key_down(key);
        }
        for key in ["ArrowRight", "ArrowDown", "ArrowLeft", "ArrowUp"] {
            assert_eq!(s.gait(), Some(Gait::Walk));
            s.key_up(key);
        }
        assert_eq!(s.gait(), Some(Gait::Idle));
        assert!(!s.input().any_held());
    }

    #[test]
    fn test_other_keys_ignored() {
        let mut s = loaded();
        s.key_down("w");
        s.key_down(" ");
        assert_eq!(*s.input(), InputState::new());
        assert_eq!(s.gait(), Some(Gait::Idle));
    }

    // ── movement ──

    #[test]
    fn test_forward_one_frame() {
        let mut s = loaded();
        s.key_down("ArrowUp");
        s.on_frame(0.0);
        assert!(approx_eq(position(&s), Vec3::new(0.0, 0.0, -0.1)));
        assert_eq!(yaw(&s), PI);
    }

    #[test]
    fn test_diagonal_frame() {
        let mut s = loaded();
        s.key_down("ArrowRight");
        s.key_down("ArrowUp");
        s.on_frame(0.0);
        assert!(approx_eq(position(&s), Vec3::new(0.1, 0.0, -0.1)));
        assert_eq!(yaw(&s), -FRAC_PI_2);
    }

    #[test]
    fn test_forward_left_faces_left() {
        let mut s = loaded();
        s.key_down("ArrowUp");
        s.key_down("ArrowLeft");
        s.on_frame(0.0);
        assert!(approx_eq(position(&s), Vec3::new(-0.1, 0.0, -0.1)));
        assert_eq!(yaw(&s), FRAC_PI_2);
    }

    #[test]
    fn test_per_frame_distance_ignores_frame_time() {
        let mut s = loaded();
        s.key_down("ArrowDown");
        for t in [0.0, 0.5, 0.51, 3.0] {
            s.on_frame(t);
        }
        assert!(approx_eq(position(&s), Vec3::new(0.0, 0.0, 0.4)));
        assert_eq!(yaw(&s), 0.0);
    }

    #[test]
    fn test_per_second_policy_uses_delta() {
        let mut config = StageConfig::default();
        config.actor.movement = MovementPolicy::PerSecond(2.0);
        let mut s = Session::new(config, 800, 600, 1.0);
        s.attach_actor(test_models::two_clip_rig()).unwrap();
        s.key_down("ArrowLeft");
        s.on_frame(1.0);
        s.on_frame(1.5);
        assert!(approx_eq(position(&s), Vec3::new(-1.0, 0.0, 0.0)));
        assert_eq!(yaw(&s), FRAC_PI_2);
    }

    #[test]
    fn test_release_stops_motion_keeps_facing() {
        let mut s = loaded();
        s.key_down("ArrowLeft");
        s.on_frame(0.0);
        s.key_up("ArrowLeft");
        let stats = s.on_frame(0.016);
        assert!(!stats.moved);
        assert!(approx_eq(position(&s), Vec3::new(-0.1, 0.0, 0.0)));
        assert_eq!(yaw(&s), FRAC_PI_2);
    }

    #[test]
    fn test_frame_advances_mixer_by_delta() {
        let mut s = loaded();
        s.on_frame(10.0);
        s.on_frame(10.4);
        let t = s.actor().unwrap().mixer().action(IDLE).unwrap().time;
        assert!((t - 0.4).abs() < 1e-5);
    }

    // ── focus ──

    #[test]
    fn test_focus_lost_keeps_keys_by_default() {
        let mut s = loaded();
        s.key_down("ArrowUp");
        s.focus_lost();
        assert!(s.input().forward);
        assert_eq!(s.gait(), Some(Gait::Walk));
    }

    #[test]
    fn test_focus_lost_releases_when_configured() {
        let config = StageConfig {
            release_keys_on_blur: true,
            ..StageConfig::default()
        };
        let mut s = Session::new(config, 800, 600, 1.0);
        s.attach_actor(test_models::two_clip_rig()).unwrap();
        s.key_down("ArrowUp");
        s.focus_lost();
        assert!(!s.input().any_held());
        assert_eq!(s.gait(), Some(Gait::Idle));
    }

    // ── viewport ──

    #[test]
    fn test_resize_updates_aspect_and_ratio() {
        let mut s = session();
        s.resize(1000, 500, 3.0);
        assert_eq!(s.camera().aspect, 2.0);
        assert_eq!(s.viewport().pixel_ratio(), 2.0);
        assert_eq!(s.viewport().buffer_size(), (2000, 1000));
    }

    #[test]
    fn test_wheel_moves_camera_on_next_frame() {
        let mut s = session();
        let before = s.camera().position;
        s.wheel(-1.0);
        let stats = s.on_frame(0.0);
        assert!(stats.camera_moved);
        assert!(s.camera().position.length() < before.length());
    }
}
