//! Tunables for the stage. Every field has a default matching the stock fox
//! viewer, so an empty TOML table deserializes to the standard stage.

use serde::{Deserialize, Serialize};

/// How far the actor moves per frame while a key is held.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "speed", rename_all = "snake_case")]
pub enum MovementPolicy {
    /// Fixed distance per rendered frame, independent of frame time.
    PerFrame(f32),
    /// Distance per second, scaled by the frame delta.
    PerSecond(f32),
}

impl Default for MovementPolicy {
    fn default() -> Self {
        MovementPolicy::PerFrame(0.1)
    }
}

impl MovementPolicy {
    /// Distance to travel this frame.
    pub fn step(&self, dt: f32) -> f32 {
        match *self {
            MovementPolicy::PerFrame(distance) => distance,
            MovementPolicy::PerSecond(speed) => speed * dt.max(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Uniform scale applied to the model root.
    pub scale: f32,
    pub idle_clip: usize,
    pub walk_clip: usize,
    pub movement: MovementPolicy,
    /// Mixer playback speed multiplier.
    pub time_scale: f32,
    pub cast_shadow: bool,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            scale: 0.025,
            idle_clip: 0,
            walk_clip: 1,
            movement: MovementPolicy::default(),
            time_scale: 1.0,
            cast_shadow: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    /// Orbit pivot.
    pub target: [f32; 3],
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 70.0,
            near: 0.1,
            far: 100.0,
            position: [3.0, 3.0, 3.0],
            target: [0.0, 0.75, 0.0],
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// 0xRRGGBB, sRGB.
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub light_color: u32,
    pub light_intensity: f32,
    /// Directional light position. It always aims at the origin.
    pub light_position: [f32; 3],
    pub shadows: bool,
    pub shadow_map_size: u32,
    /// Half-width of the square orthographic shadow frustum.
    pub shadow_extent: f32,
    pub shadow_near: f32,
    pub shadow_far: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: 0xffffff,
            ambient_intensity: 2.4,
            light_color: 0xffffff,
            light_intensity: 1.8,
            light_position: [5.0, 5.0, 5.0],
            shadows: true,
            shadow_map_size: 1024,
            shadow_extent: 7.0,
            shadow_near: 0.5,
            shadow_far: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    pub width: f32,
    pub depth: f32,
    pub color: u32,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            width: 10.0,
            depth: 15.0,
            color: 0x444444,
            metalness: 0.0,
            roughness: 0.5,
        }
    }
}

/// Everything the session and the stage renderer need besides the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub actor: ActorConfig,
    pub camera: CameraConfig,
    pub lighting: LightingConfig,
    pub floor: FloorConfig,
    pub clear_color: u32,
    /// Clear held keys when the window loses focus.
    pub release_keys_on_blur: bool,
    /// Upper bound for the device pixel ratio.
    pub max_pixel_ratio: f64,
}

impl StageConfig {
    /// Parse a TOML document. Missing tables and keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            actor: ActorConfig::default(),
            camera: CameraConfig::default(),
            lighting: LightingConfig::default(),
            floor: FloorConfig::default(),
            clear_color: 0x000000,
            release_keys_on_blur: false,
            max_pixel_ratio: 2.0,
        }
    }
}
