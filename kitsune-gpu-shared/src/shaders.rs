/// Embedded WGSL shader source strings for the stage renderer.
/// Both the native and the browser build compile these at pipeline creation.

pub const STAGE_WGSL: &str = include_str!("../shaders/stage.wgsl");
pub const SHADOW_DEPTH_WGSL: &str = include_str!("../shaders/shadow_depth.wgsl");
