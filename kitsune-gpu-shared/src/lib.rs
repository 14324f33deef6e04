//! Types and shader sources shared by the Kitsune renderer and runtime.
//!
//! Everything in here is plain data: `#[repr(C)]` uniform/vertex layouts that
//! must match the WGSL structs, the embedded shader strings, and the handful
//! of light and color conversions both sides agree on.

pub mod math;
pub mod shaders;
pub mod uniforms;
