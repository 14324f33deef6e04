//! Kitsune wgpu backend.
//!
//! A small forward renderer for the stage: one shadow-casting directional
//! light, an ambient term, and skinned meshes with a per-object joint palette.
//! Hosts hand it a window (native) or a canvas (browser) and describe each
//! frame with a [`FrameDesc`].

mod backend;
mod error;
mod handle;

pub use backend::{
    expand_to_rgba, FrameDesc, GpuMesh, GpuObject, GpuTexture, LightingDesc, MaterialParams,
    ShadowMap, WgpuBackend,
};
pub use error::RenderError;
pub use handle::{Handle, HandleStore};
pub use wgpu;
