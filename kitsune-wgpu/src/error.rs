/// Errors raised while setting up or driving the wgpu backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface texture error: {0}")]
    Frame(#[from] wgpu::SurfaceError),

    #[error("unsupported texture channel count: {0}")]
    UnsupportedChannels(u32),

    #[error("texture data is {actual} bytes, expected {expected}")]
    TextureSize { expected: usize, actual: usize },

    #[error("unknown mesh handle {0}")]
    UnknownMesh(u64),

    #[error("unknown texture handle {0}")]
    UnknownTexture(u64),
}
