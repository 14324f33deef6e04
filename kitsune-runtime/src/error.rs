/// Errors raised while loading a character model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to import glTF: {0}")]
    Import(#[from] gltf::Error),

    #[error("{role} clip index {index} out of range, model has {found} clip(s)")]
    MissingClip {
        role: &'static str,
        index: usize,
        found: usize,
    },

    #[error("idle and walk must be different clips (both are {0})")]
    SameClip(usize),
}
