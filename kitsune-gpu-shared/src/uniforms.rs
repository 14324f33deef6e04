use bytemuck::{Pod, Zeroable};

/// Upper bound on joints per skinned object (size of the palette buffer).
pub const MAX_JOINTS: usize = 128;

/// Vertex layout used for every mesh on the stage.
///
/// Rigid meshes bind a single identity joint and use
/// `joints = [0; 4]`, `weights = [1, 0, 0, 0]`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub joints: [u32; 4],
    pub weights: [f32; 4],
}

impl SkinnedVertex {
    /// A vertex that follows joint 0 entirely.
    pub fn rigid(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            joints: [0; 4],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Per-frame uniforms (group 0, binding 0). Mirrors `FrameUniforms` in WGSL.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    /// xyz = camera world position.
    pub camera_position: [f32; 4],
    /// xyz = unit vector pointing from the surface towards the light.
    pub light_direction: [f32; 4],
    /// rgb = linear color, w = intensity.
    pub light_color: [f32; 4],
    /// rgb = linear color, w = intensity.
    pub ambient: [f32; 4],
    /// x = 1 / shadow map size, y = depth bias, z = shadows enabled (0/1).
    pub shadow_params: [f32; 4],
}

/// Per-object uniforms (group 1, binding 0). Mirrors `ObjectUniforms` in WGSL.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    /// Linear rgba multiplier applied on top of the base color texture.
    pub base_color: [f32; 4],
    /// x = metalness, y = roughness, z = has texture (0/1), w = receives shadow (0/1).
    pub material: [f32; 4],
}
