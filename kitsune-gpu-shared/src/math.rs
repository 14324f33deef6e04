use glam::{Mat4, Vec3};

/// Orthographic frustum of a directional light's shadow camera, in light view space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl ShadowBounds {
    /// Symmetric box of half-extent `half` reaching out to `far`.
    pub fn square(half: f32, near: f32, far: f32) -> Self {
        Self {
            left: -half,
            right: half,
            bottom: -half,
            top: half,
            near,
            far,
        }
    }
}

/// View-projection matrix of a directional light placed at `position` and aimed at `target`.
///
/// Depth lands in wgpu's [0, 1] clip range.
pub fn light_view_proj(position: Vec3, target: Vec3, bounds: &ShadowBounds) -> Mat4 {
    let forward = (target - position).normalize_or_zero();
    // look_at_rh degenerates when looking straight down the up axis
    let up = if forward.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(position, target, up);
    let proj = Mat4::orthographic_rh(
        bounds.left,
        bounds.right,
        bounds.bottom,
        bounds.top,
        bounds.near,
        bounds.far,
    );
    proj * view
}

/// Unit vector from a lit surface towards a directional light.
pub fn light_direction(position: Vec3, target: Vec3) -> Vec3 {
    (position - target).normalize_or(Vec3::Y)
}

/// Inverse-transpose of the model matrix for transforming normals.
/// Falls back to the model matrix itself when it is singular.
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    if model.determinant().abs() < 1e-12 {
        return *model;
    }
    model.inverse().transpose()
}

/// Convert one sRGB-encoded channel in [0, 1] to linear.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert a `0xRRGGBB` sRGB color to linear rgb.
pub fn hex_to_linear(hex: u32) -> [f32; 3] {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b)]
}
