//! Fixed stage dressing: the floor plane, the lights and their shadow
//! frustum, and the materials handed to the backend.

use glam::Vec3;
use kitsune_gpu_shared::math::{hex_to_linear, light_direction, light_view_proj, ShadowBounds};
use kitsune_gpu_shared::uniforms::SkinnedVertex;
use kitsune_wgpu::{LightingDesc, MaterialParams};

use crate::config::{FloorConfig, LightingConfig};
use crate::scene::SkinnedMesh;

/// Horizontal `width` x `depth` quad centred on the origin, facing +Y.
pub fn floor_mesh(width: f32, depth: f32) -> (Vec<SkinnedVertex>, Vec<u32>) {
    let (hw, hd) = (width / 2.0, depth / 2.0);
    let up = [0.0, 1.0, 0.0];
    let vertices = vec![
        SkinnedVertex::rigid([-hw, 0.0, -hd], up, [0.0, 0.0]),
        SkinnedVertex::rigid([-hw, 0.0, hd], up, [0.0, 1.0]),
        SkinnedVertex::rigid([hw, 0.0, hd], up, [1.0, 1.0]),
        SkinnedVertex::rigid([hw, 0.0, -hd], up, [1.0, 0.0]),
    ];
    (vertices, vec![0, 1, 2, 0, 2, 3])
}

pub fn floor_material(config: &FloorConfig) -> MaterialParams {
    let [r, g, b] = hex_to_linear(config.color);
    MaterialParams {
        base_color: [r, g, b, 1.0],
        metalness: config.metalness,
        roughness: config.roughness,
        receives_shadow: true,
        casts_shadow: false,
    }
}

/// Material of the actor mesh. The glTF base color factor is already linear.
pub fn actor_material(mesh: &SkinnedMesh, cast_shadow: bool) -> MaterialParams {
    MaterialParams {
        base_color: mesh.base_color,
        metalness: mesh.metalness,
        roughness: mesh.roughness,
        receives_shadow: true,
        casts_shadow: cast_shadow,
    }
}

/// Directional light aimed at the origin plus the ambient term.
pub fn lighting_desc(config: &LightingConfig) -> LightingDesc {
    let position = Vec3::from(config.light_position);
    let bounds = ShadowBounds::square(config.shadow_extent, config.shadow_near, config.shadow_far);
    LightingDesc {
        ambient_color: hex_to_linear(config.ambient_color),
        ambient_intensity: config.ambient_intensity,
        light_color: hex_to_linear(config.light_color),
        light_intensity: config.light_intensity,
        light_direction: light_direction(position, Vec3::ZERO),
        light_view_proj: light_view_proj(position, Vec3::ZERO, &bounds),
        shadows_enabled: config.shadows,
    }
}

pub fn clear_color(hex: u32) -> [f64; 3] {
    hex_to_linear(hex).map(f64::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_extent_and_normal() {
        let (vertices, indices) = floor_mesh(10.0, 15.0);
        assert_eq!(indices.len(), 6);
        let xs: Vec<f32> = vertices.iter().map(|v| v.position[0]).collect();
        let zs: Vec<f32> = vertices.iter().map(|v| v.position[2]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 5.0);
        assert_eq!(zs.iter().cloned().fold(f32::MAX, f32::min), -7.5);
        assert!(vertices.iter().all(|v| v.position[1] == 0.0 && v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_floor_winding_faces_up() {
        let (vertices, indices) = floor_mesh(10.0, 15.0);
        for tri in indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(vertices[i as usize].position));
            let normal = (b - a).cross(c - a);
            assert!(normal.y > 0.0);
        }
    }

    #[test]
    fn test_floor_material_is_dark_grey_dielectric() {
        let m = floor_material(&FloorConfig::default());
        assert!(m.base_color[0] > 0.05 && m.base_color[0] < 0.07);
        assert_eq!(m.metalness, 0.0);
        assert_eq!(m.roughness, 0.5);
        assert!(m.receives_shadow);
        assert!(!m.casts_shadow);
    }

    #[test]
    fn test_light_points_from_origin_to_light() {
        let desc = lighting_desc(&LightingConfig::default());
        let expected = Vec3::splat(1.0).normalize();
        assert!((desc.light_direction - expected).length() < 1e-5);
        assert_eq!(desc.ambient_intensity, 2.4);
        assert_eq!(desc.light_intensity, 1.8);
        assert!(desc.shadows_enabled);
    }

    #[test]
    fn test_origin_inside_shadow_frustum() {
        let desc = lighting_desc(&LightingConfig::default());
        let p = desc.light_view_proj * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = p.truncate() / p.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
