use glam::{Mat4, Quat, Vec3};

use crate::scene::LoadedModel;

/// Local translation/rotation/scale of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl NodeTransform {
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Per-frame animated state of a model: local transforms, world matrices and
/// the joint palette uploaded to the GPU.
#[derive(Debug, Clone)]
pub struct Pose {
    pub locals: Vec<NodeTransform>,
    pub worlds: Vec<Mat4>,
    pub palette: Vec<Mat4>,
}

impl Pose {
    /// Pose at the model's rest transforms. World matrices are not yet computed.
    pub fn rest(model: &LoadedModel) -> Self {
        Self {
            locals: model.nodes.iter().map(|n| n.rest).collect(),
            worlds: vec![Mat4::IDENTITY; model.nodes.len()],
            palette: Vec::new(),
        }
    }

    pub fn reset_to_rest(&mut self, model: &LoadedModel) {
        for (local, node) in self.locals.iter_mut().zip(&model.nodes) {
            *local = node.rest;
        }
    }
}

/// Compute world matrices for every node. Walks the model's traversal order
/// so a parent is always resolved before its children.
pub fn compute_world_transforms(model: &LoadedModel, pose: &mut Pose) {
    let n = model.nodes.len().min(pose.locals.len());
    pose.worlds.resize(model.nodes.len(), Mat4::IDENTITY);

    for &i in &model.traversal {
        if i >= n {
            continue;
        }
        let local = pose.locals[i].to_matrix();
        pose.worlds[i] = match model.nodes[i].parent {
            Some(parent) if parent < n => pose.worlds[parent] * local,
            _ => local,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_models;

    fn approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_default_is_identity() {
        assert_eq!(NodeTransform::default().to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_child_composes_parent() {
        let model = test_models::two_clip_rig();
        let mut pose = Pose::rest(&model);
        pose.locals[0].translation = Vec3::new(1.0, 0.0, 0.0);
        pose.locals[1].translation = Vec3::new(0.0, 2.0, 0.0);
        compute_world_transforms(&model, &mut pose);

        let child_origin = pose.worlds[1].transform_point3(Vec3::ZERO);
        assert!(approx_eq(child_origin, Vec3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn test_parent_rotation_carries_child() {
        let model = test_models::two_clip_rig();
        let mut pose = Pose::rest(&model);
        pose.locals[0].rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        pose.locals[1].translation = Vec3::new(0.0, 0.0, 1.0);
        compute_world_transforms(&model, &mut pose);

        let child_origin = pose.worlds[1].transform_point3(Vec3::ZERO);
        assert!(approx_eq(child_origin, Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_reset_to_rest() {
        let model = test_models::two_clip_rig();
        let mut pose = Pose::rest(&model);
        pose.locals[1].scale = Vec3::splat(4.0);
        pose.reset_to_rest(&model);
        assert_eq!(pose.locals[1], model.nodes[1].rest);
    }
}
