use glam::Mat4;
use kitsune_gpu_shared::uniforms::MAX_JOINTS;

use crate::scene::LoadedModel;
use crate::transform::Pose;

/// Rebuild the joint palette from the pose's world matrices.
///
/// For each joint:
///   palette[i] = inverse(mesh_world) * joint_world * inverse_bind[i]
///
/// so the GPU can apply `model * mesh_world` afterwards. Rigid models get a
/// single identity entry.
pub fn update_joint_palette(model: &LoadedModel, pose: &mut Pose) {
    let (Some(skin), Some(mesh)) = (&model.skin, &model.mesh) else {
        pose.palette.clear();
        pose.palette.push(Mat4::IDENTITY);
        return;
    };

    let mesh_world = pose.worlds.get(mesh.node).copied().unwrap_or(Mat4::IDENTITY);
    let inv_mesh_world = mesh_world.inverse();

    let joint_count = skin.joints.len().min(MAX_JOINTS);
    pose.palette.resize(joint_count, Mat4::IDENTITY);

    for i in 0..joint_count {
        let node = skin.joints[i];
        let Some(joint_world) = pose.worlds.get(node) else {
            pose.palette[i] = Mat4::IDENTITY;
            continue;
        };
        let inv_bind = skin.inverse_bind.get(i).copied().unwrap_or(Mat4::IDENTITY);
        pose.palette[i] = inv_mesh_world * *joint_world * inv_bind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_models;
    use crate::transform::compute_world_transforms;
    use glam::Vec3;

    #[test]
    fn test_rest_pose_palette_is_identity() {
        // inverse bind matrices are the inverse of the rest world transforms
        let model = test_models::two_clip_rig();
        let mut pose = Pose::rest(&model);
        compute_world_transforms(&model, &mut pose);
        update_joint_palette(&model, &mut pose);

        assert_eq!(pose.palette.len(), 2);
        for m in &pose.palette {
            assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-5), "{m:?}");
        }
    }

    #[test]
    fn test_moved_joint_shows_in_palette() {
        let model = test_models::two_clip_rig();
        let mut pose = Pose::rest(&model);
        pose.locals[1].translation += Vec3::new(0.0, 0.5, 0.0);
        compute_world_transforms(&model, &mut pose);
        update_joint_palette(&model, &mut pose);

        let moved = pose.palette[1].transform_point3(Vec3::ZERO);
        assert!((moved - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_rigid_model_gets_single_identity() {
        let mut model = test_models::two_clip_rig();
        model.skin = None;
        let mut pose = Pose::rest(&model);
        compute_world_transforms(&model, &mut pose);
        update_joint_palette(&model, &mut pose);
        assert_eq!(pose.palette, vec![Mat4::IDENTITY]);
    }
}
