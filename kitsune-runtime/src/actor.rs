use glam::Mat4;

use crate::animation::AnimationMixer;
use crate::config::ActorConfig;
use crate::error::ModelError;
use crate::gait::{Gait, GaitController};
use crate::input::InputState;
use crate::motion::ActorTransform;
use crate::scene::LoadedModel;
use crate::skinning::update_joint_palette;
use crate::transform::{compute_world_transforms, Pose};

/// The animated character: model data, its mixer and gait, and its placement.
pub struct Actor {
    pub transform: ActorTransform,
    model: LoadedModel,
    mixer: AnimationMixer,
    gait: GaitController,
    pose: Pose,
}

impl Actor {
    /// Wrap a loaded model. The gait starts in the state matching `input`.
    pub fn new(
        model: LoadedModel,
        config: &ActorConfig,
        input: &InputState,
    ) -> Result<Self, ModelError> {
        let found = model.clips.len();
        for (role, index) in [("idle", config.idle_clip), ("walk", config.walk_clip)] {
            if index >= found {
                return Err(ModelError::MissingClip { role, index, found });
            }
        }
        if config.idle_clip == config.walk_clip {
            return Err(ModelError::SameClip(config.idle_clip));
        }

        let mut mixer = AnimationMixer::new(&model.clips);
        mixer.set_time_scale(config.time_scale);
        let gait = GaitController::start(config.idle_clip, config.walk_clip, input, &mut mixer);

        let mut pose = Pose::rest(&model);
        compute_world_transforms(&model, &mut pose);
        update_joint_palette(&model, &mut pose);

        Ok(Self {
            transform: ActorTransform::new(config.scale),
            model,
            mixer,
            gait,
            pose,
        })
    }

    pub fn gait(&self) -> Gait {
        self.gait.gait()
    }

    /// Swap clips if `input` calls for a different gait.
    pub fn sync_gait(&mut self, input: &InputState) -> Option<Gait> {
        self.gait.sync(input, &mut self.mixer)
    }

    /// Advance the mixer by `dt` seconds and rebuild the pose.
    pub fn advance(&mut self, dt: f32) {
        self.mixer.update(dt);
        self.pose.reset_to_rest(&self.model);
        self.mixer.apply(&self.model.clips, &mut self.pose.locals);
        compute_world_transforms(&self.model, &mut self.pose);
        update_joint_palette(&self.model, &mut self.pose);
    }

    /// World matrix of the actor root.
    pub fn root_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// World matrix the mesh is drawn with.
    pub fn mesh_matrix(&self) -> Mat4 {
        let mesh_world = self
            .model
            .mesh
            .as_ref()
            .and_then(|m| self.pose.worlds.get(m.node))
            .copied()
            .unwrap_or(Mat4::IDENTITY);
        self.root_matrix() * mesh_world
    }

    pub fn palette(&self) -> &[Mat4] {
        &self.pose.palette
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn model(&self) -> &LoadedModel {
        &self.model
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Direction;
    use crate::scene::test_models;
    use glam::Vec3;

    fn config() -> ActorConfig {
        ActorConfig::default()
    }

    #[test]
    fn test_new_plays_idle() {
        let actor = Actor::new(test_models::two_clip_rig(), &config(), &InputState::new()).unwrap();
        assert_eq!(actor.gait(), Gait::Idle);
        assert!(actor.mixer().is_playing(0));
        assert!(!actor.mixer().is_playing(1));
        assert_eq!(actor.transform.scale, 0.025);
    }

    #[test]
    fn test_new_rejects_missing_walk_clip() {
        let mut model = test_models::two_clip_rig();
        model.clips.truncate(1);
        let err = Actor::new(model, &config(), &InputState::new()).err().unwrap();
        assert!(matches!(
            err,
            ModelError::MissingClip {
                role: "walk",
                index: 1,
                found: 1
            }
        ));
    }

    #[test]
    fn test_new_rejects_same_clip() {
        let config = ActorConfig {
            walk_clip: 0,
            ..config()
        };
        let err = Actor::new(test_models::two_clip_rig(), &config, &InputState::new())
            .err()
            .unwrap();
        assert!(matches!(err, ModelError::SameClip(0)));
    }

    #[test]
    fn test_advance_samples_playing_clip() {
        let mut actor =
            Actor::new(test_models::two_clip_rig(), &config(), &InputState::new()).unwrap();
        actor.advance(0.5);
        // idle clip lifts the bone from y=1 to y=1.5 over one second
        let bone = actor.pose().locals[1].translation;
        assert!((bone - Vec3::new(0.0, 1.25, 0.0)).length() < 1e-5);
        assert!((actor.mixer().action(0).unwrap().time - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_gait_swap_rewinds_new_clip() {
        let mut actor =
            Actor::new(test_models::two_clip_rig(), &config(), &InputState::new()).unwrap();
        actor.advance(0.3);

        let mut input = InputState::new();
        input.set_key(Direction::Forward, true);
        assert_eq!(actor.sync_gait(&input), Some(Gait::Walk));
        assert!(!actor.mixer().is_playing(0));
        assert_eq!(actor.mixer().action(1).unwrap().time, 0.0);

        actor.advance(0.1);
        input.set_key(Direction::Left, true);
        assert_eq!(actor.sync_gait(&input), None);
        assert!((actor.mixer().action(1).unwrap().time - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_mesh_matrix_includes_root() {
        let mut actor =
            Actor::new(test_models::two_clip_rig(), &config(), &InputState::new()).unwrap();
        actor.transform.position = Vec3::new(1.0, 0.0, -2.0);
        let origin = actor.mesh_matrix().transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 0.0, -2.0)).length() < 1e-5);
    }
}
