use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Mat4, Quat, Vec3};

use crate::input::{Direction, InputState};

/// World placement of the actor root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorTransform {
    pub position: Vec3,
    /// Rotation about +Y, radians.
    pub yaw: f32,
    pub scale: f32,
}

impl ActorTransform {
    pub fn new(scale: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            scale,
        }
    }

    /// T(position) * R_y(yaw) * S(scale)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y(self.yaw),
            self.position,
        )
    }
}

/// Direction, unit displacement and facing yaw. Evaluated top to bottom so
/// the last held key in this order decides the facing.
const MOVEMENT_TABLE: [(Direction, Vec3, f32); 4] = [
    (Direction::Forward, Vec3::NEG_Z, PI),
    (Direction::Backward, Vec3::Z, 0.0),
    (Direction::Left, Vec3::NEG_X, FRAC_PI_2),
    (Direction::Right, Vec3::X, -FRAC_PI_2),
];

/// Move `transform` by `step` along every held direction and face the last
/// one in table order. Nothing changes when no key is held.
pub fn apply_movement(input: &InputState, step: f32, transform: &mut ActorTransform) {
    for (direction, delta, yaw) in MOVEMENT_TABLE {
        if input.is_held(direction) {
            transform.position += delta * step;
            transform.yaw = yaw;
        }
    }
}
