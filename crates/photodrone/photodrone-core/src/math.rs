//! Pose math shared by playback and follow.
//!
//! Conventions: +Y is up and +Z is forward. Euler angles are degrees applied
//! Z first, then X, then Y, so `euler_degrees(Vec3::new(0.0, 90.0, 0.0))`
//! turns +Z toward +X.

use bevy_math::{EulerRot, Mat3, Quat, Vec3};

/// Look directions shorter than this (squared) leave rotation untouched.
pub const MIN_LOOK_DISTANCE_SQ: f32 = 0.001;

/// Position + rotation of a rig or a tracked entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Build a pose from a position and euler angles in degrees.
    pub fn from_euler_degrees(position: Vec3, euler: Vec3) -> Self {
        Self {
            position,
            rotation: euler_degrees(euler),
        }
    }

    /// Local point → world space.
    #[inline]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Local direction → world space (rotation only).
    #[inline]
    pub fn transform_direction(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }
}

/// Quaternion for euler angles given in degrees (Z, X, Y application order).
#[inline]
pub fn euler_degrees(euler: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        euler.y.to_radians(),
        euler.x.to_radians(),
        euler.z.to_radians(),
    )
}

/// Rotation whose +Z axis faces `direction`, keeping +Y as close to `up` as possible.
///
/// When `direction` is parallel to `up` the shortest arc from +Z is used instead.
pub fn look_rotation(direction: Vec3, up: Vec3) -> Quat {
    let z = direction.normalize_or_zero();
    if z == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let x = up.cross(z);
    if x.length_squared() <= f32::EPSILON {
        return Quat::from_rotation_arc(Vec3::Z, z);
    }
    let x = x.normalize();
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize()
}

/// Rotation that makes a body at `from` face `point`, or `None` when the
/// point is too close to pick a direction.
#[inline]
pub fn facing(from: Vec3, point: Vec3) -> Option<Quat> {
    let dir = point - from;
    if dir.length_squared() > MIN_LOOK_DISTANCE_SQ {
        Some(look_rotation(dir, Vec3::Y))
    } else {
        None
    }
}
