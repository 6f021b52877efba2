//! Follow modes and the per-rig follow controller.
//!
//! Each mode is a pure function of the target pose, the rig's current pose,
//! `dt` and the tuning. The controller adds the mode's FOV handling and
//! turns missing or broken poses into [`FollowError`]s for the rig to
//! recover from.

use std::fmt;

use bevy_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::CameraPair;
use crate::config::{FollowTuning, FovTuning};
use crate::error::FollowError;
use crate::math::{euler_degrees, facing, look_rotation, Pose};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowMode {
    /// Eases toward the chase offset and look-ahead point.
    #[default]
    Smooth,
    /// Chase offset and look-ahead, snapped every tick.
    Strict,
    /// Rigidly attached behind the target with a fixed tilt.
    Locked,
    /// Front bumper view.
    Bumper,
    /// Driver's eye view.
    First,
}

impl FollowMode {
    pub const ALL: [FollowMode; 5] = [
        FollowMode::Smooth,
        FollowMode::Strict,
        FollowMode::Locked,
        FollowMode::Bumper,
        FollowMode::First,
    ];

    /// Case-insensitive name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(name))
    }

    /// Like [`from_name`](Self::from_name) but falls back to Smooth.
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FollowMode::Smooth => "smooth",
            FollowMode::Strict => "strict",
            FollowMode::Locked => "locked",
            FollowMode::Bumper => "bumper",
            FollowMode::First => "first",
        }
    }

    /// Rig pose for this tick.
    ///
    /// Smooth uses `speed * dt` as its easing factor without clamping, so
    /// large steps overshoot the goal.
    pub fn solve(self, target: &Pose, current: &Pose, dt: f32, tuning: &FollowTuning) -> Pose {
        let look_point = look_ahead_point(target, tuning);
        match self {
            FollowMode::Smooth => {
                let goal = target.position + target.rotation * tuning.follow_offset();
                let s = tuning.smooth_follow_speed * dt;
                let position = current.position.lerp(goal, s);
                let rotation = current
                    .rotation
                    .slerp(look_rotation(look_point - position, Vec3::Y), s);
                Pose::new(position, rotation)
            }
            FollowMode::Strict => {
                let position = target.position + target.rotation * tuning.follow_offset();
                let rotation = facing(position, look_point).unwrap_or(current.rotation);
                Pose::new(position, rotation)
            }
            FollowMode::Locked => Pose::new(
                target.transform_point(tuning.locked_offset()),
                target.rotation * euler_degrees(tuning.locked_tilt()),
            ),
            FollowMode::Bumper => Pose::new(
                target.transform_point(tuning.bumper_offset()),
                target.rotation,
            ),
            FollowMode::First => Pose::new(
                target.transform_point(tuning.first_person_offset()),
                target.rotation,
            ),
        }
    }
}

impl fmt::Display for FollowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[inline]
fn look_ahead_point(target: &Pose, tuning: &FollowTuning) -> Vec3 {
    target.position + target.forward() * tuning.look_ahead_distance
}

/// Active follow mode of one rig.
#[derive(Clone, Debug, PartialEq)]
pub struct FollowController {
    mode: FollowMode,
    tuning: FollowTuning,
    fov: FovTuning,
}

impl FollowController {
    pub fn new(mode: FollowMode, tuning: FollowTuning, fov: FovTuning) -> Self {
        Self { mode, tuning, fov }
    }

    pub fn mode(&self) -> FollowMode {
        self.mode
    }

    pub fn tuning(&self) -> &FollowTuning {
        &self.tuning
    }

    pub fn fov_tuning(&self) -> &FovTuning {
        &self.fov
    }

    /// Switch mode and push that mode's FOV to both cameras. Returns true
    /// when the mode actually changed.
    pub fn set_mode(&mut self, mode: FollowMode, cameras: &mut CameraPair) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        self.apply_fov(cameras);
        changed
    }

    pub fn apply_fov(&self, cameras: &mut CameraPair) {
        cameras.set_fov(self.fov.for_mode(self.mode));
    }

    /// Pose a rig takes when it binds to a target: chase offset, facing the
    /// look-ahead point. Used for every mode.
    pub fn bind_pose(&self, target: &Pose) -> Pose {
        let position = target.position + target.rotation * self.tuning.follow_offset();
        let direction = look_ahead_point(target, &self.tuning) - position;
        Pose::new(position, look_rotation(direction, Vec3::Y))
    }

    /// One follow step. `target` is `None` when the handle no longer
    /// resolves.
    pub fn tick(
        &self,
        target_name: &str,
        target: Option<Pose>,
        current: &Pose,
        dt: f32,
    ) -> Result<Pose, FollowError> {
        let target = target.ok_or_else(|| FollowError::TargetLost(target_name.to_string()))?;
        if !target.is_finite() {
            return Err(FollowError::NonFinitePose);
        }
        let next = self.mode.solve(&target, current, dt, &self.tuning);
        if next.is_finite() {
            Ok(next)
        } else {
            Err(FollowError::NonFinitePose)
        }
    }
}
