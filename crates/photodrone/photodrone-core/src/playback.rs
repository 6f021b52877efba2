//! Keyframe playback.
//!
//! The engine owns one [`Script`] and advances it every tick against a
//! [`RigBody`]. When a keyframe becomes current its start pose is captured
//! and its goal precomputed; timed cinematic keyframes then interpolate from
//! that snapshot, zero-duration keyframes apply at once and fall through to
//! the next one within the same tick, and follow keyframes only keep time
//! while the rig's follow controller drives the pose.

use bevy_math::{Quat, Vec3};
use log::{debug, warn};

use crate::camera::RigBody;
use crate::follow::FollowMode;
use crate::math::{euler_degrees, facing, Pose};
use crate::roster::{resolve_look_target, Roster, TargetHandle};
use crate::script::{Keyframe, LookAt, Projection, Script, Space};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
    Finished,
}

/// Who drives the rig pose while the current keyframe runs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Control {
    Cinematic,
    Follow(FollowMode),
}

/// What happened during one [`PlaybackEngine::tick`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackStep {
    /// Keyframe indices that became current, in order.
    pub started: Vec<usize>,
    /// Control requested by the last keyframe that became current.
    pub claimed: Option<Control>,
    /// The current keyframe belongs to the follow controller this tick.
    pub delegated: bool,
    /// Playback ran off the end of a non-looping script.
    pub finished: bool,
}

/// Look-at point source, resolved when the keyframe became current.
#[derive(Copy, Clone, Debug, PartialEq)]
enum LookTarget {
    None,
    Point(Vec3),
    Tracked(TargetHandle),
}

#[derive(Clone, Debug, PartialEq)]
struct ActiveKeyframe {
    start: Pose,
    goal_position: Vec3,
    goal_rotation: Quat,
    /// (from, to) when the FOV is interpolated.
    fov_tween: Option<(f32, f32)>,
    look: LookTarget,
}

#[derive(Clone, Debug, Default)]
pub struct PlaybackEngine {
    script: Script,
    index: usize,
    elapsed: f32,
    status: PlaybackStatus,
    active: Option<ActiveKeyframe>,
}

impl PlaybackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the script and start at its first keyframe. The keyframe is
    /// set up on the next tick. An empty script leaves the engine idle.
    pub fn start(&mut self, script: Script) {
        self.script = script;
        self.restart();
    }

    /// Start the loaded script over from index 0.
    pub fn restart(&mut self) {
        self.index = 0;
        self.elapsed = 0.0;
        self.active = None;
        self.status = if self.script.is_empty() {
            PlaybackStatus::Idle
        } else {
            PlaybackStatus::Playing
        };
    }

    /// Halt playback. The rig keeps its current pose.
    pub fn stop(&mut self) {
        self.status = PlaybackStatus::Idle;
        self.active = None;
        self.elapsed = 0.0;
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Seconds spent in the current keyframe.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn current_keyframe(&self) -> Option<&Keyframe> {
        if self.is_playing() {
            self.script.keyframes.get(self.index)
        } else {
            None
        }
    }

    pub fn tick(&mut self, dt: f32, body: &mut RigBody, roster: &dyn Roster) -> PlaybackStep {
        let mut step = PlaybackStep::default();
        if self.status != PlaybackStatus::Playing {
            return step;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        // Zero-duration chains may loop forever; bound them per tick.
        let mut instant_budget = self.script.len();

        loop {
            if self.active.is_none() {
                self.setup_current(body, roster, &mut step);
            }
            let duration = self.script.keyframes[self.index].duration;

            if duration <= 0.0 {
                if instant_budget == 0 {
                    warn!(
                        "playback: {} zero-duration keyframes in one tick, deferring the rest",
                        self.script.len()
                    );
                    break;
                }
                instant_budget -= 1;
                self.apply_instant(body);
                if self.advance(body, roster, &mut step) {
                    continue;
                }
                break;
            }

            self.elapsed += dt;
            if self.script.keyframes[self.index].is_cinematic() {
                let t = (self.elapsed / duration).clamp(0.0, 1.0);
                self.interpolate(t, dt, body, roster);
                if t >= 1.0 {
                    self.advance(body, roster, &mut step);
                }
            } else {
                step.delegated = true;
                if self.elapsed >= duration {
                    self.advance(body, roster, &mut step);
                }
            }
            break;
        }
        step
    }

    /// Capture the start snapshot of the current keyframe and apply its
    /// at-start effects.
    fn setup_current(&mut self, body: &mut RigBody, roster: &dyn Roster, step: &mut PlaybackStep) {
        let frame = &self.script.keyframes[self.index];
        let start = body.pose;

        let goal_position = if frame.position.absolute {
            frame.position.value
        } else if frame.space == Space::Local {
            start.transform_point(frame.position.value)
        } else {
            start.position + frame.position.value
        };
        let goal_rotation = if frame.rotation.absolute {
            euler_degrees(frame.rotation.value)
        } else {
            start.rotation * euler_degrees(frame.rotation.value)
        };

        if let Some(projection) = frame.projection {
            body.cameras
                .set_orthographic(projection == Projection::Orthographic);
        }

        let fov_tween = match frame.fov {
            Some(change) if !change.immediate && frame.duration > 0.0 => {
                Some((body.cameras.fov(), change.value))
            }
            Some(change) => {
                body.cameras.set_fov(change.value);
                None
            }
            None => None,
        };

        let look = match &frame.look_at {
            LookAt::None => LookTarget::None,
            LookAt::Point { target, .. } => LookTarget::Point(*target),
            LookAt::Player { name, .. } => match resolve_look_target(roster, name) {
                Some(handle) => LookTarget::Tracked(handle),
                // Unresolved players fall back to the static point.
                None => LookTarget::Point(Vec3::ZERO),
            },
        };

        let control = match frame.follow {
            Some(over) => Control::Follow(over.mode),
            None => Control::Cinematic,
        };
        debug!(
            "playback: keyframe {} current ({:?}, {}s)",
            self.index, control, frame.duration
        );
        step.started.push(self.index);
        step.claimed = Some(control);

        self.active = Some(ActiveKeyframe {
            start,
            goal_position,
            goal_rotation,
            fov_tween,
            look,
        });
    }

    fn apply_instant(&self, body: &mut RigBody) {
        let frame = &self.script.keyframes[self.index];
        let pose = &mut body.pose;
        pose.position = if frame.position.absolute {
            frame.position.value
        } else if frame.space == Space::Local {
            pose.transform_point(frame.position.value)
        } else {
            pose.position + frame.position.value
        };
        pose.rotation = if frame.rotation.absolute {
            euler_degrees(frame.rotation.value)
        } else {
            pose.rotation * euler_degrees(frame.rotation.value)
        };
    }

    fn interpolate(&self, t: f32, dt: f32, body: &mut RigBody, roster: &dyn Roster) {
        let Some(active) = &self.active else {
            return;
        };
        let frame = &self.script.keyframes[self.index];

        if frame.space == Space::Local && frame.look_at.is_active() {
            // Constant local-space velocity, re-oriented every tick.
            let velocity = body.pose.rotation * frame.position.value / frame.duration;
            body.pose.position += velocity * dt;
        } else {
            body.pose.position = active.start.position.lerp(active.goal_position, t);
        }

        let look_point = match active.look {
            LookTarget::None => None,
            LookTarget::Point(point) => Some(point),
            LookTarget::Tracked(handle) => roster.anchor_pose(&handle).map(|p| p.position),
        };
        if frame.look_at.is_active() {
            // A tracked target that vanished leaves the rotation alone this tick.
            if let Some(look) = look_point.and_then(|p| facing(body.pose.position, p)) {
                body.pose.rotation = if frame.look_at.is_smooth() {
                    active.start.rotation.slerp(look, t)
                } else {
                    look
                };
            }
        } else {
            body.pose.rotation = active.start.rotation.slerp(active.goal_rotation, t);
        }

        if let Some((from, to)) = active.fov_tween {
            body.cameras.set_fov(from + (to - from) * t);
        }
    }

    /// Move to the next keyframe. Returns false once playback has finished.
    fn advance(&mut self, body: &mut RigBody, roster: &dyn Roster, step: &mut PlaybackStep) -> bool {
        self.index += 1;
        self.elapsed = 0.0;
        self.active = None;
        if self.index >= self.script.len() {
            if self.script.looping && !self.script.is_empty() {
                self.index = 0;
            } else {
                self.index = self.script.len();
                self.status = PlaybackStatus::Finished;
                step.finished = true;
                return false;
            }
        }
        self.setup_current(body, roster, step);
        true
    }
}
