//! Camera script data model.
//!
//! A script is an ordered list of keyframes plus a loop flag. Keyframes are
//! plain data; the playback engine gives them meaning.

pub mod parser;

use bevy_math::Vec3;

use crate::follow::FollowMode;

pub use parser::{parse, parse_report, DiagnosticKind, ParseReport, ScriptDiagnostic};

/// A position or rotation change: a delta by default, or an absolute value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Motion {
    pub value: Vec3,
    pub absolute: bool,
}

impl Motion {
    pub fn relative(value: Vec3) -> Self {
        Self {
            value,
            absolute: false,
        }
    }

    pub fn absolute(value: Vec3) -> Self {
        Self {
            value,
            absolute: true,
        }
    }
}

/// Space in which a relative position delta is expressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Space {
    #[default]
    World,
    Local,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FovChange {
    pub value: f32,
    /// Applied at keyframe start instead of being interpolated.
    pub immediate: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// Look-at directive for a keyframe.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum LookAt {
    #[default]
    None,
    /// Fixed world point.
    Point { target: Vec3, smooth: bool },
    /// Roster entry looked up by name whenever the keyframe becomes current.
    Player { name: String, smooth: bool },
}

impl LookAt {
    pub fn is_active(&self) -> bool {
        !matches!(self, LookAt::None)
    }

    pub fn is_smooth(&self) -> bool {
        match self {
            LookAt::None => false,
            LookAt::Point { smooth, .. } | LookAt::Player { smooth, .. } => *smooth,
        }
    }
}

/// Hands the rig to the follow controller for the keyframe's duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FollowOverride {
    pub mode: FollowMode,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Keyframe {
    pub position: Motion,
    pub rotation: Motion,
    /// Seconds; zero means "apply now and move on".
    pub duration: f32,
    pub space: Space,
    pub fov: Option<FovChange>,
    pub projection: Option<Projection>,
    pub look_at: LookAt,
    pub follow: Option<FollowOverride>,
}

impl Keyframe {
    /// Non-cinematic keyframes are driven by the follow controller.
    pub fn is_cinematic(&self) -> bool {
        self.follow.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Script {
    pub keyframes: Vec<Keyframe>,
    /// Restart at the first keyframe after the last one completes.
    pub looping: bool,
}

impl Script {
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Sum of keyframe durations (one pass, ignoring the loop flag).
    pub fn total_duration(&self) -> f32 {
        self.keyframes.iter().map(|k| k.duration.max(0.0)).sum()
    }
}
