//! Per-update outputs of the rig registry.
//!
//! `frames` holds the state of every live rig after the update; adapters
//! copy it onto their camera entities. `events` carries the discrete
//! changes since the previous update, in the order they happened.

use serde::Serialize;

use crate::follow::FollowMode;
use crate::ids::RigId;

/// Snapshot of one rig after an update.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RigFrame {
    pub rig: RigId,
    pub position: [f32; 3],
    /// Quaternion (x, y, z, w).
    pub rotation: [f32; 4],
    pub fov: f32,
    pub orthographic: bool,
    pub cameras_enabled: bool,
    pub surface: SurfaceInfo,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SurfaceInfo {
    pub width: u32,
    pub height: u32,
    pub generation: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum DestroyReason {
    /// Explicit close request.
    Closed,
    /// Recovery window expired without the target coming back.
    RecoveryTimeout,
    /// The registry was shut down.
    Shutdown,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub enum RigEvent {
    Created {
        rig: RigId,
        cinematic: bool,
    },
    TargetBound {
        rig: RigId,
        username: String,
    },
    TargetLost {
        rig: RigId,
        username: String,
        reason: String,
    },
    Recovered {
        rig: RigId,
        username: String,
        after: f32,
    },
    FollowModeChanged {
        rig: RigId,
        mode: FollowMode,
    },
    KeyframeStarted {
        rig: RigId,
        index: usize,
    },
    PlaybackFinished {
        rig: RigId,
    },
    SurfaceResized {
        rig: RigId,
        width: u32,
        height: u32,
    },
    Destroyed {
        rig: RigId,
        reason: DestroyReason,
    },
}

impl RigEvent {
    pub fn rig(&self) -> &RigId {
        match self {
            RigEvent::Created { rig, .. }
            | RigEvent::TargetBound { rig, .. }
            | RigEvent::TargetLost { rig, .. }
            | RigEvent::Recovered { rig, .. }
            | RigEvent::FollowModeChanged { rig, .. }
            | RigEvent::KeyframeStarted { rig, .. }
            | RigEvent::PlaybackFinished { rig }
            | RigEvent::SurfaceResized { rig, .. }
            | RigEvent::Destroyed { rig, .. } => rig,
        }
    }
}

/// Outputs returned by `RigRegistry::update`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Outputs {
    pub frames: Vec<RigFrame>,
    pub events: Vec<RigEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.frames.clear();
        self.events.clear();
    }

    pub fn frame(&self, rig: &RigId) -> Option<&RigFrame> {
        self.frames.iter().find(|f| &f.rig == rig)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.events.is_empty()
    }
}
