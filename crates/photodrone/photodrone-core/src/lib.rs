//! PhotoDrone core (engine-agnostic)
//!
//! Camera rigs that either follow a live target or play back a small
//! keyframe script, switching between the two per keyframe. Hosts own a
//! [`RigRegistry`], feed it a [`Roster`] snapshot every frame and apply the
//! returned [`Outputs`] to their cameras.

pub mod camera;
pub mod config;
pub mod error;
pub mod follow;
pub mod ids;
pub mod math;
pub mod outputs;
pub mod playback;
pub mod preset;
pub mod recovery;
pub mod registry;
pub mod rig;
pub mod roster;
pub mod script;

// Re-exports for adapters
pub use camera::{CameraLayer, CameraPair, DisplayElements, PixelRect, RenderSurface, RigBody};
pub use config::{FollowTuning, FovTuning, PhotoDroneConfig, RecoveryCfg, SurfaceCfg};
pub use error::{DroneError, FollowError, PresetError};
pub use follow::{FollowController, FollowMode};
pub use ids::{LiveId, RigId};
pub use math::Pose;
pub use outputs::{DestroyReason, Outputs, RigEvent, RigFrame, SurfaceInfo};
pub use playback::{Control, PlaybackEngine, PlaybackStatus, PlaybackStep};
pub use preset::{DisplaySize, DronePreset, Unit};
pub use recovery::{RecoveryPoll, RecoveryTimer};
pub use registry::{player_position, RigRegistry, RigSpawn};
pub use rig::{Rig, RigControl, TargetState};
pub use roster::{
    resolve_follow_target, resolve_look_target, Anchor, Roster, RosterEntry, RosterRecord,
    SnapshotRoster, TargetHandle,
};
pub use script::{parse, parse_report, Keyframe, LookAt, ParseReport, Script, ScriptDiagnostic};
