use bevy::prelude::*;
use std::collections::HashMap;

use photodrone_core::{
    DisplaySize, DronePreset, RigEvent, RigFrame, RigId, RigRegistry, SnapshotRoster, Unit,
};

/// The core registry owned by the app.
#[derive(Resource, Default)]
pub struct DroneRegistry(pub RigRegistry);

/// Roster snapshot rebuilt from ECS entities every frame.
#[derive(Resource, Default)]
pub struct RosterSnapshot(pub SnapshotRoster);

/// Host display size used for `%` placements.
#[derive(Resource, Default, Clone, Copy)]
pub struct DisplaySizeRes(pub DisplaySize);

/// Outputs of the last registry update, staged for the sync/apply systems.
#[derive(Resource, Default)]
pub struct PendingFrames {
    pub frames: Vec<RigFrame>,
}

/// Spawned entities of one rig.
#[derive(Debug, Clone)]
pub struct RigEntities {
    pub root: Entity,
    pub cameras: [Entity; 2],
    pub surface_generation: u32,
    pub image: Option<Handle<Image>>,
}

/// Rig id → spawned entities.
#[derive(Resource, Default)]
pub struct RigEntityIndex {
    pub map: HashMap<RigId, RigEntities>,
}

/// Commands from the host (UI, scripting, input) to the registry. Failures
/// are logged and otherwise ignored.
#[derive(Event, Debug, Clone)]
pub enum DroneRequest {
    /// `preset` is preset text or `cinematic`.
    Create { id: RigId, preset: String },
    /// One rig per preset under generated ids.
    ApplyGroup(Vec<DronePreset>),
    Close(RigId),
    CloseAll,
    SetTarget { rig: RigId, username: String },
    SetFollowMode { rig: RigId, mode: String },
    SetFov { rig: RigId, fov: f32 },
    SetCinematic {
        rig: RigId,
        state: bool,
        ui_visible: bool,
        script: Option<String>,
    },
    RunScript { rig: RigId, script: String },
    StopScript(RigId),
    /// Window visibility of every non-cinematic rig.
    SetUi(bool),
    SetLocked { rig: RigId, locked: bool },
    SetRect {
        rig: RigId,
        unit: Unit,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// Core events re-published to the ECS.
#[derive(Event, Debug, Clone)]
pub struct DroneNotice(pub RigEvent);
