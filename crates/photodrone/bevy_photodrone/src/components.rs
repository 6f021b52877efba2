use bevy::prelude::*;
use photodrone_core::{Anchor, CameraLayer, RigId};

/// A live entity that rigs can follow or look at. Its own transform is the
/// body anchor; the local viewer's transform doubles as its reset anchor.
#[derive(Component, Debug, Clone)]
pub struct RosterMember {
    pub username: String,
    pub is_local_viewer: bool,
}

/// Extra anchor transform (e.g. a head bone) belonging to a roster member.
#[derive(Component, Debug, Clone, Copy)]
pub struct RosterAnchor {
    pub owner: Entity,
    pub kind: Anchor,
}

/// Root entity of a spawned rig.
#[derive(Component, Debug, Clone)]
pub struct DroneRig {
    pub id: RigId,
}

/// One of the two cameras under a rig root.
#[derive(Component, Debug, Clone, Copy)]
pub struct DroneCamera {
    pub layer: CameraLayer,
}
