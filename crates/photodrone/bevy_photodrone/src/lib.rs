//! Bevy host for the PhotoDrone core.
//!
//! Each frame: roster entities are snapshotted, queued [`DroneRequest`]s
//! are applied, the registry ticks, and rig entities (a root plus two
//! cameras rendering into an image) are spawned, updated or despawned to
//! match.

use bevy::prelude::*;
use photodrone_core::{PhotoDroneConfig, RigRegistry};

pub mod components;
pub mod resources;
pub mod systems;

pub use components::{DroneCamera, DroneRig, RosterAnchor, RosterMember};
pub use resources::{
    DisplaySizeRes, DroneNotice, DroneRegistry, DroneRequest, PendingFrames, RigEntities,
    RigEntityIndex, RosterSnapshot,
};

#[derive(Default)]
pub struct PhotoDronePlugin {
    pub config: PhotoDroneConfig,
}

impl Plugin for PhotoDronePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DroneRegistry(RigRegistry::new(self.config.clone())))
            .init_resource::<RosterSnapshot>()
            .init_resource::<DisplaySizeRes>()
            .init_resource::<PendingFrames>()
            .init_resource::<RigEntityIndex>()
            .add_event::<DroneRequest>()
            .add_event::<DroneNotice>()
            .add_systems(
                Update,
                (
                    systems::collect_roster_system,
                    systems::handle_requests_system,
                    systems::tick_registry_system,
                    systems::sync_rig_entities_system,
                    systems::apply_frames_system,
                )
                    .chain(),
            );
    }
}
