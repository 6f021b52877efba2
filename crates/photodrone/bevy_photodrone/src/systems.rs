use bevy::prelude::*;
use bevy::render::camera::RenderTarget;
use bevy::render::render_resource::{
    Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
};

use crate::components::{DroneCamera, DroneRig, RosterAnchor, RosterMember};
use crate::resources::{
    DisplaySizeRes, DroneNotice, DroneRegistry, DroneRequest, PendingFrames, RigEntities,
    RigEntityIndex, RosterSnapshot,
};
use photodrone_core::{
    Anchor, CameraLayer, LiveId, Pose, RigFrame, RosterEntry, SurfaceInfo,
};

/// Half turn about +Y. The core looks down +Z, Bevy cameras down -Z.
const FLIP_Y: Quat = Quat::from_xyzw(0.0, 1.0, 0.0, 0.0);

fn pose_from_global(gt: &GlobalTransform) -> Pose {
    let (_, rotation, translation) = gt.to_scale_rotation_translation();
    Pose::new(translation, rotation * FLIP_Y)
}

fn live_id(entity: Entity) -> LiveId {
    LiveId(entity.to_bits())
}

/// Rebuild the roster snapshot from `RosterMember` / `RosterAnchor` entities.
pub fn collect_roster_system(
    members: Query<(Entity, &RosterMember, &GlobalTransform)>,
    anchors: Query<(&RosterAnchor, &GlobalTransform)>,
    mut snapshot: ResMut<RosterSnapshot>,
) {
    let roster = &mut snapshot.0;
    roster.clear();
    for (entity, member, gt) in members.iter() {
        let live = live_id(entity);
        let pose = pose_from_global(gt);
        roster.push(RosterEntry {
            username: member.username.clone(),
            is_local_viewer: member.is_local_viewer,
            live: Some(live),
        });
        roster.set_anchor(live, Anchor::Body, pose);
        if member.is_local_viewer {
            roster.set_anchor(live, Anchor::Reset, pose);
        }
    }
    // Explicit anchors override the member transform.
    for (anchor, gt) in anchors.iter() {
        roster.set_anchor(live_id(anchor.owner), anchor.kind, pose_from_global(gt));
    }
}

/// Drain `DroneRequest`s into the registry.
pub fn handle_requests_system(
    mut requests: EventReader<DroneRequest>,
    mut registry: ResMut<DroneRegistry>,
    snapshot: Res<RosterSnapshot>,
    display: Res<DisplaySizeRes>,
) {
    let registry = &mut registry.0;
    let roster = &snapshot.0;
    registry.set_display_size(display.0);

    for request in requests.read() {
        let result = match request {
            DroneRequest::Create { id, preset } => registry
                .create_from_preset_str(id.clone(), preset, roster)
                .map(|_| ()),
            DroneRequest::ApplyGroup(presets) => {
                registry.apply_preset_group(presets, roster);
                Ok(())
            }
            DroneRequest::Close(id) => {
                registry.close_rig(id);
                Ok(())
            }
            DroneRequest::CloseAll => {
                registry.shutdown_all();
                Ok(())
            }
            DroneRequest::SetTarget { rig, username } => registry.set_target(rig, username, roster),
            DroneRequest::SetFollowMode { rig, mode } => {
                registry.set_follow_mode(rig, mode).map(|_| ())
            }
            DroneRequest::SetFov { rig, fov } => registry.set_fov(rig, *fov),
            DroneRequest::SetCinematic {
                rig,
                state,
                ui_visible,
                script,
            } => registry.set_cinematic(rig, *state, *ui_visible, script.as_deref()),
            DroneRequest::RunScript { rig, script } => {
                registry.run_script(rig, script).map(|diagnostics| {
                    for diag in diagnostics {
                        debug!("rig '{rig}' script: {diag}");
                    }
                })
            }
            DroneRequest::StopScript(rig) => registry.stop_script(rig),
            DroneRequest::SetUi(visible) => {
                registry.set_ui_visible(*visible);
                Ok(())
            }
            DroneRequest::SetLocked { rig, locked } => registry.set_locked(rig, *locked),
            DroneRequest::SetRect {
                rig,
                unit,
                x,
                y,
                width,
                height,
            } => registry.set_rect(rig, *unit, *x, *y, *width, *height),
        };
        if let Err(err) = result {
            warn!("drone request {request:?} failed: {err}");
        }
    }
}

/// Tick the registry and stage its frames; events go out as `DroneNotice`.
pub fn tick_registry_system(
    time: Res<Time>,
    mut registry: ResMut<DroneRegistry>,
    snapshot: Res<RosterSnapshot>,
    mut pending: ResMut<PendingFrames>,
    mut notices: EventWriter<DroneNotice>,
) {
    let out = registry.0.update(time.delta_seconds(), &snapshot.0);
    pending.frames.clear();
    pending.frames.extend(out.frames.iter().cloned());
    notices.send_batch(out.events.iter().cloned().map(DroneNotice));
}

fn make_surface_image(surface: SurfaceInfo) -> Image {
    let size = Extent3d {
        width: surface.width,
        height: surface.height,
        depth_or_array_layers: 1,
    };
    let mut image = Image {
        texture_descriptor: TextureDescriptor {
            label: Some("photodrone_surface"),
            size,
            dimension: TextureDimension::D2,
            format: TextureFormat::Bgra8UnormSrgb,
            mip_level_count: 1,
            sample_count: 1,
            usage: TextureUsages::TEXTURE_BINDING
                | TextureUsages::COPY_DST
                | TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        },
        ..default()
    };
    image.resize(size);
    image
}

fn spawn_camera(commands: &mut Commands, layer: CameraLayer, target: Option<&Handle<Image>>) -> Entity {
    let mut camera = Camera {
        order: layer.depth() as isize,
        ..default()
    };
    // The primary layer draws over the background in the same target.
    if layer == CameraLayer::Primary {
        camera.clear_color = ClearColorConfig::None;
    }
    if let Some(handle) = target {
        camera.target = RenderTarget::Image(handle.clone());
    }
    commands
        .spawn((
            Camera3dBundle {
                camera,
                ..default()
            },
            DroneCamera { layer },
        ))
        .id()
}

/// Spawn entities for new rigs, recreate render images on surface changes
/// and despawn rigs the core has destroyed.
pub fn sync_rig_entities_system(
    mut commands: Commands,
    pending: Res<PendingFrames>,
    mut index: ResMut<RigEntityIndex>,
    mut images: Option<ResMut<Assets<Image>>>,
    mut cameras: Query<&mut Camera, With<DroneCamera>>,
) {
    for frame in &pending.frames {
        if let Some(entities) = index.map.get_mut(&frame.rig) {
            if entities.surface_generation == frame.surface.generation {
                continue;
            }
            entities.surface_generation = frame.surface.generation;
            let Some(images) = images.as_deref_mut() else {
                continue;
            };
            if let Some(old) = entities.image.take() {
                images.remove(&old);
            }
            let handle = images.add(make_surface_image(frame.surface));
            for cam in entities.cameras {
                if let Ok(mut camera) = cameras.get_mut(cam) {
                    camera.target = RenderTarget::Image(handle.clone());
                }
            }
            entities.image = Some(handle);
            continue;
        }

        let image = images
            .as_deref_mut()
            .map(|images| images.add(make_surface_image(frame.surface)));
        let background = spawn_camera(&mut commands, CameraLayer::Background, image.as_ref());
        let primary = spawn_camera(&mut commands, CameraLayer::Primary, image.as_ref());
        let root = commands
            .spawn((
                SpatialBundle::default(),
                DroneRig {
                    id: frame.rig.clone(),
                },
                Name::new(format!("PhotoDrone {}", frame.rig)),
            ))
            .add_child(background)
            .add_child(primary)
            .id();
        debug!("spawned rig '{}' as {root:?}", frame.rig);
        index.map.insert(
            frame.rig.clone(),
            RigEntities {
                root,
                cameras: [background, primary],
                surface_generation: frame.surface.generation,
                image,
            },
        );
    }

    let live: Vec<_> = pending.frames.iter().map(|f| &f.rig).collect();
    let gone: Vec<_> = index
        .map
        .keys()
        .filter(|id| !live.contains(id))
        .cloned()
        .collect();
    for id in gone {
        if let Some(entities) = index.map.remove(&id) {
            commands.entity(entities.root).despawn_recursive();
            if let (Some(images), Some(handle)) = (images.as_deref_mut(), entities.image) {
                images.remove(&handle);
            }
            debug!("despawned rig '{id}'");
        }
    }
}

fn apply_camera(frame: &RigFrame, camera: &mut Camera, projection: &mut Projection) {
    camera.is_active = frame.cameras_enabled;
    if frame.orthographic {
        if !matches!(projection, Projection::Orthographic(_)) {
            *projection = Projection::Orthographic(OrthographicProjection::default());
        }
    } else {
        let fov = frame.fov.to_radians();
        match projection {
            Projection::Perspective(p) => p.fov = fov,
            _ => {
                *projection = Projection::Perspective(PerspectiveProjection {
                    fov,
                    ..default()
                })
            }
        }
    }
}

/// Copy staged frames onto rig transforms and cameras.
pub fn apply_frames_system(
    pending: Res<PendingFrames>,
    index: Res<RigEntityIndex>,
    mut roots: Query<&mut Transform, With<DroneRig>>,
    mut cameras: Query<(&mut Camera, &mut Projection), With<DroneCamera>>,
) {
    for frame in &pending.frames {
        let Some(entities) = index.map.get(&frame.rig) else {
            continue;
        };
        if let Ok(mut tf) = roots.get_mut(entities.root) {
            tf.translation = Vec3::from_array(frame.position);
            tf.rotation = Quat::from_array(frame.rotation) * FLIP_Y;
        }
        for cam in entities.cameras {
            if let Ok((mut camera, mut projection)) = cameras.get_mut(cam) {
                apply_camera(frame, &mut camera, &mut projection);
            }
        }
    }
}
