use bevy_math::Vec3;
use photodrone_core::roster::RosterRecord;
use photodrone_core::{
    DestroyReason, DroneError, FollowMode, PhotoDroneConfig, PlaybackStatus, RigControl, RigEvent,
    RigId, RigRegistry, RigSpawn, Roster, SnapshotRoster,
};
use photodrone_test_fixtures::rosters;

fn roster(name: &str) -> SnapshotRoster {
    let records: Vec<RosterRecord> = rosters::load(name).expect("roster fixture");
    SnapshotRoster::from_records(records)
}

fn registry() -> RigRegistry {
    RigRegistry::new(PhotoDroneConfig::default())
}

fn rig_events(events: &[RigEvent], id: &RigId) -> Vec<RigEvent> {
    events.iter().filter(|e| e.rig() == id).cloned().collect()
}

#[test]
fn create_rejects_bad_requests() {
    let grid = roster("race_grid");
    let mut reg = registry();

    assert_eq!(
        reg.create_rig("  ", RigSpawn::Follow, &grid),
        Err(DroneError::EmptyRigId)
    );
    reg.create_rig("cam", RigSpawn::Follow, &grid).unwrap();
    assert_eq!(
        reg.create_rig("cam", RigSpawn::Cinematic, &grid),
        Err(DroneError::DuplicateRig(RigId::from("cam")))
    );
    assert_eq!(
        reg.create_rig("other", RigSpawn::Cinematic, &roster("lobby_empty")),
        Err(DroneError::EmptyRoster)
    );

    // Only an entry that is still loading: nothing can be bound.
    let mut loading = grid.clone();
    loading.remove("Viewer");
    loading.remove("Racer One");
    assert_eq!(
        reg.create_rig("late", RigSpawn::Follow, &loading),
        Err(DroneError::NoValidTarget(RigId::from("late")))
    );
    assert!(!reg.contains(&RigId::from("late")));
    assert_eq!(reg.len(), 1);
}

#[test]
fn unknown_rig_ids_are_reported() {
    let grid = roster("race_grid");
    let mut reg = registry();
    let ghost = RigId::from("ghost");
    assert_eq!(
        reg.set_fov(&ghost, 40.0),
        Err(DroneError::RigNotFound(ghost.clone()))
    );
    assert!(reg.set_target(&ghost, "Viewer", &grid).is_err());
    assert!(reg.run_script(&ghost, "time 1").is_err());
    assert!(!reg.close_rig(&ghost));
}

#[test]
fn generated_ids_are_distinct() {
    let grid = roster("race_grid");
    let mut reg = registry();
    let a = reg.create_rig_generated(RigSpawn::Follow, &grid).unwrap();
    let b = reg.create_rig_generated(RigSpawn::Follow, &grid).unwrap();
    assert_ne!(a, b);
    assert_eq!(reg.ids().cloned().collect::<Vec<_>>(), vec![a, b]);
}

#[test]
fn follow_mode_and_fov_requests() {
    let grid = roster("race_grid");
    let mut reg = registry();
    let id = reg.create_rig("cam", RigSpawn::Follow, &grid).unwrap();

    assert_eq!(reg.set_follow_mode(&id, "FIRST").unwrap(), FollowMode::First);
    assert_eq!(reg.get(&id).unwrap().cameras().fov(), 90.0);

    assert_eq!(reg.set_follow_mode(&id, "orbit").unwrap(), FollowMode::Smooth);
    assert_eq!(reg.get(&id).unwrap().cameras().fov(), 60.0);

    reg.set_fov(&id, 500.0).unwrap();
    assert_eq!(reg.get(&id).unwrap().cameras().fov(), 135.0);

    let out = reg.update(0.016, &grid);
    let changes: Vec<_> = out
        .events
        .iter()
        .filter_map(|e| match e {
            RigEvent::FollowModeChanged { mode, .. } => Some(*mode),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![FollowMode::First, FollowMode::Smooth]);
}

#[test]
fn set_target_switches_or_reports() {
    let grid = roster("race_grid");
    let mut reg = registry();
    let id = reg.create_rig("cam", RigSpawn::Follow, &grid).unwrap();
    assert_eq!(reg.get(&id).unwrap().target_name(), Some("Viewer"));

    assert_eq!(
        reg.set_target(&id, "Nobody", &grid),
        Err(DroneError::UnknownPlayer("Nobody".into()))
    );
    assert_eq!(
        reg.set_target(&id, "loading larry", &grid),
        Err(DroneError::NoValidTarget(id.clone()))
    );
    // Failed requests leave the rig on its old target.
    assert_eq!(reg.get(&id).unwrap().target_name(), Some("Viewer"));

    reg.set_target(&id, "racer one", &grid).unwrap();
    let rig = reg.get(&id).unwrap();
    assert_eq!(rig.target_name(), Some("Racer One"));
    assert!(rig.display().telemetry);
    assert_eq!(rig.display().label, "Racer One");
}

#[test]
fn followmode_keyframe_hands_a_cinematic_rig_to_follow() {
    let grid = roster("race_grid");
    let mut reg = registry();
    let id = reg.create_rig("cine", RigSpawn::Cinematic, &grid).unwrap();
    let diagnostics = reg.run_script(&id, "followmode Strict\ntime 1\n").unwrap();
    assert!(diagnostics.is_empty());
    assert!(!reg.get(&id).unwrap().display().name_label);

    let out = reg.update(0.5, &grid);
    let events = rig_events(&out.events, &id);
    assert!(events.contains(&RigEvent::KeyframeStarted {
        rig: id.clone(),
        index: 0
    }));
    assert!(events.contains(&RigEvent::FollowModeChanged {
        rig: id.clone(),
        mode: FollowMode::Strict
    }));
    assert!(events.contains(&RigEvent::TargetBound {
        rig: id.clone(),
        username: "Viewer".into()
    }));
    let display = reg.get(&id).unwrap().display();
    assert!(display.name_label);
    assert_eq!(display.label, "Viewer");
    // Telemetry stays off while the local viewer is the target.
    assert!(!display.telemetry);

    let out = reg.update(0.6, &grid);
    assert!(out.events.contains(&RigEvent::PlaybackFinished { rig: id.clone() }));

    let rig = reg.get(&id).unwrap();
    assert_eq!(rig.playback().status(), PlaybackStatus::Finished);
    assert_eq!(rig.control(), RigControl::Follow);
    assert_eq!(rig.follow_mode(), FollowMode::Strict);
    assert!(rig.target().is_bound());
}

#[test]
fn followmode_keyframe_shows_telemetry_for_a_remote_target() {
    let records: Vec<RosterRecord> = rosters::load("race_grid").expect("roster fixture");
    let racers = SnapshotRoster::from_records(records.into_iter().filter(|r| !r.local).collect());
    let mut reg = registry();
    let id = reg.create_rig("cine", RigSpawn::Cinematic, &racers).unwrap();
    reg.run_script(&id, "followmode strict\ntime 1\n").unwrap();
    {
        let display = reg.get(&id).unwrap().display();
        assert!(!display.name_label);
        assert!(!display.telemetry);
    }

    reg.update(0.5, &racers);
    let rig = reg.get(&id).unwrap();
    assert_eq!(rig.target_name(), Some("Racer One"));
    assert!(rig.display().name_label);
    assert!(rig.display().telemetry);
}

#[test]
fn leaving_cinematic_binds_on_the_next_update() {
    let grid = roster("race_grid");
    let mut reg = registry();
    let id = reg.create_rig("cine", RigSpawn::Cinematic, &grid).unwrap();
    reg.set_cinematic(&id, true, false, Some("setposition 0 5 -10\ntime 0\n"))
        .unwrap();
    let out = reg.update(0.1, &grid);
    assert_eq!(out.frame(&id).unwrap().position, [0.0, 5.0, -10.0]);

    reg.set_cinematic(&id, false, true, None).unwrap();
    reg.update(0.1, &grid);
    let rig = reg.get(&id).unwrap();
    assert!(!rig.is_cinematic());
    assert_eq!(rig.target_name(), Some("Viewer"));
    assert!(rig.display().window_visible);
}

#[test]
fn stop_script_freezes_the_pose() {
    let grid = roster("race_grid");
    let mut reg = registry();
    let id = reg.create_rig("cine", RigSpawn::Cinematic, &grid).unwrap();
    reg.run_script(&id, "move 0 0 10\ntime 2\n").unwrap();
    reg.update(1.0, &grid);
    reg.stop_script(&id).unwrap();
    let out = reg.update(1.0, &grid);
    assert_eq!(out.frame(&id).unwrap().position, [0.0, 0.0, 5.0]);
    assert_eq!(reg.get(&id).unwrap().playback().status(), PlaybackStatus::Idle);
}

#[test]
fn resize_keeps_target_and_mode() {
    let grid = roster("race_grid");
    let mut reg = registry();
    let id = reg
        .create_from_preset_str("cam", "locked;Racer One;px;0;0;320;240", &grid)
        .unwrap();
    reg.update(0.016, &grid);

    assert!(reg.resize_surface(&id, 1280, 720).unwrap());
    assert!(!reg.resize_surface(&id, 1280, 720).unwrap());

    let out = reg.update(0.016, &grid);
    let frame = out.frame(&id).unwrap();
    assert_eq!(
        (frame.surface.width, frame.surface.height, frame.surface.generation),
        (1280, 720, 1)
    );
    assert!(frame.cameras_enabled);
    assert!(out.events.contains(&RigEvent::SurfaceResized {
        rig: id.clone(),
        width: 1280,
        height: 720
    }));

    let rig = reg.get(&id).unwrap();
    assert_eq!(rig.target_name(), Some("Racer One"));
    assert_eq!(rig.follow_mode(), FollowMode::Locked);
    assert_eq!(rig.cameras().surface_generation(), 1);
}

#[test]
fn ui_visibility_skips_cinematic_rigs() {
    let grid = roster("race_grid");
    let mut reg = registry();
    let follow = reg.create_rig("follow", RigSpawn::Follow, &grid).unwrap();
    let cine = reg.create_rig("cine", RigSpawn::Cinematic, &grid).unwrap();

    assert_eq!(reg.set_ui_visible(false), 1);
    assert!(!reg.get(&follow).unwrap().display().window_visible);
    assert_eq!(reg.set_ui_visible(true), 1);
    assert!(reg.get(&follow).unwrap().display().window_visible);
    assert!(!reg.get(&cine).unwrap().display().window_visible);
    assert_eq!(reg.set_rig_ui_visible(&cine, true), Ok(false));

    reg.set_locked(&follow, true).unwrap();
    assert!(reg.get(&follow).unwrap().display().locked);
}

#[test]
fn distance_and_names_come_from_the_roster() {
    let grid = roster("race_grid");
    let mut reg = registry();
    let id = reg.create_rig("cine", RigSpawn::Cinematic, &grid).unwrap();

    let to_racer = reg.distance_to(&id, "Racer One", &grid).unwrap();
    assert!((to_racer - Vec3::new(10.0, 0.0, 20.0).length()).abs() < 1e-4);
    assert_eq!(reg.distance_to(&id, "viewer", &grid), Some(5.0));
    assert_eq!(reg.distance_to(&id, "Loading Larry", &grid), None);
    assert_eq!(reg.distance_to(&RigId::from("x"), "Viewer", &grid), None);

    assert_eq!(reg.player_names(&grid), grid.usernames());
    assert_eq!(reg.player_names(&grid).len(), 3);
}

#[test]
fn events_arrive_with_the_next_update() {
    let grid = roster("race_grid");
    let mut reg = registry();
    let id = reg.create_rig("cam", RigSpawn::Follow, &grid).unwrap();

    let out = reg.update(0.016, &grid);
    assert_eq!(
        rig_events(&out.events, &id),
        vec![
            RigEvent::Created {
                rig: id.clone(),
                cinematic: false
            },
            RigEvent::TargetBound {
                rig: id.clone(),
                username: "Viewer".into()
            },
        ]
    );
    assert_eq!(out.frames.len(), 1);

    let out = reg.update(0.016, &grid);
    assert!(out.events.is_empty());
}

#[test]
fn shutdown_destroys_every_rig_once() {
    let grid = roster("race_grid");
    let mut reg = registry();
    reg.create_rig("a", RigSpawn::Follow, &grid).unwrap();
    reg.create_rig("b", RigSpawn::Cinematic, &grid).unwrap();
    reg.update(0.016, &grid);

    reg.shutdown_all();
    reg.shutdown_all();
    assert!(reg.is_empty());

    let out = reg.update(0.016, &grid);
    let reasons: Vec<_> = out
        .events
        .iter()
        .filter_map(|e| match e {
            RigEvent::Destroyed { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect();
    assert_eq!(reasons, vec![DestroyReason::Shutdown, DestroyReason::Shutdown]);
    assert!(out.frames.is_empty());
}

#[test]
fn custom_config_shortens_recovery() {
    let cfg = PhotoDroneConfig::from_json_str(r#"{ "recovery": { "timeout": 0.5 } }"#).unwrap();
    let mut reg = RigRegistry::new(cfg);
    let grid = roster("race_grid");
    let id = reg
        .create_from_preset_str("cam", "smooth;Racer One;px;0;0;320;240", &grid)
        .unwrap();

    let mut without_racer = grid.clone();
    without_racer.remove("Racer One");
    reg.update(0.1, &without_racer);
    for _ in 0..4 {
        reg.update(0.1, &without_racer);
        assert!(reg.contains(&id));
    }
    reg.update(0.1, &without_racer);
    assert!(!reg.contains(&id));
}
