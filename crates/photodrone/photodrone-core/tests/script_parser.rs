use bevy_math::Vec3;
use photodrone_core::follow::FollowMode;
use photodrone_core::script::{
    parse, parse_report, DiagnosticKind, FollowOverride, FovChange, LookAt, Motion, Projection,
    Space,
};
use photodrone_test_fixtures::scripts;

#[test]
fn each_time_emits_exactly_the_accumulated_fields() {
    let script = parse("setposition 1 2 3\nfov 40\ntime 2\nrotate 0 90 0\ntime 1\n");
    assert_eq!(script.len(), 2);

    let first = &script.keyframes[0];
    assert_eq!(first.position, Motion::absolute(Vec3::new(1.0, 2.0, 3.0)));
    assert_eq!(first.rotation, Motion::default());
    assert_eq!(
        first.fov,
        Some(FovChange {
            value: 40.0,
            immediate: false
        })
    );
    assert_eq!(first.duration, 2.0);

    // Everything resets after `time`.
    let second = &script.keyframes[1];
    assert_eq!(second.position, Motion::default());
    assert_eq!(second.rotation, Motion::relative(Vec3::new(0.0, 90.0, 0.0)));
    assert_eq!(second.fov, None);
    assert_eq!(second.look_at, LookAt::None);
    assert_eq!(second.space, Space::World);
    assert!(!script.looping);
}

#[test]
fn position_and_rotation_keep_separate_absolute_flags() {
    let script = parse("setrotation 10 0 0\nmove 0 1 0\ntime 1\n");
    let kf = &script.keyframes[0];
    assert!(kf.rotation.absolute);
    assert!(!kf.position.absolute);
}

#[test]
fn malformed_lines_degrade_and_are_reported() {
    let text = scripts::text("malformed").expect("fixture");
    let report = parse_report(&text);

    assert_eq!(report.script.len(), 1);
    let kf = &report.script.keyframes[0];
    assert_eq!(kf.position, Motion::relative(Vec3::new(1.0, 0.0, 3.0)));
    assert_eq!(
        kf.fov,
        Some(FovChange {
            value: 0.0,
            immediate: false
        })
    );
    assert_eq!(
        kf.follow,
        Some(FollowOverride {
            mode: FollowMode::Smooth
        })
    );
    assert_eq!(
        kf.look_at,
        LookAt::Point {
            target: Vec3::ZERO,
            smooth: false
        }
    );

    let kinds: Vec<(usize, DiagnosticKind)> = report
        .diagnostics
        .iter()
        .map(|d| (d.line, d.kind.clone()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (1, DiagnosticKind::InvalidNumber("two".into())),
            (2, DiagnosticKind::UnknownCommand("wobble".into())),
            (
                3,
                DiagnosticKind::MissingArguments {
                    command: "fov".into(),
                    expected: 1,
                    found: 0
                }
            ),
            (4, DiagnosticKind::UnknownMode("orbit".into())),
            (
                5,
                DiagnosticKind::MissingArguments {
                    command: "lookatplayer".into(),
                    expected: 1,
                    found: 0
                }
            ),
            (7, DiagnosticKind::UnterminatedKeyframe),
        ]
    );
}

#[test]
fn missing_vector_components_read_as_zero() {
    let report = parse_report("move 4\ntime 1\n");
    assert_eq!(
        report.script.keyframes[0].position.value,
        Vec3::new(4.0, 0.0, 0.0)
    );
    assert!(matches!(
        report.diagnostics[0].kind,
        DiagnosticKind::MissingArguments {
            expected: 3,
            found: 1,
            ..
        }
    ));
}

#[test]
fn player_names_keep_inner_spaces() {
    let script = parse("smoothlookatplayer   Racer  One  \ntime 1\n");
    assert_eq!(
        script.keyframes[0].look_at,
        LookAt::Player {
            name: "Racer  One".into(),
            smooth: true
        }
    );
}

#[test]
fn last_look_at_directive_wins() {
    let script = parse("lookatplayer Racer One\nlookat 0 0 -50\ntime 2\n");
    assert_eq!(
        script.keyframes[0].look_at,
        LookAt::Point {
            target: Vec3::new(0.0, 0.0, -50.0),
            smooth: false
        }
    );

    let script = parse("lookat 0 0 -50\nsmoothlookatplayer Racer One\ntime 2\n");
    assert_eq!(
        script.keyframes[0].look_at,
        LookAt::Player {
            name: "Racer One".into(),
            smooth: true
        }
    );
}

#[test]
fn directive_commands_set_their_fields() {
    let script = parse(
        "loop\nsetfov 20\northo\nlmove 1 0 0\ntime 1\n\
         persp\nlookat 1 2 3\nclearlookat\ntime 0\n\
         smoothlookat 0 0 5\ntime 2\n",
    );
    assert!(script.looping);
    assert_eq!(script.len(), 3);

    let a = &script.keyframes[0];
    assert_eq!(
        a.fov,
        Some(FovChange {
            value: 20.0,
            immediate: true
        })
    );
    assert_eq!(a.projection, Some(Projection::Orthographic));
    assert_eq!(a.space, Space::Local);
    assert!(!a.position.absolute);

    let b = &script.keyframes[1];
    assert_eq!(b.projection, Some(Projection::Perspective));
    assert_eq!(b.look_at, LookAt::None);

    let c = &script.keyframes[2];
    assert!(c.look_at.is_smooth());
    assert_eq!(c.projection, None);
}

#[test]
fn followmode_marks_keyframe_non_cinematic() {
    let script = parse("followmode Strict\ntime 1\n");
    let kf = &script.keyframes[0];
    assert!(!kf.is_cinematic());
    assert_eq!(kf.follow.map(|f| f.mode), Some(FollowMode::Strict));
}

#[test]
fn blank_lines_and_crlf_are_tolerated() {
    let script = parse("\r\n  move 0 0 1  \r\n\r\n\ttime 1\r\n");
    assert_eq!(script.len(), 1);
    assert_eq!(script.keyframes[0].position.value, Vec3::Z);
}

#[test]
fn every_fixture_script_parses() {
    for key in scripts::keys() {
        let text = scripts::text(&key).expect("fixture");
        let script = parse(&text);
        assert!(!script.is_empty(), "fixture {key} produced no keyframes");
    }
    let establishing = parse(&scripts::text("establishing").expect("fixture"));
    assert_eq!(establishing.len(), 3);
    assert_eq!(establishing.total_duration(), 6.0);
}
