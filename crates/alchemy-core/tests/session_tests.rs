// End-to-end: poses in, composed fluid out, through the fixed-rate session loop.

use alchemy_core::field::FieldConfig;
use alchemy_core::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const FRAME: Duration = Duration::from_millis(40);

fn session() -> (PoseWriter, AlchemySession) {
    let (writer, reader) = pose_cell();
    let composer = Arc::new(RecipeBook::builtin().unwrap());
    let config = SessionConfig {
        field: FieldConfig {
            count: 200,
            ..FieldConfig::default()
        },
        ..SessionConfig::default()
    };
    (writer, AlchemySession::new(reader, composer, config))
}

fn frame(writer: &mut PoseWriter, s: &mut AlchemySession, pose: HandPose) -> Vec<SessionEvent> {
    writer.publish(pose);
    s.advance(FRAME)
}

/// Hover fire, grab it, carry it to the cauldron and let go.
fn drop_fire_in_cauldron(writer: &mut PoseWriter, s: &mut AlchemySession) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    for pose in [
        HandPose::at(0.1, 0.3, 0.0),
        HandPose::at(0.1, 0.3, 0.9),
        HandPose::at(0.3, 0.4, 0.9),
        HandPose::at(0.5, 0.5, 0.9),
        HandPose::at(0.5, 0.5, 0.2),
    ] {
        events.extend(frame(writer, s, pose));
    }
    events
}

fn run_until(
    writer: &mut PoseWriter,
    s: &mut AlchemySession,
    what: &str,
    done: impl Fn(&AlchemySession) -> bool,
) -> Vec<SessionEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while !done(s) {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        events.extend(frame(writer, s, HandPose::at(0.9, 0.9, 0.0)));
        thread::sleep(Duration::from_millis(1));
    }
    events
}

#[test]
fn drop_in_cauldron_composes_a_new_fluid() {
    let (mut writer, mut s) = session();
    let events = drop_fire_in_cauldron(&mut writer, &mut s);

    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::Interaction(InteractionEffect::MixRequested(id)) if id.0 == "fire"
    )));
    assert_eq!(s.mixer().requests_issued(), 1);
    assert!(s.mixer().is_mixing());

    let events = run_until(&mut writer, &mut s, "composed fluid", |s| {
        s.fluid().name == "Boiling Water"
    });
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::Mix(MixEvent::Composed(_)))));
    assert!(s.field().reaction() > 0.0);

    run_until(&mut writer, &mut s, "reaction to settle", |s| {
        !s.mixer().is_mixing()
    });
    assert_eq!(s.mixer().reaction(), 0.0);
}

#[test]
fn drop_outside_cauldron_does_not_mix() {
    let (mut writer, mut s) = session();
    for pose in [
        HandPose::at(0.1, 0.3, 0.9),
        HandPose::at(0.9, 0.9, 0.9),
        HandPose::at(0.9, 0.9, 0.2),
    ] {
        frame(&mut writer, &mut s, pose);
    }
    assert_eq!(s.machine().state(), InteractionState::Idle);
    assert_eq!(s.mixer().requests_issued(), 0);
    assert_eq!(s.mixer().reaction(), 0.0);
    assert_eq!(s.fluid().name, "Pure Water");
}

#[test]
fn second_drop_during_a_mix_is_ignored() {
    let (mut writer, mut s) = session();
    drop_fire_in_cauldron(&mut writer, &mut s);
    assert!(s.mixer().is_mixing());
    drop_fire_in_cauldron(&mut writer, &mut s);
    assert_eq!(s.mixer().requests_issued(), 1);
}

#[test]
fn lost_hand_mid_drag_keeps_the_element() {
    let (mut writer, mut s) = session();
    frame(&mut writer, &mut s, HandPose::at(0.1, 0.6, 1.0));
    assert_eq!(s.machine().held().map(|e| e.name), Some("Terra"));

    let events = frame(&mut writer, &mut s, HandPose::inactive());
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::Interaction(InteractionEffect::DetectionLost)
    )));
    for _ in 0..20 {
        frame(&mut writer, &mut s, HandPose::inactive());
    }
    assert_eq!(s.machine().held().map(|e| e.name), Some("Terra"));
    assert!(!s.field().hand().active);
}
