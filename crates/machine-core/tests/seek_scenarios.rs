use machine_core::{
    Component, FrameEvent, MachineEvent, MachineSystem, PartId, PartKind, PartState, Point, Song,
};
use std::f64::consts::FRAC_PI_2;

const BOX: PartId = PartId(0);
const FIGURE: PartId = PartId(1);
const CRANK: PartId = PartId(2);
const SHAFT: PartId = PartId(3);
const SMALL_PULLEY: PartId = PartId(4);
const LARGE_PULLEY: PartId = PartId(5);
const CAM_SHAFT: PartId = PartId(6);
const CAM: PartId = PartId(7);

fn rotation(system: &MachineSystem, id: PartId) -> f64 {
    system
        .machine()
        .part(id)
        .and_then(|p| p.rotation())
        .unwrap_or(f64::NAN)
}

fn triggers(events: &[FrameEvent]) -> Vec<(u32, PartId)> {
    events
        .iter()
        .filter_map(|e| match e.event {
            MachineEvent::Triggered { target, .. } => Some((e.frame, target)),
            _ => None,
        })
        .collect()
}

#[test]
fn machine_one_at_four_seconds() {
    let mut system = MachineSystem::new();
    system.request_frame(0);

    assert_eq!(system.request_frame(120), 4.0);
    assert_eq!(rotation(&system, CRANK), 1.0);
    assert_eq!(rotation(&system, SHAFT), 1.0);
    assert_eq!(rotation(&system, SMALL_PULLEY), 1.0);
    assert_eq!(rotation(&system, LARGE_PULLEY), 0.25);
    assert_eq!(rotation(&system, CAM_SHAFT), 0.25);
    assert_eq!(rotation(&system, CAM), 0.25);

    // A quarter turn keeps the hole away from the key.
    assert!(triggers(&system.drain_events()).is_empty());
    let snapshot = system.snapshot();
    assert!(matches!(
        snapshot.parts[BOX.0].state,
        PartState::LidBox { open: false, .. }
    ));
    assert!(matches!(
        snapshot.parts[CAM.0].state,
        PartState::Cam { keyed: false, .. }
    ));
}

#[test]
fn overshoot_then_back_matches_direct_seek() {
    let mut direct = MachineSystem::new();
    direct.request_frame(120);

    let mut overshoot = MachineSystem::new();
    overshoot.request_frame(200);
    overshoot.request_frame(120);

    assert_eq!(direct.snapshot(), overshoot.snapshot());
    assert_eq!(direct.machine_time(), overshoot.machine_time());
    assert_eq!(overshoot.stats().rewinds, 1);
}

#[test]
fn cam_fires_once_per_crossing() {
    let mut system = MachineSystem::new();
    system.request_frame(300);

    let fired = triggers(&system.drain_events());
    assert_eq!(fired.len(), 2, "one open per subscriber: {fired:?}");
    let frame = fired[0].0;
    assert!((220..=240).contains(&frame), "first trigger at frame {frame}");
    assert_eq!(fired, vec![(frame, BOX), (frame, FIGURE)]);
    assert_eq!(system.stats().triggers, 2);
}

#[test]
fn box_and_figure_finish_opening() {
    let mut system = MachineSystem::new();
    system.request_frame(260);

    let machine = system.machine();
    let state = |id: PartId| machine.part(id).map(|p| p.state());
    match state(BOX) {
        Some(PartState::LidBox {
            open,
            lid_angle,
            lid_scale,
        }) => {
            assert!(open);
            assert_eq!(lid_angle, FRAC_PI_2);
            assert!((lid_scale - 1.0).abs() < 1e-12);
        }
        other => panic!("unexpected box state {other:?}"),
    }
    match state(FIGURE) {
        Some(PartState::Figure {
            open,
            spring_length,
        }) => {
            assert!(open);
            assert_eq!(spring_length, 39.0 * 6.0);
        }
        other => panic!("unexpected figure state {other:?}"),
    }
}

#[test]
fn rewind_replays_triggers() {
    let mut system = MachineSystem::new();
    system.request_frame(300);
    let first = triggers(&system.drain_events());

    system.request_frame(0);
    let snapshot = system.snapshot();
    assert!(matches!(
        snapshot.parts[BOX.0].state,
        PartState::LidBox { open: false, .. }
    ));

    system.request_frame(300);
    assert_eq!(triggers(&system.drain_events()), first);
}

#[test]
fn music_box_plays_every_note_each_pass() {
    let mut system = MachineSystem::new();
    system.choose_machine(2);
    system.request_frame(0);

    let song_len = Song::builtin().len();
    let played = |events: Vec<FrameEvent>| -> Vec<usize> {
        events
            .into_iter()
            .filter_map(|e| match e.event {
                MachineEvent::Note { index, .. } => Some(index),
                _ => None,
            })
            .collect()
    };

    // Drum turns 3 beats per second at the default crank speed.
    system.request_frame(600);
    let first = played(system.drain_events());
    assert_eq!(first, (0..song_len).collect::<Vec<_>>());

    system.request_frame(300);
    system.request_frame(600);
    let second = played(system.drain_events());
    assert_eq!(second, first);
}

#[test]
fn selection_keeps_frame_counter() {
    let mut system = MachineSystem::new();
    system.request_frame(90);
    system.choose_machine(2);

    assert_eq!(system.frame(), 90);
    assert_eq!(system.machine_time(), 3.0);
    assert_eq!(system.machine_number(), 2);
    assert_eq!(system.machine().parts()[6].kind(), PartKind::MusicBox);

    // Fresh parts start at rest until the next seek.
    assert_eq!(rotation(&system, PartId(3)), 0.0);

    system.request_frame(0);
    assert_eq!(system.frame(), 0);
}

#[test]
fn unknown_machine_reports_raw_number() {
    let mut system = MachineSystem::new();
    system.set_location(Point::new(-40, 60));
    system.choose_machine(42);
    assert_eq!(system.machine_number(), 42);
    assert_eq!(system.machine().len(), 8);
    assert_eq!(system.machine().origin(), Point::new(-40, 60));
}
