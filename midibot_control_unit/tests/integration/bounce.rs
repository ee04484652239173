//! A single held note bounces between the X bounds.

use midibot_common::axis::{Axis, AxisBounds, Direction};
use midibot_common::note::NoteId;
use midibot_control_unit::motion::MotionPlanner;

fn a4() -> NoteId {
    NoteId::new(69).unwrap()
}

#[test]
fn reference_note_reverses_at_both_bounds() {
    // Note 69 travels 10 units/s; 0.1 s per tick gives unit steps.
    let mut planner = MotionPlanner::default();
    let mut deltas = Vec::new();
    for _ in 0..16 {
        let cmd = planner.plan_notes(&[a4()], 0.1).unwrap();
        assert_eq!(cmd.deltas[1], 0.0);
        assert_eq!(cmd.deltas[2], 0.0);
        assert!((cmd.feed - 600.0).abs() < 1e-9);
        deltas.push(cmd.deltas[0].round() as i32);
    }

    let mut expected = vec![1; 5];
    expected.extend([-1; 10]);
    expected.push(1);
    assert_eq!(deltas, expected);

    let x = planner.integrator().axis(Axis::X);
    assert!((x.position() - -4.0).abs() < 1e-9);
    assert_eq!(x.direction(), Direction::Increasing);
    assert_eq!(x.reversals(), 2);
}

#[test]
fn position_follows_bounce_pattern() {
    let mut planner = MotionPlanner::default();
    let mut positions = Vec::new();
    for _ in 0..16 {
        planner.plan_notes(&[a4()], 0.1);
        positions.push(planner.integrator().axis(Axis::X).position().round() as i32);
    }
    assert_eq!(
        positions,
        vec![1, 2, 3, 4, 5, 4, 3, 2, 1, 0, -1, -2, -3, -4, -5, -4]
    );
}

#[test]
fn full_second_from_origin_with_wide_bounds() {
    let wide = AxisBounds::new(-50.0, 50.0);
    let mut planner = MotionPlanner::new([wide; 3]);
    assert_eq!(
        planner.gcode_for(69, -1, -1, 1.0),
        "G1 X10.0000000000 Y0.0000000000 Z0.0000000000 F600.0000000000"
    );
}

#[test]
fn full_second_from_origin_stays_in_default_bounds() {
    let mut planner = MotionPlanner::default();
    let line = planner.gcode_for(69, -1, -1, 1.0);
    assert!(line.ends_with("F600.0000000000"), "{line}");
    let x = planner.integrator().axis(Axis::X).position();
    assert!((x.abs() - 5.0).abs() < 1e-9, "x = {x}");
}
