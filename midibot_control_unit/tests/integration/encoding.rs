//! Encoded commands parse back to the planned values.

use midibot_common::note::NoteId;
use midibot_control_unit::gcode::{GcodeParseError, MotionCommand};
use midibot_control_unit::motion::MotionPlanner;

fn assert_close(a: &MotionCommand, b: &MotionCommand) {
    for (x, y) in a.deltas.iter().zip(&b.deltas) {
        assert!((x - y).abs() <= 1e-9, "{a:?} vs {b:?}");
    }
    assert!((a.feed - b.feed).abs() <= 1e-9, "{a:?} vs {b:?}");
}

#[test]
fn planned_commands_survive_encoding() {
    let mut planner = MotionPlanner::default();
    let chords: [&[u8]; 5] = [&[69], &[60, 64, 67], &[21, 108], &[127, 0, 64], &[33, 45, 57]];
    for _ in 0..20 {
        for chord in chords {
            let notes: Vec<NoteId> = chord.iter().map(|&v| NoteId::new(v).unwrap()).collect();
            let cmd = planner.plan_notes(&notes, 0.1).unwrap();
            let parsed: MotionCommand = cmd.encode().parse().unwrap();
            assert_close(&cmd, &parsed);
        }
    }
}

#[test]
fn rejects_non_motion_lines() {
    assert!(matches!(
        "G21 (set units to mm)".parse::<MotionCommand>(),
        Err(GcodeParseError::NotLinearMove(_))
    ));
    assert!("G1 X1.0 Y2.0 Z3.0".parse::<MotionCommand>().is_err());
}
