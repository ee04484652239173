//! Property tests for the registry and the integrator.

use std::time::Duration;

use midibot_common::axis::{Axis, AxisBounds};
use midibot_common::note::NoteId;
use midibot_control_unit::integrator::PositionIntegrator;
use midibot_control_unit::motion::MotionPlanner;
use midibot_control_unit::registry::NoteRegistry;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    On(u8),
    Off(u8),
    Tick,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (40u8..52).prop_map(Op::On),
        (40u8..52).prop_map(Op::Off),
        Just(Op::Tick),
    ]
}

proptest! {
    #[test]
    fn registry_stays_bounded_and_unique(
        capacity in 1usize..6,
        threshold in 1u32..8,
        ops in prop::collection::vec(op(), 0..200),
    ) {
        let registry = NoteRegistry::new(capacity, threshold, Duration::from_millis(20));
        for op in ops {
            match op {
                Op::On(v) => { registry.note_on(NoteId::new(v).unwrap()); }
                Op::Off(v) => { registry.note_off(NoteId::new(v).unwrap()); }
                Op::Tick => {
                    let report = registry.snapshot_and_age().unwrap();
                    prop_assert!(report.survivors.len() <= capacity);
                    for note in &report.evicted {
                        prop_assert!(!report.survivors.contains(note));
                    }
                }
            }
            let active = registry.active();
            prop_assert!(active.len() <= capacity);
            for (i, a) in active.iter().enumerate() {
                prop_assert!(!active[i + 1..].contains(a));
                prop_assert!(registry.miss_count(*a).unwrap() <= threshold);
            }
        }
    }

    #[test]
    fn positions_never_leave_bounds(
        steps in prop::collection::vec(prop::array::uniform3(0.0f64..30.0), 1..300),
    ) {
        let bounds = [AxisBounds::X_DEFAULT, AxisBounds::Y_DEFAULT, AxisBounds::Z_DEFAULT];
        let mut integrator = PositionIntegrator::new(bounds);
        for magnitudes in steps {
            let before = integrator.positions();
            let deltas = integrator.advance(magnitudes);
            let after = integrator.positions();
            for axis in Axis::ALL {
                let i = axis.index();
                prop_assert!(bounds[i].contains(after[i]), "{axis}: {}", after[i]);
                prop_assert!((after[i] - before[i] - deltas[i]).abs() < 1e-9);
                prop_assert!(deltas[i].abs() <= magnitudes[i] + 1e-12);
            }
        }
    }

    #[test]
    fn feed_is_never_negative(notes in prop::collection::vec(0u8..=127, 1..4), length in 0.01f64..2.0) {
        let mut planner = MotionPlanner::default();
        let notes: Vec<NoteId> = notes.into_iter().map(|v| NoteId::new(v).unwrap()).collect();
        let cmd = planner.plan_notes(&notes, length).unwrap();
        prop_assert!(cmd.feed >= 0.0);
        prop_assert!(cmd.feed.is_finite());
    }
}
