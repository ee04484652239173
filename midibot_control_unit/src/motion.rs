//! Notes → motion command pipeline for one tick.
//!
//! Up to three notes fill the X, Y and Z slots in order. Each slot's pitch
//! gives a per-second distance; the feed rate is the vector length of the
//! three per-minute feeds, taken from the unsigned magnitudes before the
//! integrator chooses directions. The distances scaled by the play length
//! are then handed to the integrator, whose signed deltas form the command.

use midibot_common::axis::AxisBounds;
use midibot_common::consts::AXIS_COUNT;
use midibot_common::note::NoteId;

use crate::gcode::MotionCommand;
use crate::integrator::PositionIntegrator;
use crate::pitch::{feed_rate_for, slot_distances};

/// Stateful planner owning the axis positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionPlanner {
    integrator: PositionIntegrator,
}

impl MotionPlanner {
    /// Planner with every axis at the origin.
    pub fn new(bounds: [AxisBounds; AXIS_COUNT]) -> Self {
        Self {
            integrator: PositionIntegrator::new(bounds),
        }
    }

    /// Compute the command for explicit slots and advance the axes.
    pub fn plan(&mut self, slots: [Option<NoteId>; AXIS_COUNT], length: f64) -> MotionCommand {
        let distances = slot_distances(&slots);
        let feed = distances
            .iter()
            .map(|&d| feed_rate_for(d).powi(2))
            .sum::<f64>()
            .sqrt();
        let deltas = self.integrator.advance(distances.map(|d| d * length));
        MotionCommand::new(deltas, feed)
    }

    /// Plan from the first three of `notes`. `None` when `notes` is empty.
    pub fn plan_notes(&mut self, notes: &[NoteId], length: f64) -> Option<MotionCommand> {
        if notes.is_empty() {
            return None;
        }
        let mut slots = [None; AXIS_COUNT];
        for (slot, &note) in slots.iter_mut().zip(notes) {
            *slot = Some(note);
        }
        Some(self.plan(slots, length))
    }

    /// Encoded command for raw note numbers; negative numbers leave a slot empty.
    pub fn gcode_for(&mut self, note1: i32, note2: i32, note3: i32, length: f64) -> String {
        let slots = [note1, note2, note3].map(NoteId::from_i32);
        self.plan(slots, length).encode()
    }

    /// Axis state.
    #[inline]
    pub fn integrator(&self) -> &PositionIntegrator {
        &self.integrator
    }

    /// Return every axis to the origin with new bounds.
    pub fn reset(&mut self, bounds: [AxisBounds; AXIS_COUNT]) {
        self.integrator.reset(bounds);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
