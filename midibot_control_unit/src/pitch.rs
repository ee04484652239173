//! Pitch → travel mapping.
//!
//! Equal-tempered scaling anchored at A4 (note 69): one second of A4 moves
//! an axis 10 units, every octave doubles the distance. The feed rate for an
//! axis is the same distance expressed per minute.

use midibot_common::consts::{
    REFERENCE_DISTANCE, REFERENCE_NOTE, SECONDS_PER_MINUTE, SEMITONES_PER_OCTAVE,
};
use midibot_common::note::NoteId;

/// Travel distance for one second of `note`.
///
/// Negative or out-of-range values are the empty-slot sentinel and map to 0.
#[inline]
pub fn distance_for(note: i32) -> f64 {
    match NoteId::from_i32(note) {
        Some(id) => note_distance(id),
        None => 0.0,
    }
}

/// Travel distance for one second of a valid note.
#[inline]
pub fn note_distance(note: NoteId) -> f64 {
    let semitones = (note.get() as i32 - REFERENCE_NOTE) as f64;
    REFERENCE_DISTANCE * (semitones / SEMITONES_PER_OCTAVE).exp2()
}

/// Feed rate [units/min] for a per-second distance.
#[inline]
pub fn feed_rate_for(distance_per_second: f64) -> f64 {
    distance_per_second * SECONDS_PER_MINUTE
}

/// Per-slot distances for an optional note in each of the three slots.
pub fn slot_distances(slots: &[Option<NoteId>; 3]) -> [f64; 3] {
    slots.map(|slot| slot.map_or(0.0, note_distance))
}
