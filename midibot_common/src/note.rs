//! Note identifiers and note events.
//!
//! A [`NoteId`] is a MIDI note number in `0..=127`. The event source hands
//! the registry [`NoteEvent`]s; a note-on with velocity 0 is folded into a
//! note-off at construction so consumers never see it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::consts::NOTE_ID_MAX;

/// A validated MIDI note number (`0..=127`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct NoteId(u8);

impl NoteId {
    /// Create a note id. Returns `None` above 127.
    #[inline]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= NOTE_ID_MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create a note id from a signed value.
    ///
    /// Negative values are the "empty slot" sentinel and map to `None`,
    /// as does anything above 127.
    #[inline]
    pub const fn from_i32(value: i32) -> Option<Self> {
        if value >= 0 && value <= NOTE_ID_MAX as i32 {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    /// Raw note number.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for NoteId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("note {value} out of range [0, {NOTE_ID_MAX}]"))
    }
}

impl From<NoteId> for u8 {
    fn from(note: NoteId) -> Self {
        note.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A note event delivered by the asynchronous event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEvent {
    /// Key pressed with a non-zero velocity.
    NoteOn {
        /// Pitch.
        note: NoteId,
        /// Velocity (`1..=127`).
        velocity: u8,
    },
    /// Key released.
    NoteOff {
        /// Pitch.
        note: NoteId,
    },
}

impl NoteEvent {
    /// Build a note-on event; velocity 0 yields a note-off.
    #[inline]
    pub const fn note_on(note: NoteId, velocity: u8) -> Self {
        if velocity == 0 {
            Self::NoteOff { note }
        } else {
            Self::NoteOn { note, velocity }
        }
    }

    /// Build a note-off event.
    #[inline]
    pub const fn note_off(note: NoteId) -> Self {
        Self::NoteOff { note }
    }

    /// The pitch this event refers to.
    #[inline]
    pub const fn note(&self) -> NoteId {
        match *self {
            Self::NoteOn { note, .. } | Self::NoteOff { note } => note,
        }
    }
}
