//! Prelude module for common re-exports.
//!
//! ```rust
//! use midibot_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{AXIS_COUNT, MAX_NOTES_LIMIT};

// ─── Domain Types ───────────────────────────────────────────────────
pub use crate::axis::{Axis, AxisBounds, Direction};
pub use crate::note::{NoteEvent, NoteId};

// ─── Sink Contract ──────────────────────────────────────────────────
pub use crate::sink::{CommandSink, SinkError};
