//! # Midibot Control Unit Library
//!
//! Turns live note events into linear G-code moves for a three-axis machine,
//! so the steppers sound the pitches being played.
//!
//! ## Pipeline
//!
//! 1. **Event source** (`midi`): MIDI bytes or text lines → `NoteEvent`
//! 2. **NoteRegistry** (`registry`): bounded set of sounding notes with an
//!    auto-stop watchdog
//! 3. **MotionPlanner** (`motion`, `pitch`, `integrator`): up to three notes
//!    → per-axis deltas that stay inside the axis bounds
//! 4. **Encoder** (`gcode`): `G1 X.. Y.. Z.. F..`
//! 5. **Sink** (`sink`): stdout, a file or device node, or memory
//!
//! The [`cycle::ControlLoop`] drives steps 2 to 5 on a fixed period.
//! Event sources run on their own threads and only touch the registry.

pub mod config;
pub mod cycle;
pub mod gcode;
pub mod integrator;
pub mod midi;
pub mod motion;
pub mod pitch;
pub mod registry;
pub mod reset;
pub mod sink;
pub mod state;
