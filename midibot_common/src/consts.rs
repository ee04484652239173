//! System-wide constants for the midibot workspace.
//!
//! Single source of truth for numeric limits, pitch model anchors and
//! protocol formatting. Imported by all crates, no duplication permitted.

/// Number of machine axes driven by the note slots (X, Y, Z).
pub const AXIS_COUNT: usize = 3;

/// Compile-time capacity of the active note registry.
///
/// The configured `max_notes` must not exceed this value.
pub const MAX_NOTES_LIMIT: usize = 16;

/// Default number of simultaneously active notes.
pub const DEFAULT_MAX_NOTES: usize = 3;

/// Default number of ticks a note may survive without a note-off.
pub const DEFAULT_AUTO_STOP_TICKS: u32 = 5;

/// Default control tick period in milliseconds.
pub const DEFAULT_TICK_PERIOD_MS: u64 = 100;

/// Allowed tick period range in milliseconds.
pub const TICK_PERIOD_MS_MIN: u64 = 10;
/// Allowed tick period range in milliseconds.
pub const TICK_PERIOD_MS_MAX: u64 = 10_000;

/// Default play length per tick, in seconds of pitch travel.
pub const DEFAULT_PLAY_LENGTH: f64 = 0.1;

/// Upper bound for the configured play length.
pub const PLAY_LENGTH_MAX: f64 = 10.0;

/// Default time the control loop waits for the registry lock [ms].
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 20;

/// Highest valid MIDI note number.
pub const NOTE_ID_MAX: u8 = 127;

/// Note number of A4, the anchor of the pitch model.
pub const REFERENCE_NOTE: i32 = 69;

/// Travel distance of the reference note for one second of play [units].
pub const REFERENCE_DISTANCE: f64 = 10.0;

/// Equal temperament divisions per octave.
pub const SEMITONES_PER_OCTAVE: f64 = 12.0;

/// Converts a per-second distance into a per-minute feed rate.
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Fractional digits of every number in an emitted motion command.
pub const GCODE_FRACTION_DIGITS: usize = 10;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/midibot.toml";

/// Canonical service name used in logs.
pub const SERVICE_NAME: &str = "midibot";
