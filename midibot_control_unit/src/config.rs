//! TOML configuration for the control unit.
//!
//! One file, every section optional. An empty file yields the reference
//! machine: 100 ms ticks, 3 notes, auto-stop after 5 ticks, 0.1 s of pitch
//! travel per tick, X/Y in [-5, 5] and Z in [0, 10].
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//!
//! [control]
//! tick_period_ms = 100
//! max_notes = 3
//! auto_stop_ticks = 5
//! play_length = 0.1
//!
//! [axes.z]
//! min = 0.0
//! max = 20.0
//!
//! [sink]
//! kind = "file"
//! path = "/dev/ttyACM0"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use midibot_common::axis::{Axis, AxisBounds};
use midibot_common::config::{ConfigError, ConfigLoader, SharedConfig};
use midibot_common::consts::{
    AXIS_COUNT, DEFAULT_AUTO_STOP_TICKS, DEFAULT_LOCK_TIMEOUT_MS, DEFAULT_MAX_NOTES,
    DEFAULT_PLAY_LENGTH, DEFAULT_TICK_PERIOD_MS, MAX_NOTES_LIMIT, PLAY_LENGTH_MAX,
    TICK_PERIOD_MS_MAX, TICK_PERIOD_MS_MIN,
};

use crate::reset::DEFAULT_STARTUP_GCODE;

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete control unit configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MidibotConfig {
    /// Logging and instance name.
    #[serde(default)]
    pub shared: SharedConfig,
    /// Tick timing, registry and watchdog parameters.
    #[serde(default)]
    pub control: ControlConfig,
    /// Per-axis travel range.
    #[serde(default)]
    pub axes: AxesConfig,
    /// Machine reset sequence.
    #[serde(default)]
    pub reset: ResetConfig,
    /// Command sink selection.
    #[serde(default)]
    pub sink: SinkConfig,
    /// MIDI input selection.
    #[serde(default)]
    pub midi: MidiConfig,
}

impl MidibotConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.control.validate().map_err(ConfigError::ValidationError)?;
        self.axes.validate().map_err(ConfigError::ValidationError)?;
        self.sink.validate().map_err(ConfigError::ValidationError)?;
        Ok(())
    }
}

// ─── Control ────────────────────────────────────────────────────────

/// Control loop parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Tick period [ms] (default: 100).
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// Maximum simultaneously active notes (default: 3).
    #[serde(default = "default_max_notes")]
    pub max_notes: usize,

    /// Ticks a note survives without note-off (default: 5).
    #[serde(default = "default_auto_stop_ticks")]
    pub auto_stop_ticks: u32,

    /// Seconds of pitch travel per tick (default: 0.1).
    #[serde(default = "default_play_length")]
    pub play_length: f64,

    /// Registry lock budget per tick [ms] (default: 20).
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Debug statistics interval [ticks] (default: 100, 0 = off).
    #[serde(default = "default_stats_interval")]
    pub stats_interval: u64,
}

fn default_tick_period_ms() -> u64 {
    DEFAULT_TICK_PERIOD_MS
}
fn default_max_notes() -> usize {
    DEFAULT_MAX_NOTES
}
fn default_auto_stop_ticks() -> u32 {
    DEFAULT_AUTO_STOP_TICKS
}
fn default_play_length() -> f64 {
    DEFAULT_PLAY_LENGTH
}
fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}
fn default_stats_interval() -> u64 {
    100
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            max_notes: default_max_notes(),
            auto_stop_ticks: default_auto_stop_ticks(),
            play_length: default_play_length(),
            lock_timeout_ms: default_lock_timeout_ms(),
            stats_interval: default_stats_interval(),
        }
    }
}

impl ControlConfig {
    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_period_ms < TICK_PERIOD_MS_MIN || self.tick_period_ms > TICK_PERIOD_MS_MAX {
            return Err(format!(
                "tick_period_ms {} out of range [{}, {}]",
                self.tick_period_ms, TICK_PERIOD_MS_MIN, TICK_PERIOD_MS_MAX
            ));
        }
        if self.max_notes == 0 || self.max_notes > MAX_NOTES_LIMIT {
            return Err(format!(
                "max_notes {} out of range [1, {}]",
                self.max_notes, MAX_NOTES_LIMIT
            ));
        }
        if self.auto_stop_ticks == 0 {
            return Err("auto_stop_ticks must be at least 1".to_string());
        }
        if !(self.play_length > 0.0 && self.play_length <= PLAY_LENGTH_MAX) {
            return Err(format!(
                "play_length {} out of range (0, {}]",
                self.play_length, PLAY_LENGTH_MAX
            ));
        }
        if self.lock_timeout_ms >= self.tick_period_ms {
            return Err(format!(
                "lock_timeout_ms {} must be shorter than tick_period_ms {}",
                self.lock_timeout_ms, self.tick_period_ms
            ));
        }
        Ok(())
    }

    /// Tick period as a `Duration`.
    #[inline]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Registry lock budget as a `Duration`.
    #[inline]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

// ─── Axes ───────────────────────────────────────────────────────────

/// Travel range per axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AxesConfig {
    /// X range (default: [-5, 5]).
    #[serde(default = "default_x")]
    pub x: AxisBounds,
    /// Y range (default: [-5, 5]).
    #[serde(default = "default_y")]
    pub y: AxisBounds,
    /// Z range (default: [0, 10]).
    #[serde(default = "default_z")]
    pub z: AxisBounds,
}

fn default_x() -> AxisBounds {
    AxisBounds::X_DEFAULT
}
fn default_y() -> AxisBounds {
    AxisBounds::Y_DEFAULT
}
fn default_z() -> AxisBounds {
    AxisBounds::Z_DEFAULT
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            x: default_x(),
            y: default_y(),
            z: default_z(),
        }
    }
}

impl AxesConfig {
    /// Bounds in X, Y, Z order.
    pub fn bounds(&self) -> [AxisBounds; AXIS_COUNT] {
        [self.x, self.y, self.z]
    }

    /// Validate every axis range.
    pub fn validate(&self) -> Result<(), String> {
        for (axis, bounds) in Axis::ALL.into_iter().zip(self.bounds()) {
            bounds.validate(axis)?;
        }
        Ok(())
    }
}

// ─── Reset ──────────────────────────────────────────────────────────

/// Machine reset sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetConfig {
    /// Send the startup sequence on reset (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Lines sent once before the loop starts.
    #[serde(default = "default_startup_gcode")]
    pub startup_gcode: Vec<String>,
}

fn default_true() -> bool {
    true
}
fn default_startup_gcode() -> Vec<String> {
    DEFAULT_STARTUP_GCODE.iter().map(|s| s.to_string()).collect()
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            startup_gcode: default_startup_gcode(),
        }
    }
}

// ─── Sink ───────────────────────────────────────────────────────────

/// Kind of command sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Print commands to standard output.
    #[default]
    Stdout,
    /// Write commands to a file or device node.
    File,
    /// Keep commands in memory (dry runs, tests).
    Memory,
}

/// Command sink selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink kind (default: stdout).
    #[serde(default)]
    pub kind: SinkKind,
    /// Target path, required for `file`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl SinkConfig {
    /// Validate kind/path consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.kind == SinkKind::File && self.path.is_none() {
            return Err("sink kind \"file\" requires a path".to_string());
        }
        Ok(())
    }
}

// ─── MIDI ───────────────────────────────────────────────────────────

/// MIDI input selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MidiConfig {
    /// Port index or name fragment. First port when absent.
    #[serde(default)]
    pub port: Option<String>,
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate the configuration file.
pub fn load_config(path: &Path) -> Result<MidibotConfig, ConfigError> {
    let config = MidibotConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate configuration from a TOML string.
pub fn load_config_from_str(content: &str) -> Result<MidibotConfig, ConfigError> {
    let config = MidibotConfig::from_toml(content)?;
    config.validate()?;
    Ok(config)
}

// ─── Tests ──────────────────────────────────────────────────────────
