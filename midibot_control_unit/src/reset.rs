//! Machine reset: homing and safe-origin sequence.
//!
//! Sent once, before the loop starts ticking, through the same sink the
//! loop later uses. The loop's own axis state is reset alongside (see
//! `ControlLoop::reset`).

use midibot_common::sink::{CommandSink, SinkError};
use tracing::{debug, info};

use crate::config::ResetConfig;

/// Default startup sequence: mm units, absolute positioning, home Z to max
/// and XY to min, recall stored offsets, move to the safe origin.
pub const DEFAULT_STARTUP_GCODE: &[&str] = &[
    "G21 (set units to mm)",
    "G90 (set positioning to absolute)",
    "G162 Z F500 (home Z axis maximum)",
    "G161 X Y F2500 (home XY axes minimum)",
    "M132 X Y Z A B (Recall stored home offsets for XYZAB axis)",
    "G1 X0 Y0 Z50 F1000",
];

/// Send the configured startup sequence.
///
/// Returns the number of lines sent (0 when disabled).
pub fn send_startup_sequence(
    sink: &mut dyn CommandSink,
    config: &ResetConfig,
) -> Result<usize, SinkError> {
    if !config.enabled {
        info!("Startup sequence disabled, skipping homing");
        return Ok(0);
    }
    for line in &config.startup_gcode {
        debug!(sink = sink.name(), "{line}");
    }
    sink.send_batch(&config.startup_gcode)?;
    info!(
        "Startup sequence sent: {} lines via '{}'",
        config.startup_gcode.len(),
        sink.name()
    );
    Ok(config.startup_gcode.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    #[test]
    fn sends_default_sequence_in_order() {
        let mut sink = MemorySink::new();
        let log = sink.log();
        let sent = send_startup_sequence(&mut sink, &ResetConfig::default()).unwrap();
        assert_eq!(sent, 6);
        let lines = log.lines();
        assert_eq!(lines.first().map(String::as_str), Some("G21 (set units to mm)"));
        assert_eq!(lines.last().map(String::as_str), Some("G1 X0 Y0 Z50 F1000"));
    }

    #[test]
    fn disabled_sequence_sends_nothing() {
        let mut sink = MemorySink::new();
        let log = sink.log();
        let config = ResetConfig {
            enabled: false,
            ..ResetConfig::default()
        };
        assert_eq!(send_startup_sequence(&mut sink, &config).unwrap(), 0);
        assert!(log.lines().is_empty());
    }
}
