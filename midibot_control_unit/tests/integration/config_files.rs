//! Configuration files on disk.

use std::io::Write;
use std::path::Path;

use midibot_common::config::{ConfigError, LogLevel};
use midibot_control_unit::config::{SinkKind, load_config};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn bundled_config_matches_defaults() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/midibot.toml");
    let config = load_config(&path).unwrap();
    assert_eq!(config.control.tick_period_ms, 100);
    assert_eq!(config.control.max_notes, 3);
    assert_eq!(config.control.auto_stop_ticks, 5);
    assert_eq!(config.axes.z.max, 10.0);
    assert_eq!(config.reset.startup_gcode.len(), 6);
    assert_eq!(config.sink.kind, SinkKind::Stdout);
}

#[test]
fn partial_file_keeps_other_defaults() {
    let file = write_config(
        r#"
[shared]
log_level = "debug"

[control]
tick_period_ms = 50

[sink]
kind = "file"
path = "/tmp/midibot.gcode"
"#,
    );
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.control.tick_period_ms, 50);
    assert_eq!(config.control.max_notes, 3);
    assert_eq!(config.sink.kind, SinkKind::File);
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound));
}

#[test]
fn invalid_values_fail_validation() {
    for content in [
        "[control]\nmax_notes = 0\n",
        "[control]\nauto_stop_ticks = 0\n",
        "[control]\ntick_period_ms = 100\nlock_timeout_ms = 100\n",
        "[axes.x]\nmin = 1.0\nmax = 5.0\n",
        "[sink]\nkind = \"file\"\n",
    ] {
        let file = write_config(content);
        let err = load_config(file.path()).unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError(_)),
            "{content:?} gave {err:?}"
        );
    }
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = write_config("[control\ntick_period_ms = ");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}
