//! Loop start, shutdown, interruption and sink failure.

use std::fs;
use std::thread;
use std::time::Duration;

use midibot_common::note::NoteId;
use midibot_control_unit::config::{MidibotConfig, SinkKind};
use midibot_control_unit::cycle::{ControlLoop, CycleError};
use midibot_control_unit::gcode::MotionCommand;
use midibot_control_unit::sink::{MemorySink, create_sink};
use midibot_control_unit::state::LoopState;

fn fast_config() -> MidibotConfig {
    let mut config = MidibotConfig::default();
    config.control.tick_period_ms = 10;
    config.control.lock_timeout_ms = 2;
    config
}

#[test]
fn file_sink_receives_startup_and_motion() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.gcode");
    let mut config = fast_config();
    config.sink.kind = SinkKind::File;
    config.sink.path = Some(path.clone());

    let mut control = ControlLoop::new(&config, create_sink(&config.sink).unwrap());
    control.reset().unwrap();
    control.registry().note_on(NoteId::new(69).unwrap());

    let handle = control.handle();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(150));
        handle.request_shutdown();
    });
    control.run().unwrap();
    stopper.join().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "G21 (set units to mm)");
    assert_eq!(lines[5], "G1 X0 Y0 Z50 F1000");
    // The note is held for at most five ticks.
    let moves = &lines[6..];
    assert!(!moves.is_empty() && moves.len() <= 5, "{moves:?}");
    for line in moves {
        let cmd: MotionCommand = line.parse().unwrap();
        assert!((cmd.feed - 600.0).abs() < 1e-9);
    }
    assert_eq!(control.state(), LoopState::Stopped);
}

#[test]
fn interruption_stops_loop_and_disconnects() {
    let sink = MemorySink::new();
    let log = sink.log();
    let mut control = ControlLoop::new(&fast_config(), Box::new(sink));
    control.reset().unwrap();

    let handle = control.handle();
    let interrupter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(40));
        handle.interrupt();
    });
    let result = control.run();
    interrupter.join().unwrap();

    assert!(matches!(result, Err(CycleError::Interrupted)));
    assert!(log.is_disconnected());
    assert_eq!(control.state(), LoopState::Stopped);
    assert!(control.stats().ticks > 0);
}

#[test]
fn sink_failure_is_fatal() {
    // Startup sequence fits, the first motion command does not.
    let sink = MemorySink::failing_after(6);
    let log = sink.log();
    let mut control = ControlLoop::new(&fast_config(), Box::new(sink));
    control.reset().unwrap();
    control.registry().note_on(NoteId::new(60).unwrap());

    assert!(matches!(control.run(), Err(CycleError::Sink(_))));
    assert!(log.is_disconnected());
    assert_eq!(log.len(), 6);
    assert_eq!(control.state(), LoopState::Stopped);
}

#[test]
fn loop_refuses_to_start_without_reset() {
    let mut control = ControlLoop::new(&fast_config(), Box::new(MemorySink::new()));
    assert!(matches!(control.run(), Err(CycleError::NotReset)));
    assert_eq!(control.stats().ticks, 0);
}

#[test]
fn disabled_reset_still_homes_axes() {
    let sink = MemorySink::new();
    let log = sink.log();
    let mut config = fast_config();
    config.reset.enabled = false;
    let mut control = ControlLoop::new(&config, Box::new(sink));
    assert_eq!(control.reset().unwrap(), 0);
    assert!(log.is_empty());
    assert!(control.is_homed());
    assert_eq!(control.planner().integrator().positions(), [0.0; 3]);
}
