//! Held notes are released by the watchdog and the loop falls idle.

use midibot_common::note::NoteId;
use midibot_control_unit::config::MidibotConfig;
use midibot_control_unit::cycle::{ControlLoop, TickOutcome};
use midibot_control_unit::pitch::note_distance;
use midibot_control_unit::sink::MemorySink;

fn n(v: u8) -> NoteId {
    NoteId::new(v).unwrap()
}

fn chord_loop() -> (ControlLoop, midibot_control_unit::sink::SinkLog) {
    let sink = MemorySink::new();
    let log = sink.log();
    let mut control = ControlLoop::new(&MidibotConfig::default(), Box::new(sink));
    control.reset().unwrap();
    log.clear();
    (control, log)
}

#[test]
fn chord_without_note_off_stops_after_five_ticks() {
    let (mut control, log) = chord_loop();
    let registry = control.registry();
    for note in [60, 64, 67] {
        assert!(registry.note_on(n(note)));
    }

    for tick in 1..=5 {
        let outcome = control.tick().unwrap();
        assert!(
            matches!(outcome, TickOutcome::Sent(_)),
            "tick {tick}: {outcome:?}"
        );
    }
    assert_eq!(log.len(), 5);

    // Tick 6 evicts all three; nothing more is sent.
    for _ in 6..=12 {
        assert_eq!(control.tick().unwrap(), TickOutcome::Idle);
    }
    assert_eq!(log.len(), 5);
    assert!(registry.is_empty());
    assert_eq!(control.stats().evictions, 3);
    assert_eq!(control.stats().idle_ticks, 7);
}

#[test]
fn chord_feed_combines_all_three_axes() {
    let (mut control, _log) = chord_loop();
    let registry = control.registry();
    for note in [60, 64, 67] {
        registry.note_on(n(note));
    }

    let TickOutcome::Sent(cmd) = control.tick().unwrap() else {
        panic!("expected a command");
    };
    let expected = [60, 64, 67]
        .map(|v| note_distance(n(v)) * 60.0)
        .iter()
        .map(|f| f * f)
        .sum::<f64>()
        .sqrt();
    assert!((cmd.feed - expected).abs() < 1e-9);
    for (delta, note) in cmd.deltas.iter().zip([60, 64, 67]) {
        assert!((delta.abs() - note_distance(n(note)) * 0.1).abs() < 1e-9);
    }
}

#[test]
fn note_off_stops_motion_on_next_tick() {
    let (mut control, log) = chord_loop();
    let registry = control.registry();
    registry.note_on(n(69));
    assert!(matches!(control.tick().unwrap(), TickOutcome::Sent(_)));
    registry.note_off(n(69));
    assert_eq!(control.tick().unwrap(), TickOutcome::Idle);
    assert_eq!(log.len(), 1);
}

#[test]
fn fourth_note_is_ignored_while_three_sound() {
    let (mut control, _log) = chord_loop();
    let registry = control.registry();
    for note in [60, 64, 67, 72] {
        registry.note_on(n(note));
    }
    assert_eq!(registry.active().as_slice(), &[n(60), n(64), n(67)]);

    // Releasing one frees a slot for the late note.
    registry.note_off(n(64));
    assert!(registry.note_on(n(72)));
    assert_eq!(registry.active().as_slice(), &[n(60), n(67), n(72)]);
    assert!(matches!(control.tick().unwrap(), TickOutcome::Sent(_)));
}
