//! Producers hammer the registry while the consumer ticks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use midibot_common::note::NoteId;
use midibot_control_unit::registry::NoteRegistry;

/// Small xorshift generator so each producer gets its own event stream.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

fn assert_unique(notes: &[NoteId]) {
    for (i, a) in notes.iter().enumerate() {
        assert!(!notes[i + 1..].contains(a), "duplicate note {a} in {notes:?}");
    }
}

#[test]
fn bounded_and_unique_under_concurrent_mutation() {
    let registry = Arc::new(NoteRegistry::new(3, 5, Duration::from_millis(20)));
    let done = Arc::new(AtomicBool::new(false));

    let producers: Vec<_> = (0..4u64)
        .map(|seed| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut rng = XorShift(0x9E37_79B9_7F4A_7C15 ^ (seed + 1));
                for _ in 0..20_000 {
                    let value = rng.next();
                    let note = NoteId::new(48 + (value % 12) as u8).unwrap();
                    if value & 0x100 == 0 {
                        registry.note_on(note);
                    } else {
                        registry.note_off(note);
                    }
                }
            })
        })
        .collect();

    let consumer = {
        let registry = Arc::clone(&registry);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut ticks = 0u64;
            while !done.load(Ordering::SeqCst) {
                if let Ok(report) = registry.snapshot_and_age() {
                    assert!(report.survivors.len() <= 3);
                    assert_unique(&report.survivors);
                    ticks += 1;
                }
                let active = registry.active();
                assert!(active.len() <= 3);
                assert_unique(&active);
            }
            ticks
        })
    };

    for producer in producers {
        producer.join().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    let ticks = consumer.join().unwrap();
    assert!(ticks > 0);
    assert!(registry.len() <= 3);
}

#[test]
fn held_lock_skips_tick_without_aging() {
    let registry = Arc::new(NoteRegistry::new(3, 5, Duration::from_millis(5)));
    registry.note_on(NoteId::new(60).unwrap());

    // A producer storm cannot make the consumer fail hard; a tick either
    // ages everything or nothing.
    let storm = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for i in 0..50_000u32 {
                let note = NoteId::new(70 + (i % 4) as u8).unwrap();
                registry.note_on(note);
                registry.note_off(note);
            }
        })
    };

    let mut aged = 0;
    while !storm.is_finished() && aged < 5 {
        if registry.snapshot_and_age().is_ok() {
            aged += 1;
        }
    }
    storm.join().unwrap();
    let misses = registry.miss_count(NoteId::new(60).unwrap()).unwrap();
    assert_eq!(misses, aged);
}
