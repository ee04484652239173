//! Bounded active-note registry with auto-stop watchdog.
//!
//! Shared between exactly two roles: the asynchronous event producer
//! (`note_on` / `note_off` / `apply`) and the periodic control loop
//! (`snapshot_and_age`). Membership and miss count live in one table behind
//! one lock, so the two can never diverge and no caller ever iterates the
//! table while a producer call is in flight.
//!
//! ## Auto-stop
//!
//! Every `snapshot_and_age` increments the miss count of each active note.
//! A note whose count exceeds the threshold is evicted during that same call
//! and is not reported. With threshold T a note that never receives a
//! note-off is reported for exactly T ticks and evicted on tick T + 1.
//! A note-off always wins: it removes the note immediately.

use std::time::Duration;

use heapless::Vec as FixedVec;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, trace};

use midibot_common::consts::MAX_NOTES_LIMIT;
use midibot_common::note::{NoteEvent, NoteId};

/// Notes returned by one aging pass, in insertion order.
pub type NoteList = FixedVec<NoteId, MAX_NOTES_LIMIT>;

/// Registry access errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The consumer could not obtain the lock within its budget.
    ///
    /// Transient: the tick is skipped and the next one retries.
    #[error("note registry contended: lock not acquired within {0:?}")]
    Contended(Duration),
}

/// Result of one watchdog pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgeReport {
    /// Notes still sounding after this pass.
    pub survivors: NoteList,
    /// Notes force-released by the watchdog during this pass.
    pub evicted: NoteList,
}

#[derive(Debug, Clone, Copy)]
struct ActiveNote {
    note: NoteId,
    /// Ticks survived since note-on.
    misses: u32,
}

#[derive(Debug)]
struct NoteTable {
    entries: FixedVec<ActiveNote, MAX_NOTES_LIMIT>,
}

impl NoteTable {
    fn position(&self, note: NoteId) -> Option<usize> {
        self.entries.iter().position(|e| e.note == note)
    }
}

/// Thread-safe set of at most `capacity` active notes.
#[derive(Debug)]
pub struct NoteRegistry {
    table: Mutex<NoteTable>,
    capacity: usize,
    auto_stop_ticks: u32,
    lock_timeout: Duration,
}

impl NoteRegistry {
    /// Create an empty registry.
    ///
    /// `capacity` is clamped to `1..=MAX_NOTES_LIMIT`.
    pub fn new(capacity: usize, auto_stop_ticks: u32, lock_timeout: Duration) -> Self {
        Self {
            table: Mutex::new(NoteTable {
                entries: FixedVec::new(),
            }),
            capacity: capacity.clamp(1, MAX_NOTES_LIMIT),
            auto_stop_ticks,
            lock_timeout,
        }
    }

    /// Maximum number of simultaneously active notes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Ticks a note may survive without a note-off.
    #[inline]
    pub fn auto_stop_ticks(&self) -> u32 {
        self.auto_stop_ticks
    }

    /// Register a pressed key.
    ///
    /// No-op if the note is already active or the registry is full.
    /// Returns `true` if the note was added.
    pub fn note_on(&self, note: NoteId) -> bool {
        let mut table = self.table.lock();
        if table.position(note).is_some() {
            trace!(%note, "note on ignored: already active");
            return false;
        }
        if table.entries.len() >= self.capacity {
            debug!(%note, capacity = self.capacity, "note on ignored: registry full");
            return false;
        }
        // Capacity is bounded by MAX_NOTES_LIMIT, so the push cannot fail.
        let added = table.entries.push(ActiveNote { note, misses: 0 }).is_ok();
        if added {
            debug!(%note, "note on");
        }
        added
    }

    /// Release a key. Its miss count restarts from 0 on the next note-on.
    ///
    /// Returns `true` if the note was active.
    pub fn note_off(&self, note: NoteId) -> bool {
        let mut table = self.table.lock();
        match table.position(note) {
            Some(index) => {
                table.entries.remove(index);
                debug!(%note, "note off");
                true
            }
            None => {
                trace!(%note, "note off for inactive note");
                false
            }
        }
    }

    /// Dispatch a note event from the event source.
    pub fn apply(&self, event: NoteEvent) -> bool {
        match event {
            NoteEvent::NoteOn { note, .. } => self.note_on(note),
            NoteEvent::NoteOff { note } => self.note_off(note),
        }
    }

    /// Age every active note by one tick and evict expired ones.
    ///
    /// Called once per tick by the control loop only.
    ///
    /// # Errors
    /// `RegistryError::Contended` if the lock is not obtained within the
    /// configured timeout. Nothing is aged in that case.
    pub fn snapshot_and_age(&self) -> Result<AgeReport, RegistryError> {
        let mut table = self
            .table
            .try_lock_for(self.lock_timeout)
            .ok_or(RegistryError::Contended(self.lock_timeout))?;

        let threshold = self.auto_stop_ticks;
        let mut report = AgeReport::default();

        // Both lists are bounded by the table length, so pushes cannot fail.
        table.entries.retain_mut(|entry| {
            entry.misses = entry.misses.saturating_add(1);
            if entry.misses > threshold {
                let _ = report.evicted.push(entry.note);
                false
            } else {
                let _ = report.survivors.push(entry.note);
                true
            }
        });

        Ok(report)
    }

    /// Currently active notes in insertion order, without aging.
    pub fn active(&self) -> NoteList {
        self.table.lock().entries.iter().map(|e| e.note).collect()
    }

    /// Ticks survived by `note`, or `None` if it is not active.
    pub fn miss_count(&self, note: NoteId) -> Option<u32> {
        let table = self.table.lock();
        table.position(note).map(|i| table.entries[i].misses)
    }

    /// Number of active notes.
    pub fn len(&self) -> usize {
        self.table.lock().entries.len()
    }

    /// True if no note is active.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every active note (machine reset).
    pub fn clear(&self) {
        let mut table = self.table.lock();
        if !table.entries.is_empty() {
            debug!(count = table.entries.len(), "clearing active notes");
        }
        table.entries.clear();
    }
}

#[cfg(test)]
impl NoteRegistry {
    /// Hold the table lock the way a producer mid-update does.
    pub(crate) fn hold_lock(&self) -> parking_lot::MutexGuard<'_, impl std::fmt::Debug> {
        self.table.lock()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
