//! Note event sources.
//!
//! Both sources are producers for the [`NoteRegistry`]: they call into it
//! from their own thread whenever an event arrives, independent of the
//! control loop's schedule.
//!
//! - Raw MIDI bytes ([`parse_midi_message`]), fed by the optional `midi`
//!   feature backend in [`input`].
//! - A line-oriented text protocol ([`parse_text_event`]), used for dry runs
//!   from stdin and for scripted tests:
//!
//! ```text
//! # comment
//! on 60 100
//! on 64        # velocity defaults to 100
//! off 60
//! ```

use std::io::BufRead;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use midibot_common::note::{NoteEvent, NoteId};

use crate::registry::NoteRegistry;

const STATUS_NOTE_OFF: u8 = 0x80;
const STATUS_NOTE_ON: u8 = 0x90;
const DEFAULT_TEXT_VELOCITY: u8 = 100;

/// Event source errors. Raised on the setup path only.
#[derive(Debug, Error)]
pub enum MidiError {
    /// No usable input device.
    #[error("MIDI device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The device exists but could not be opened.
    #[error("MIDI connection failed: {0}")]
    ConnectionFailed(String),
}

/// Text event parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    /// First word is not `on` or `off`.
    #[error("unknown event {0:?}")]
    UnknownEvent(String),
    /// Note number missing or outside 0..=127.
    #[error("invalid note {0:?}")]
    InvalidNote(String),
    /// Velocity outside 0..=127.
    #[error("invalid velocity {0:?}")]
    InvalidVelocity(String),
}

/// Decode a channel voice message into a note event, on any channel.
///
/// Note-on with velocity 0 becomes note-off. Everything else is ignored.
pub fn parse_midi_message(bytes: &[u8]) -> Option<NoteEvent> {
    let (&status, data) = bytes.split_first()?;
    let [key, velocity, ..] = *data else {
        return None;
    };
    let note = NoteId::new(key)?;
    match status & 0xF0 {
        STATUS_NOTE_ON => Some(NoteEvent::note_on(note, velocity & 0x7F)),
        STATUS_NOTE_OFF => Some(NoteEvent::note_off(note)),
        _ => None,
    }
}

/// Parse one line of the text protocol.
///
/// Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_text_event(line: &str) -> Result<Option<NoteEvent>, EventParseError> {
    let line = line.split('#').next().unwrap_or_default().trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let kind = words.next().unwrap_or_default();
    let is_on = match kind.to_ascii_lowercase().as_str() {
        "on" => true,
        "off" => false,
        _ => return Err(EventParseError::UnknownEvent(kind.to_string())),
    };

    let note_word = words.next().unwrap_or_default();
    let note = note_word
        .parse::<u8>()
        .ok()
        .and_then(NoteId::new)
        .ok_or_else(|| EventParseError::InvalidNote(note_word.to_string()))?;

    if !is_on {
        return Ok(Some(NoteEvent::note_off(note)));
    }
    let velocity = match words.next() {
        Some(word) => word
            .parse::<u8>()
            .ok()
            .filter(|v| *v <= 0x7F)
            .ok_or_else(|| EventParseError::InvalidVelocity(word.to_string()))?,
        None => DEFAULT_TEXT_VELOCITY,
    };
    Ok(Some(NoteEvent::note_on(note, velocity)))
}

/// Feed text events from `reader` into `registry` on a background thread.
///
/// The thread ends at end of input; it returns the number of applied events.
pub fn spawn_text_source<R>(reader: R, registry: Arc<NoteRegistry>) -> JoinHandle<usize>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        let mut applied = 0;
        for (lineno, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("event source read error: {e}");
                    break;
                }
            };
            match parse_text_event(&line) {
                Ok(Some(event)) => {
                    trace!(note = %event.note(), "text event line {}", lineno + 1);
                    registry.apply(event);
                    applied += 1;
                }
                Ok(None) => {}
                Err(e) => warn!("line {}: {e}", lineno + 1),
            }
        }
        info!("Text event source closed after {applied} events");
        applied
    })
}

// ─── Hardware Input (midir) ─────────────────────────────────────────

/// Hardware MIDI input through `midir`.
#[cfg(feature = "midi")]
pub mod input {
    use super::*;
    use midir::{Ignore, MidiInput, MidiInputConnection};

    const CLIENT_NAME: &str = "midibot";

    /// Information about an available MIDI input port.
    #[derive(Debug, Clone)]
    pub struct MidiPortInfo {
        /// Port index.
        pub index: usize,
        /// Port name.
        pub name: String,
    }

    /// List input ports.
    pub fn list_ports() -> Result<Vec<MidiPortInfo>, MidiError> {
        let midi_in =
            MidiInput::new(CLIENT_NAME).map_err(|e| MidiError::DeviceUnavailable(e.to_string()))?;
        Ok(midi_in
            .ports()
            .iter()
            .enumerate()
            .filter_map(|(index, port)| {
                midi_in
                    .port_name(port)
                    .ok()
                    .map(|name| MidiPortInfo { index, name })
            })
            .collect())
    }

    /// An open input connection. Events flow until it is dropped or closed.
    pub struct MidiInputSource {
        connection: Option<MidiInputConnection<()>>,
        port_name: String,
    }

    impl MidiInputSource {
        /// Connect to the port selected by `selector` (index or name fragment,
        /// first port when `None`) and forward note events into `registry`.
        pub fn connect(
            selector: Option<&str>,
            registry: Arc<NoteRegistry>,
        ) -> Result<Self, MidiError> {
            let mut midi_in = MidiInput::new(CLIENT_NAME)
                .map_err(|e| MidiError::DeviceUnavailable(e.to_string()))?;
            midi_in.ignore(Ignore::All);

            let ports = midi_in.ports();
            let named: Vec<(usize, String)> = ports
                .iter()
                .enumerate()
                .map(|(i, p)| (i, midi_in.port_name(p).unwrap_or_default()))
                .collect();
            let index = select_port(&named, selector).ok_or_else(|| {
                MidiError::DeviceUnavailable(match selector {
                    Some(s) => format!("no input port matches {s:?}"),
                    None => "no input ports".to_string(),
                })
            })?;
            let port_name = named[index].1.clone();

            let connection = midi_in
                .connect(
                    &ports[index],
                    "midibot-input",
                    move |_timestamp, message, _| {
                        if let Some(event) = parse_midi_message(message) {
                            registry.apply(event);
                        }
                    },
                    (),
                )
                .map_err(|e| MidiError::ConnectionFailed(e.to_string()))?;

            info!("MIDI input connected: {port_name}");
            Ok(Self {
                connection: Some(connection),
                port_name,
            })
        }

        /// Name of the connected port.
        pub fn port_name(&self) -> &str {
            &self.port_name
        }

        /// Close the connection.
        pub fn close(&mut self) {
            if let Some(conn) = self.connection.take() {
                conn.close();
                info!("MIDI input closed: {}", self.port_name);
            }
        }
    }

    impl Drop for MidiInputSource {
        fn drop(&mut self) {
            self.close();
        }
    }
}

/// Pick a port from `(index, name)` pairs.
///
/// A numeric selector is an index; anything else matches a case-insensitive
/// name fragment. No selector picks the first port.
pub fn select_port(ports: &[(usize, String)], selector: Option<&str>) -> Option<usize> {
    let Some(selector) = selector else {
        return ports.first().map(|(i, _)| *i);
    };
    if let Ok(index) = selector.parse::<usize>() {
        return ports.iter().find(|(i, _)| *i == index).map(|(i, _)| *i);
    }
    let needle = selector.to_lowercase();
    let found = ports
        .iter()
        .find(|(_, name)| name.to_lowercase().contains(&needle))
        .map(|(i, _)| *i);
    if found.is_none() {
        debug!(selector, "no MIDI port name matched");
    }
    found
}

// ─── Tests ──────────────────────────────────────────────────────────
