//! Command sink implementations.
//!
//! - [`WriterSink`] - any `io::Write` (stdout, a file, a serial device node)
//! - [`MemorySink`] - in-memory log for dry runs and tests
//!
//! [`create_sink`] maps a [`SinkConfig`] to a boxed sink. Opening the
//! target is the only place a `ConnectionFailed` can originate; the loop is
//! never started when it fails.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use midibot_common::sink::{CommandSink, SinkError};

use crate::config::{SinkConfig, SinkKind};

// ─── Writer Sink ────────────────────────────────────────────────────

/// Line-oriented sink over any writer. Flushes after every line.
pub struct WriterSink<W: Write + Send> {
    name: &'static str,
    writer: Option<W>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap a connected writer.
    pub fn new(name: &'static str, writer: W) -> Self {
        Self {
            name,
            writer: Some(writer),
        }
    }
}

impl WriterSink<io::Stdout> {
    /// Sink printing to standard output.
    pub fn stdout() -> Self {
        Self::new("stdout", io::stdout())
    }
}

impl<W: Write + Send> CommandSink for WriterSink<W> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn send(&mut self, line: &str) -> Result<(), SinkError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or(SinkError::Disconnected(self.name))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), SinkError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            debug!(sink = self.name, "disconnected");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.writer.is_some()
    }
}

// ─── Memory Sink ────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct LogInner {
    lines: Vec<String>,
    disconnected: bool,
}

/// Shared view of what a [`MemorySink`] received.
///
/// Stays readable after the sink itself was moved into the control loop.
#[derive(Debug, Clone, Default)]
pub struct SinkLog {
    inner: Arc<Mutex<LogInner>>,
}

impl SinkLog {
    /// Every line received so far.
    pub fn lines(&self) -> Vec<String> {
        self.inner.lock().lines.clone()
    }

    /// Number of lines received.
    pub fn len(&self) -> usize {
        self.inner.lock().lines.len()
    }

    /// True if nothing was received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget received lines.
    pub fn clear(&self) {
        self.inner.lock().lines.clear();
    }

    /// Whether the sink was disconnected.
    pub fn is_disconnected(&self) -> bool {
        self.inner.lock().disconnected
    }
}

/// Sink that records lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    log: SinkLog,
    fail_after: Option<usize>,
}

impl MemorySink {
    /// New connected sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose writes fail once `lines` lines were accepted.
    pub fn failing_after(lines: usize) -> Self {
        Self {
            log: SinkLog::default(),
            fail_after: Some(lines),
        }
    }

    /// Handle to the recorded lines.
    pub fn log(&self) -> SinkLog {
        self.log.clone()
    }
}

impl CommandSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn send(&mut self, line: &str) -> Result<(), SinkError> {
        let mut inner = self.log.inner.lock();
        if inner.disconnected {
            return Err(SinkError::Disconnected("memory"));
        }
        if self.fail_after.is_some_and(|limit| inner.lines.len() >= limit) {
            return Err(SinkError::WriteFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "memory sink write limit reached",
            )));
        }
        inner.lines.push(line.to_string());
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), SinkError> {
        self.log.inner.lock().disconnected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.log.inner.lock().disconnected
    }
}

// ─── Factory ────────────────────────────────────────────────────────

/// Open the configured sink.
///
/// # Errors
/// `SinkError::ConnectionFailed` if the target cannot be opened.
pub fn create_sink(config: &SinkConfig) -> Result<Box<dyn CommandSink>, SinkError> {
    let sink: Box<dyn CommandSink> = match config.kind {
        SinkKind::Stdout => Box::new(WriterSink::stdout()),
        SinkKind::Memory => Box::new(MemorySink::new()),
        SinkKind::File => {
            let path = config
                .path
                .as_ref()
                .ok_or_else(|| SinkError::ConnectionFailed("no path configured".to_string()))?;
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .append(true)
                .open(path)
                .map_err(|e| SinkError::ConnectionFailed(format!("{}: {e}", path.display())))?;
            Box::new(WriterSink::new("file", file))
        }
    };
    info!("Command sink '{}' connected", sink.name());
    Ok(sink)
}

// ─── Tests ──────────────────────────────────────────────────────────
