//! Command sink trait and error types.
//!
//! This module defines:
//! - `CommandSink` trait - Interface for anything that accepts G-code lines
//! - `SinkError` enum - Error types for sink operations
//!
//! The control loop owns exactly one sink and calls it synchronously, so
//! commands reach the machine in the order they were computed.

use thiserror::Error;

/// Error types for sink operations.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink could not be opened or reached.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Writing a line failed.
    #[error("Write failed: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// The sink was already disconnected.
    #[error("Sink '{0}' is disconnected")]
    Disconnected(&'static str),
}

/// Trait defining the interface for command sinks.
///
/// # Lifecycle
///
/// 1. Created connected by its factory (failure → `ConnectionFailed`)
/// 2. `send()` / `send_batch()` - Called by the control loop
/// 3. `disconnect()` - Called once when the loop stops for good
///
/// # Contract
///
/// | Operation | Blocking | Ordering |
/// |-----------|----------|----------|
/// | `send()` | Yes | Lines delivered in call order |
/// | `send_batch()` | Yes | Lines delivered in slice order |
/// | `disconnect()` | Yes | Later sends fail with `Disconnected` |
pub trait CommandSink: Send {
    /// Returns the sink's identifier (e.g., "stdout", "file").
    fn name(&self) -> &'static str;

    /// Deliver one command line (without line terminator).
    fn send(&mut self, line: &str) -> Result<(), SinkError>;

    /// Deliver a sequence of lines in order.
    ///
    /// Stops at the first failing line.
    fn send_batch(&mut self, lines: &[String]) -> Result<(), SinkError> {
        for line in lines {
            self.send(line)?;
        }
        Ok(())
    }

    /// Close the connection. Idempotent.
    fn disconnect(&mut self) -> Result<(), SinkError>;

    /// Whether `send()` may still succeed.
    fn is_connected(&self) -> bool;
}
