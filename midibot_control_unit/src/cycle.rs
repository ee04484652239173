//! Fixed-period control loop: age → plan → send.
//!
//! One [`ControlLoop`] owns the motion planner and the command sink and
//! shares the [`NoteRegistry`] with the event source. Each tick:
//!
//! 1. Ages the registry and takes a snapshot (watchdog pass).
//! 2. Plans one motion command from the first three surviving notes.
//! 3. Sends the encoded command to the sink.
//!
//! Ticks are paced against absolute deadlines (`next += period`) so the
//! schedule does not drift with tick duration. A deadline already in the
//! past counts as an overrun and is skipped rather than caught up.
//!
//! ## Termination
//! - [`LoopHandle::request_shutdown`]: the loop finishes the current tick
//!   and returns `Ok`. The sink stays connected. The request is consumed,
//!   so the loop can be reset and run again.
//! - [`LoopHandle::interrupt`]: fatal. The sink is disconnected and
//!   `run` returns [`CycleError::Interrupted`]. The flag stays set.
//! - A sink failure is fatal in the same way.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace, warn};

use midibot_common::axis::AxisBounds;
use midibot_common::consts::AXIS_COUNT;
use midibot_common::sink::{CommandSink, SinkError};

use crate::config::{ControlConfig, MidibotConfig, ResetConfig};
use crate::gcode::MotionCommand;
use crate::motion::MotionPlanner;
use crate::registry::{NoteRegistry, RegistryError};
use crate::reset::send_startup_sequence;
use crate::state::{LoopEvent, LoopState, LoopStateMachine, TransitionResult};

/// Longest single sleep between flag checks.
const MAX_SLEEP_SLICE: Duration = Duration::from_millis(50);

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Per-tick counters and timing.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Ticks executed (including idle and skipped).
    pub ticks: u64,
    /// Ticks with no active note.
    pub idle_ticks: u64,
    /// Motion commands delivered to the sink.
    pub commands_sent: u64,
    /// Ticks skipped on registry contention.
    pub skipped_ticks: u64,
    /// Notes force-released by the watchdog.
    pub evictions: u64,
    /// Deadlines missed.
    pub overruns: u64,
    /// Minimum tick body duration [ns].
    pub min_tick_ns: u64,
    /// Maximum tick body duration [ns].
    pub max_tick_ns: u64,
    sum_tick_ns: u128,
}

impl CycleStats {
    /// Zeroed stats.
    pub const fn new() -> Self {
        Self {
            ticks: 0,
            idle_ticks: 0,
            commands_sent: 0,
            skipped_ticks: 0,
            evictions: 0,
            overruns: 0,
            min_tick_ns: u64::MAX,
            max_tick_ns: 0,
            sum_tick_ns: 0,
        }
    }

    /// Record the outcome and duration of one tick.
    #[inline]
    pub fn record(&mut self, outcome: &TickOutcome, evicted: usize, duration: Duration) {
        match outcome {
            TickOutcome::Idle => self.idle_ticks += 1,
            TickOutcome::Sent(_) => self.commands_sent += 1,
            TickOutcome::Skipped => self.skipped_ticks += 1,
        }
        self.record_failed(evicted, duration);
    }

    /// Record a tick that ended in a sink failure.
    #[inline]
    pub fn record_failed(&mut self, evicted: usize, duration: Duration) {
        let ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.ticks += 1;
        self.evictions += evicted as u64;
        self.min_tick_ns = self.min_tick_ns.min(ns);
        self.max_tick_ns = self.max_tick_ns.max(ns);
        self.sum_tick_ns += u128::from(ns);
    }

    /// Average tick body duration [ns] (0 if no ticks).
    #[inline]
    pub fn avg_tick_ns(&self) -> u64 {
        if self.ticks == 0 {
            0
        } else {
            u64::try_from(self.sum_tick_ns / u128::from(self.ticks)).unwrap_or(u64::MAX)
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Control loop errors. All of them stop the loop.
#[derive(Debug)]
pub enum CycleError {
    /// Command sink failed.
    Sink(SinkError),
    /// Interruption signal received.
    Interrupted,
    /// `run` called before a successful machine reset.
    NotReset,
    /// Operation not allowed in the current lifecycle state.
    InvalidState(&'static str),
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sink(e) => write!(f, "sink error: {e}"),
            Self::Interrupted => write!(f, "control loop interrupted"),
            Self::NotReset => write!(f, "machine reset required before start"),
            Self::InvalidState(reason) => write!(f, "invalid loop state: {reason}"),
        }
    }
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sink(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SinkError> for CycleError {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

// ─── Tick Outcome ───────────────────────────────────────────────────

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No active note; nothing sent.
    Idle,
    /// Command planned and delivered.
    Sent(MotionCommand),
    /// Registry contended; nothing aged or sent.
    Skipped,
}

// ─── Loop Handle ────────────────────────────────────────────────────

/// Cross-thread control of a running loop (signal handlers, tests).
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    shutdown: Arc<AtomicBool>,
    interrupted: Arc<AtomicBool>,
}

impl LoopHandle {
    /// Ask the loop to stop after the current tick.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Interrupt the loop (fatal).
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    /// True once an interruption was signalled.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Consume a pending shutdown request.
    fn take_shutdown(&self) -> bool {
        self.shutdown.swap(false, Ordering::SeqCst)
    }
}

// ─── Control Loop ───────────────────────────────────────────────────

/// The note-to-motion control loop.
pub struct ControlLoop {
    control: ControlConfig,
    bounds: [AxisBounds; AXIS_COUNT],
    reset_config: ResetConfig,
    registry: Arc<NoteRegistry>,
    planner: MotionPlanner,
    sink: Box<dyn CommandSink>,
    machine: LoopStateMachine,
    stats: CycleStats,
    handle: LoopHandle,
    homed: bool,
}

impl ControlLoop {
    /// Build a stopped loop from a validated configuration.
    ///
    /// The loop creates the note registry; event sources obtain it via
    /// [`ControlLoop::registry`].
    pub fn new(config: &MidibotConfig, sink: Box<dyn CommandSink>) -> Self {
        let control = config.control.clone();
        let bounds = config.axes.bounds();
        let registry = Arc::new(NoteRegistry::new(
            control.max_notes,
            control.auto_stop_ticks,
            control.lock_timeout(),
        ));
        Self {
            planner: MotionPlanner::new(bounds),
            control,
            bounds,
            reset_config: config.reset.clone(),
            registry,
            sink,
            machine: LoopStateMachine::new(),
            stats: CycleStats::new(),
            handle: LoopHandle::default(),
            homed: false,
        }
    }

    /// Shared registry for event sources.
    pub fn registry(&self) -> Arc<NoteRegistry> {
        Arc::clone(&self.registry)
    }

    /// Handle for shutdown/interrupt from other threads.
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.machine.state()
    }

    /// Statistics so far.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Motion planner (axis positions and directions).
    pub fn planner(&self) -> &MotionPlanner {
        &self.planner
    }

    /// True once a machine reset has succeeded.
    pub fn is_homed(&self) -> bool {
        self.homed
    }

    /// Machine reset: send the startup sequence, zero the axes, and drop
    /// any active notes. Only allowed while stopped.
    ///
    /// Returns the number of startup lines sent.
    pub fn reset(&mut self) -> Result<usize, CycleError> {
        if self.machine.is_running() {
            return Err(CycleError::InvalidState("reset while running"));
        }
        let sent = send_startup_sequence(self.sink.as_mut(), &self.reset_config)?;
        self.planner.reset(self.bounds);
        self.registry.clear();
        self.homed = true;
        info!("Machine reset complete, axes at origin");
        Ok(sent)
    }

    /// Execute one tick.
    ///
    /// # Errors
    /// `CycleError::Sink` if the command could not be delivered.
    pub fn tick(&mut self) -> Result<TickOutcome, CycleError> {
        let started = Instant::now();

        let report = match self.registry.snapshot_and_age() {
            Ok(report) => report,
            Err(RegistryError::Contended(timeout)) => {
                warn!(?timeout, "note registry contended, skipping tick");
                let outcome = TickOutcome::Skipped;
                self.stats.record(&outcome, 0, started.elapsed());
                return Ok(outcome);
            }
        };

        for note in &report.evicted {
            warn!(
                %note,
                "note auto-stopped: no note-off within {} ticks",
                self.control.auto_stop_ticks
            );
        }

        let outcome = match self
            .planner
            .plan_notes(&report.survivors, self.control.play_length)
        {
            None => {
                trace!("idle tick");
                TickOutcome::Idle
            }
            Some(command) => {
                let line = command.encode();
                debug!(notes = ?report.survivors.as_slice(), "{line}");
                if let Err(e) = self.sink.send(&line) {
                    self.stats
                        .record_failed(report.evicted.len(), started.elapsed());
                    return Err(e.into());
                }
                TickOutcome::Sent(command)
            }
        };

        self.stats
            .record(&outcome, report.evicted.len(), started.elapsed());
        Ok(outcome)
    }

    /// Run ticks on the configured period until shutdown or interruption.
    ///
    /// # Errors
    /// - `CycleError::NotReset` if no reset has succeeded.
    /// - `CycleError::InvalidState` if already running.
    /// - `CycleError::Interrupted` on interruption (sink disconnected).
    /// - `CycleError::Sink` on delivery failure (sink disconnected).
    pub fn run(&mut self) -> Result<(), CycleError> {
        if !self.homed {
            return Err(CycleError::NotReset);
        }
        if let TransitionResult::Rejected(reason) = self.machine.handle_event(LoopEvent::Start) {
            return Err(CycleError::InvalidState(reason));
        }

        let period = self.control.tick_period();
        info!(
            "Control loop started: period={}ms, max_notes={}, auto_stop={} ticks, sink='{}'",
            period.as_millis(),
            self.registry.capacity(),
            self.registry.auto_stop_ticks(),
            self.sink.name(),
        );

        let result = self.run_ticks(period);

        match &result {
            Ok(()) => {
                self.machine.handle_event(LoopEvent::Shutdown);
                info!("Control loop stopped");
            }
            Err(e) => {
                self.machine.handle_event(LoopEvent::Interrupt);
                error!("Control loop aborted: {e}");
                if let Err(e) = self.sink.disconnect() {
                    warn!("Sink disconnect failed: {e}");
                }
            }
        }
        self.log_stats();
        result
    }

    fn run_ticks(&mut self, period: Duration) -> Result<(), CycleError> {
        let mut next_wake = Instant::now();
        loop {
            if self.handle.is_interrupted() {
                return Err(CycleError::Interrupted);
            }
            if self.handle.take_shutdown() {
                return Ok(());
            }

            self.tick()?;

            let interval = self.control.stats_interval;
            if interval > 0 && self.stats.ticks % interval == 0 {
                self.log_stats();
            }

            next_wake += period;
            let now = Instant::now();
            if next_wake <= now {
                self.stats.overruns += 1;
                warn!(
                    "Tick overrun: {}µs behind schedule",
                    (now - next_wake).as_micros()
                );
                next_wake = now;
                continue;
            }
            self.sleep_until(next_wake);
        }
    }

    /// Sleep in slices so flags are observed promptly on long periods.
    fn sleep_until(&self, deadline: Instant) {
        loop {
            let now = Instant::now();
            if now >= deadline
                || self.handle.is_interrupted()
                || self.handle.shutdown_requested()
            {
                return;
            }
            thread::sleep((deadline - now).min(MAX_SLEEP_SLICE));
        }
    }

    fn log_stats(&self) {
        let s = &self.stats;
        debug!(
            "Loop stats: ticks={} sent={} idle={} skipped={} evicted={} overruns={} tick min/avg/max={}/{}/{}ns",
            s.ticks,
            s.commands_sent,
            s.idle_ticks,
            s.skipped_ticks,
            s.evictions,
            s.overruns,
            if s.ticks == 0 { 0 } else { s.min_tick_ns },
            s.avg_tick_ns(),
            s.max_tick_ns,
        );
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
