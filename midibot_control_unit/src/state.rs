//! Control loop lifecycle: Stopped ↔ Running.
//!
//! The loop starts Stopped and only enters Running through an explicit
//! start after machine reset. Running returns to Stopped on an explicit
//! shutdown or on an interruption; the latter is fatal to the loop.

/// Control loop lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum LoopState {
    /// Not ticking. Initial state.
    #[default]
    Stopped = 0,
    /// Ticking on the fixed period.
    Running = 1,
}

/// Event that can trigger a lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// Prerequisites met, begin ticking.
    Start,
    /// Explicit shutdown request.
    Shutdown,
    /// Interruption signal (fatal, not retried).
    Interrupt,
}

/// Result of a transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded, with the new state.
    Ok(LoopState),
    /// Transition rejected, with the reason.
    Rejected(&'static str),
}

/// Lifecycle manager holding the current state.
#[derive(Debug, Clone, Default)]
pub struct LoopStateMachine {
    state: LoopState,
}

impl LoopStateMachine {
    /// New machine in `Stopped`.
    pub const fn new() -> Self {
        Self {
            state: LoopState::Stopped,
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// True while ticking.
    #[inline]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running)
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: LoopEvent) -> TransitionResult {
        use LoopEvent::*;
        use LoopState::*;

        let next = match (self.state, event) {
            (Stopped, Start) => Running,
            (Running, Shutdown) | (Running, Interrupt) => Stopped,
            (Running, Start) => return TransitionResult::Rejected("loop already running"),
            (Stopped, Shutdown) | (Stopped, Interrupt) => {
                return TransitionResult::Rejected("loop not running");
            }
        };

        self.state = next;
        TransitionResult::Ok(next)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
