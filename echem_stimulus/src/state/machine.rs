//! Run-state transitions.
//!
//! `Idle → Running ⇄ Paused → Idle`. Illegal requests are rejected with a
//! reason and leave the state untouched; they are never errors.

use echem_common::state::RunState;

/// Result of a run-state transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded with the new state.
    Ok(RunState),
    /// Transition rejected with a reason.
    Rejected(&'static str),
}

impl TransitionResult {
    /// The transition was applied.
    #[inline]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// Operator request that can change the run-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    /// Arm outputs and start the waveform.
    Start,
    /// Freeze the waveform.
    Pause,
    /// Continue a frozen waveform.
    Resume,
    /// Disarm outputs.
    Stop,
}

/// Holder of the current run-state.
#[derive(Debug, Clone, Default)]
pub struct RunStateMachine {
    state: RunState,
}

impl RunStateMachine {
    /// Create a state machine in `Idle`.
    pub const fn new() -> Self {
        Self {
            state: RunState::Idle,
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Check whether `event` is legal in the current state without applying it.
    pub fn check(&self, event: RunEvent) -> TransitionResult {
        use RunEvent::*;
        use RunState::*;

        match (self.state, event) {
            (Idle, Start) => TransitionResult::Ok(Running),
            (Running, Pause) => TransitionResult::Ok(Paused),
            (Paused, Resume) => TransitionResult::Ok(Running),
            (Running | Paused, Stop) => TransitionResult::Ok(Idle),
            _ => TransitionResult::Rejected(rejection_reason(self.state, event)),
        }
    }

    /// Attempt a transition given an event.
    ///
    /// Returns `TransitionResult::Ok(new_state)` on success,
    /// `TransitionResult::Rejected(reason)` if the transition is not valid.
    pub fn handle_event(&mut self, event: RunEvent) -> TransitionResult {
        let result = self.check(event);
        if let TransitionResult::Ok(next) = result {
            self.state = next;
        }
        result
    }

    /// Configuration (mode, parameters) may be changed.
    #[inline]
    pub const fn allows_configuration(&self) -> bool {
        matches!(self.state, RunState::Idle)
    }
}

fn rejection_reason(state: RunState, event: RunEvent) -> &'static str {
    use RunEvent::*;
    use RunState::*;
    match (state, event) {
        (Idle, _) => "Idle: only Start allowed",
        (Running, Start) => "Running: already started",
        (Running, Resume) => "Running: not paused",
        (Paused, Start) => "Paused: use Resume or Stop",
        (Paused, Pause) => "Paused: already paused",
        (Running | Paused, _) => "invalid event for current state",
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
