//! Run state tracking for the session supervisor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::debug;

/// Lifecycle state of a supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    Initializing = 1,
    Ready = 2,
    Running = 3,
    Completing = 4,
    Disposed = 5,
    Failed = 6,
}

impl RunState {
    /// Whether a run currently owns the engine.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Initializing | Self::Ready | Self::Running | Self::Completing
        )
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Initializing,
            2 => Self::Ready,
            3 => Self::Running,
            4 => Self::Completing,
            5 => Self::Disposed,
            _ => Self::Failed,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Completing => "completing",
            Self::Disposed => "disposed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Atomically inspected run state.
#[derive(Debug)]
pub(crate) struct StateCell {
    value: AtomicU8,
}

impl StateCell {
    pub(crate) fn new(state: RunState) -> Self {
        Self {
            value: AtomicU8::new(state as u8),
        }
    }

    pub(crate) fn get(&self) -> RunState {
        RunState::from_u8(self.value.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: RunState) {
        let previous = RunState::from_u8(self.value.swap(state as u8, Ordering::AcqRel));
        if previous != state {
            debug!(from = %previous, to = %state, "Supervisor state transition");
        }
    }

    /// Claims the engine for a new run, moving to `Initializing`.
    ///
    /// Returns the state that blocked the claim if a run is in flight.
    pub(crate) fn begin(&self) -> Result<FlightGuard<'_>, RunState> {
        let mut current = self.value.load(Ordering::Acquire);
        loop {
            let state = RunState::from_u8(current);
            if state.is_in_flight() {
                return Err(state);
            }
            match self.value.compare_exchange(
                current,
                RunState::Initializing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    debug!(from = %state, to = %RunState::Initializing, "Supervisor state transition");
                    return Ok(FlightGuard { cell: self });
                }
                Err(actual) => current = actual,
            }
        }
    }
}

/// Returns the supervisor to `Idle` if a run is abandoned mid-flight.
#[derive(Debug)]
pub(crate) struct FlightGuard<'a> {
    cell: &'a StateCell,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.cell.get().is_in_flight() {
            self.cell.set(RunState::Idle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_claims_from_idle() {
        let cell = StateCell::new(RunState::Idle);
        let guard = cell.begin().unwrap();
        assert_eq!(cell.get(), RunState::Initializing);
        assert_eq!(cell.begin().unwrap_err(), RunState::Initializing);
        drop(guard);
        assert_eq!(cell.get(), RunState::Idle);
    }

    #[test]
    fn test_begin_rejected_while_running() {
        let cell = StateCell::new(RunState::Running);
        assert_eq!(cell.begin().unwrap_err(), RunState::Running);
    }

    #[test]
    fn test_begin_allowed_after_failure_or_disposal() {
        for state in [RunState::Failed, RunState::Disposed] {
            let cell = StateCell::new(state);
            assert!(cell.begin().is_ok());
        }
    }

    #[test]
    fn test_guard_keeps_terminal_states() {
        let cell = StateCell::new(RunState::Idle);
        let guard = cell.begin().unwrap();
        cell.set(RunState::Failed);
        drop(guard);
        assert_eq!(cell.get(), RunState::Failed);
    }

    #[test]
    fn test_in_flight_states() {
        assert!(RunState::Running.is_in_flight());
        assert!(RunState::Completing.is_in_flight());
        assert!(!RunState::Idle.is_in_flight());
        assert!(!RunState::Failed.is_in_flight());
        assert_eq!(RunState::Running.to_string(), "running");
    }
}
