/// Monitor thread lifecycle
///
/// `Stopped -> Starting -> Running { since } -> Stopping -> Stopped`
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ProcessState {
    /// No monitor thread
    #[default]
    Stopped,

    /// Thread spawned, first tick not yet run
    Starting,

    /// Polling
    Running { since: Instant },

    /// Stop requested, thread finishing its last tick
    Stopping,
}

impl ProcessState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, ProcessState::Stopped)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ProcessState::Running { .. })
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self, ProcessState::Starting | ProcessState::Stopping)
    }

    /// Time since polling began (if running)
    pub fn running_duration(&self) -> Option<Duration> {
        match self {
            ProcessState::Running { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProcessState::Stopped => "Stopped",
            ProcessState::Starting => "Starting...",
            ProcessState::Running { .. } => "Running",
            ProcessState::Stopping => "Stopping...",
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Monitor is already running")]
    AlreadyRunning,

    #[error("Monitor is already stopped")]
    AlreadyStopped,

    #[error("Cannot perform action during state transition")]
    InTransition,
}

/// Lifecycle state shared between the monitor thread and its handle
///
/// Every successful transition returns the `(old, new)` pair so the caller
/// can publish it.
#[derive(Clone, Default)]
pub struct ProcessStateMachine {
    state: Arc<RwLock<ProcessState>>,
}

impl ProcessStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ProcessState {
        *self.state.read()
    }

    fn transition(
        &self,
        apply: impl FnOnce(ProcessState) -> Result<ProcessState, TransitionError>,
    ) -> Result<(ProcessState, ProcessState), TransitionError> {
        let mut state = self.state.write();
        let old = *state;
        let new = apply(old)?;
        *state = new;
        Ok((old, new))
    }

    /// Stopped -> Starting
    pub fn start(&self) -> Result<(ProcessState, ProcessState), TransitionError> {
        self.transition(|state| match state {
            ProcessState::Stopped => Ok(ProcessState::Starting),
            ProcessState::Running { .. } => Err(TransitionError::AlreadyRunning),
            _ => Err(TransitionError::InTransition),
        })
    }

    /// Starting -> Running
    pub fn mark_running(&self) -> Result<(ProcessState, ProcessState), TransitionError> {
        self.transition(|state| match state {
            ProcessState::Starting => Ok(ProcessState::Running {
                since: Instant::now(),
            }),
            _ => Err(TransitionError::InTransition),
        })
    }

    /// Running -> Stopping
    pub fn stop(&self) -> Result<(ProcessState, ProcessState), TransitionError> {
        self.transition(|state| match state {
            ProcessState::Running { .. } => Ok(ProcessState::Stopping),
            ProcessState::Stopped => Err(TransitionError::AlreadyStopped),
            _ => Err(TransitionError::InTransition),
        })
    }

    /// Stopping -> Stopped
    pub fn mark_stopped(&self) -> Result<(ProcessState, ProcessState), TransitionError> {
        self.transition(|state| match state {
            ProcessState::Stopping => Ok(ProcessState::Stopped),
            _ => Err(TransitionError::InTransition),
        })
    }

    /// Force stop (thread died or failed to spawn)
    pub fn force_stop(&self) -> (ProcessState, ProcessState) {
        let mut state = self.state.write();
        let old = *state;
        *state = ProcessState::Stopped;
        (old, ProcessState::Stopped)
    }
}
