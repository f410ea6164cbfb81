//! Recording session state machine

use std::fmt;
use thiserror::Error;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Paused,
    Stopping,
    Finished,
    Failed,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// Recording session lifecycle.
///
/// State machine:
///   IDLE -> RECORDING (begin)
///   RECORDING -> PAUSED (pause)
///   PAUSED -> RECORDING (resume)
///   RECORDING | PAUSED -> STOPPING (begin_stop)
///   STOPPING -> FINISHED (finish)
///   RECORDING | PAUSED -> FAILED (cancel)
///   any non-terminal -> FAILED (fail)
#[derive(Debug, Default)]
pub struct SessionLifecycle {
    state: SessionState,
}

impl SessionLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    /// Finished or Failed
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, SessionState::Finished | SessionState::Failed)
    }

    fn transition(
        &mut self,
        allowed: &[SessionState],
        next: SessionState,
        action: &str,
    ) -> Result<(), InvalidStateTransition> {
        if !allowed.contains(&self.state) {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }

    /// Transition from IDLE to RECORDING
    pub fn begin(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(&[SessionState::Idle], SessionState::Recording, "start recording")
    }

    /// Transition from RECORDING to PAUSED
    pub fn pause(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(&[SessionState::Recording], SessionState::Paused, "pause")
    }

    /// Transition from PAUSED to RECORDING
    pub fn resume(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(&[SessionState::Paused], SessionState::Recording, "resume")
    }

    /// Transition from RECORDING or PAUSED to STOPPING
    pub fn begin_stop(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[SessionState::Recording, SessionState::Paused],
            SessionState::Stopping,
            "stop",
        )
    }

    /// Transition from STOPPING to FINISHED
    pub fn finish(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(&[SessionState::Stopping], SessionState::Finished, "finish")
    }

    /// Discard a live recording. Unlike `fail`, only a running or paused
    /// session can be cancelled.
    pub fn cancel(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[SessionState::Recording, SessionState::Paused],
            SessionState::Failed,
            "cancel",
        )
    }

    /// Any non-terminal state may fail. Failing twice is a no-op.
    pub fn fail(&mut self) {
        if self.state != SessionState::Finished {
            self.state = SessionState::Failed;
        }
    }
}
