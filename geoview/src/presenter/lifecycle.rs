//! Presenter lifecycle state machine

use crate::error::StateError;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenterState {
    #[default]
    Uninitialized,
    Ready,
    Running,
    Paused,
    /// Terminal
    Disposed,
}

impl fmt::Display for PresenterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PresenterState::Uninitialized => "uninitialized",
            PresenterState::Ready => "ready",
            PresenterState::Running => "running",
            PresenterState::Paused => "paused",
            PresenterState::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

/// Shared flag that outstanding work checks before touching a presenter
///
/// Set on dispose. Initialization and camera animations hold a clone and
/// no-op once it is raised.
#[derive(Debug, Clone, Default)]
pub struct DisposeSignal(Rc<Cell<bool>>);

impl DisposeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.set(true);
    }

    pub fn is_raised(&self) -> bool {
        self.0.get()
    }
}

/// Current state plus the rules for leaving it
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: PresenterState,
    disposed: DisposeSignal,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PresenterState {
        self.state
    }

    pub fn signal(&self) -> DisposeSignal {
        self.disposed.clone()
    }

    /// Dispose requested from outside, possibly while work is outstanding
    pub fn is_disposed(&self) -> bool {
        self.state == PresenterState::Disposed || self.disposed.is_raised()
    }

    /// Fail unless the presenter is live and in one of `allowed`
    pub fn require(
        &self,
        operation: &'static str,
        allowed: &[PresenterState],
    ) -> Result<(), StateError> {
        if self.is_disposed() {
            return Err(StateError::Disposed);
        }
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(StateError::InvalidTransition {
                operation,
                state: self.state,
            })
        }
    }

    /// Fail if disposed
    pub fn require_live(&self) -> Result<(), StateError> {
        if self.is_disposed() {
            Err(StateError::Disposed)
        } else {
            Ok(())
        }
    }

    fn transition(
        &mut self,
        operation: &'static str,
        allowed: &[PresenterState],
        to: PresenterState,
    ) -> Result<PresenterState, StateError> {
        self.require(operation, allowed)?;
        let from = std::mem::replace(&mut self.state, to);
        debug!(operation, %from, %to, "Presenter state changed");
        Ok(from)
    }

    pub fn initialized(&mut self) -> Result<PresenterState, StateError> {
        self.transition(
            "initialize",
            &[PresenterState::Uninitialized],
            PresenterState::Ready,
        )
    }

    pub fn start(&mut self) -> Result<PresenterState, StateError> {
        self.transition("start", &[PresenterState::Ready], PresenterState::Running)
    }

    pub fn pause(&mut self) -> Result<PresenterState, StateError> {
        self.transition("pause", &[PresenterState::Running], PresenterState::Paused)
    }

    pub fn resume(&mut self) -> Result<PresenterState, StateError> {
        self.transition("resume", &[PresenterState::Paused], PresenterState::Running)
    }

    pub fn stop(&mut self) -> Result<PresenterState, StateError> {
        self.transition(
            "stop",
            &[PresenterState::Running, PresenterState::Paused],
            PresenterState::Ready,
        )
    }

    /// Any live state → Disposed; disposing twice is an error
    pub fn dispose(&mut self) -> Result<PresenterState, StateError> {
        if self.state == PresenterState::Disposed {
            return Err(StateError::Disposed);
        }
        self.disposed.raise();
        let from = std::mem::replace(&mut self.state, PresenterState::Disposed);
        debug!(%from, "Presenter disposed");
        Ok(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.initialized().unwrap();
        lifecycle.start().unwrap();
        lifecycle.pause().unwrap();
        lifecycle.resume().unwrap();
        lifecycle.stop().unwrap();
        assert_eq!(lifecycle.state(), PresenterState::Ready);
        lifecycle.start().unwrap();
        lifecycle.dispose().unwrap();
        assert_eq!(lifecycle.state(), PresenterState::Disposed);
    }

    #[test]
    fn test_invalid_transition_keeps_state() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(
            lifecycle.pause(),
            Err(StateError::InvalidTransition {
                operation: "pause",
                state: PresenterState::Uninitialized,
            })
        );
        assert!(lifecycle.start().is_err());
        assert!(lifecycle.stop().is_err());
        assert_eq!(lifecycle.state(), PresenterState::Uninitialized);
    }

    #[test]
    fn test_disposed_is_terminal() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.dispose().unwrap();
        assert_eq!(lifecycle.initialized(), Err(StateError::Disposed));
        assert_eq!(lifecycle.start(), Err(StateError::Disposed));
        assert_eq!(lifecycle.dispose(), Err(StateError::Disposed));
        assert_eq!(lifecycle.state(), PresenterState::Disposed);
    }

    #[test]
    fn test_raised_signal_blocks_transitions() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.signal().raise();
        assert!(lifecycle.is_disposed());
        assert_eq!(lifecycle.initialized(), Err(StateError::Disposed));
        assert_eq!(lifecycle.state(), PresenterState::Uninitialized);
    }
}
