//! Dispatcher lifecycle: RUNNING -> STOPPING -> CLOSED

use std::fmt;

use crate::error::DispatcherError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Routing events; no stop raised yet
    Running,
    /// Stop raised; still routing until every worker has terminated
    Stopping,
    /// Workers joined, queue drained, sinks released. Terminal.
    Closed,
}

impl DispatcherState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Closed => "closed",
        }
    }

    fn can_move_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Running, Self::Stopping) | (Self::Stopping, Self::Closed)
        )
    }
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state plus every state visited, in order
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: DispatcherState,
    trail: Vec<DispatcherState>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: DispatcherState::Running,
            trail: vec![DispatcherState::Running],
        }
    }

    pub fn current(&self) -> DispatcherState {
        self.current
    }

    pub fn trail(&self) -> &[DispatcherState] {
        &self.trail
    }

    /// Move to `next`
    ///
    /// # Errors
    /// `IllegalTransition` for anything but RUNNING -> STOPPING -> CLOSED;
    /// the state is left unchanged.
    pub fn transition(&mut self, next: DispatcherState) -> Result<(), DispatcherError> {
        if !self.current.can_move_to(next) {
            return Err(DispatcherError::IllegalTransition {
                from: self.current,
                to: next,
            });
        }
        self.current = next;
        self.trail.push(next);
        Ok(())
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
