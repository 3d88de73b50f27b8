//! Dispatcher error types

use thiserror::Error;

use crate::state::DispatcherState;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// State machine rejected a transition
    #[error("illegal dispatcher transition {from} -> {to}")]
    IllegalTransition {
        from: DispatcherState,
        to: DispatcherState,
    },

    /// Dispatcher thread could not be started
    #[error("failed to spawn dispatcher thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
