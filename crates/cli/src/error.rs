//! Error types for CLI operations.

use contracts::SourceId;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration invalid after applying CLI overrides
    #[error("Configuration invalid after overrides: {message}")]
    Override { message: String },

    /// A source could not be built or started; nothing was left running
    #[error("Source {source_id} failed to start: {message}")]
    SourceStart { source_id: SourceId, message: String },

    /// The dispatcher thread could not be started or joined
    #[error("Dispatcher failed: {message}")]
    Dispatcher { message: String },

    /// The line stopped, but something panicked on the way
    #[error("Line stopped with {count} panic(s): {first}")]
    Panicked { count: usize, first: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn override_invalid(message: impl Into<String>) -> Self {
        Self::Override {
            message: message.into(),
        }
    }

    pub fn source_start(source_id: SourceId, message: impl Into<String>) -> Self {
        Self::SourceStart {
            source_id,
            message: message.into(),
        }
    }

    pub fn dispatcher(message: impl Into<String>) -> Self {
        Self::Dispatcher {
            message: message.into(),
        }
    }
}
