//! Layered error definitions
//!
//! Categorized by source: config / collaborator / frame / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Collaborator Errors =====
    /// Collaborator could not be made ready (camera missing, preset unreadable, ...)
    #[error("'{collaborator}' unavailable: {message}")]
    Unavailable {
        collaborator: String,
        message: String,
    },

    /// Per-frame detection / classification failure
    #[error("detection error: {message}")]
    Detection { message: String },

    /// Frame read failure
    #[error("frame source '{source_name}' read error: {message}")]
    FrameRead {
        source_name: String,
        message: String,
    },

    /// Frame buffer does not match its declared geometry
    #[error("invalid frame: {message}")]
    InvalidFrame { message: String },

    // ===== Sink Errors =====
    /// Render sink error
    #[error("render sink '{sink_name}' error: {message}")]
    Render { sink_name: String, message: String },

    /// Actuator sink error
    #[error("actuator '{sink_name}' error: {message}")]
    Actuator { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create collaborator unavailable error
    pub fn unavailable(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }

    /// Create detection error
    pub fn detection(message: impl Into<String>) -> Self {
        Self::Detection {
            message: message.into(),
        }
    }

    /// Create frame read error
    pub fn frame_read(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FrameRead {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create invalid frame error
    pub fn invalid_frame(message: impl Into<String>) -> Self {
        Self::InvalidFrame {
            message: message.into(),
        }
    }

    /// Create render error
    pub fn render(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create actuator error
    pub fn actuator(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Actuator {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
