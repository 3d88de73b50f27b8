//! Vision error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Vision collaborator error
#[derive(Debug, Error)]
pub enum VisionError {
    /// Frame directory missing or unreadable
    #[error("cannot read frame directory '{}': {cause}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    /// Image file could not be decoded
    #[error("cannot decode image '{}': {cause}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        cause: image::ImageError,
    },

    /// Model file missing or malformed
    #[error("cannot load model '{}': {message}", path.display())]
    ModelLoad { path: PathBuf, message: String },

    /// Model is structurally unusable
    #[error("invalid model: {message}")]
    InvalidModel { message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl VisionError {
    pub fn model_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_model(message: impl Into<String>) -> Self {
        Self::InvalidModel {
            message: message.into(),
        }
    }

    /// Convert into a collaborator-unavailable error for `collaborator`
    pub fn into_unavailable(self, collaborator: &str) -> ContractError {
        match self {
            Self::Contract(e) => e,
            other => ContractError::unavailable(collaborator, other.to_string()),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, VisionError>;
