//! Error types for the playground.

use thiserror::Error;

use crate::controller::TrainingStatus;

pub type PlaygroundResult<T> = Result<T, PlaygroundError>;

#[derive(Debug, Error)]
pub enum PlaygroundError {
    /// A parameter is outside of its domain
    #[error("Invalid parameter `{field}`: {reason}")]
    InvalidParameter {
        field: &'static str,
        reason: String,
    },

    #[error("Training is already running")]
    AlreadyRunning,

    /// The requested action is not allowed from the current status
    #[error("Cannot {action} while training is {from}")]
    InvalidTransition {
        from: TrainingStatus,
        action: &'static str,
    },

    /// Only completed runs can be saved for comparison
    #[error("Cannot save model: you can only save completed models (status is {status})")]
    CannotSave {
        status: TrainingStatus,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlaygroundError {
    pub fn invalid_parameter(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Failure reported by a trainer while a run is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct TrainerError {
    pub reason: String,
}

impl TrainerError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}
