// Central Error Type for the Application

use thiserror::Error;

/// Errors raised while setting the application up (configuration loading).
/// Failures of a running job are `JobError`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
