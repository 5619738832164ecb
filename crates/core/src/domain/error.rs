// Domain Error Types

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Error raised by a concrete job's own code (perform body or its hooks)
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failures while converting arguments between serialized and in-memory form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Serialized arguments must be a JSON array, got {0}")]
    NotAnArray(String),

    #[error("Argument map uses reserved key: {0}")]
    ReservedKey(String),

    #[error("Unsupported numeric argument: {0}")]
    UnsupportedNumber(String),

    #[error("Arguments have not been materialized")]
    NotMaterialized,
}

/// Everything that can go wrong while executing a single job
#[derive(Error, Debug)]
pub enum JobError {
    #[error("perform is not implemented for this job")]
    NotImplemented,

    #[error("Argument error: {0}")]
    Argument(#[from] ArgumentError),

    /// Raised by user code. The original error is kept as-is so callers
    /// can downcast it.
    #[error("{0}")]
    Perform(#[source] BoxError),

    #[error("Job panicked: {0}")]
    Panicked(String),

    /// A hook broke the chain contract (e.g. called `next` twice)
    #[error("Callback error: {0}")]
    Callback(String),

    #[error("Unknown job class: {0}")]
    UnknownJobClass(String),

    #[error("Invalid job data: {0}")]
    Deserialization(String),
}

impl JobError {
    /// Wrap an error raised by a concrete job
    pub fn perform(err: impl Into<BoxError>) -> Self {
        JobError::Perform(err.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::NotImplemented => ErrorKind::NotImplemented,
            JobError::Argument(_) => ErrorKind::Argument,
            JobError::Perform(_) => ErrorKind::Perform,
            JobError::Panicked(_) => ErrorKind::Panicked,
            JobError::Callback(_) => ErrorKind::Callback,
            JobError::UnknownJobClass(_) | JobError::Deserialization(_) => {
                ErrorKind::Deserialization
            }
        }
    }

    /// The user error carried by `Perform`, if any
    pub fn user_error(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            JobError::Perform(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Downcast the user error carried by `Perform`
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.user_error().and_then(|err| err.downcast_ref::<E>())
    }
}

impl From<serde_json::Error> for JobError {
    fn from(err: serde_json::Error) -> Self {
        JobError::Deserialization(err.to_string())
    }
}

/// Coarse classification of a `JobError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotImplemented,
    Argument,
    Perform,
    Panicked,
    Callback,
    Deserialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotImplemented => write!(f, "NOT_IMPLEMENTED"),
            ErrorKind::Argument => write!(f, "ARGUMENT"),
            ErrorKind::Perform => write!(f, "PERFORM"),
            ErrorKind::Panicked => write!(f, "PANICKED"),
            ErrorKind::Callback => write!(f, "CALLBACK"),
            ErrorKind::Deserialization => write!(f, "DESERIALIZATION"),
        }
    }
}
