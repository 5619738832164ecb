// Domain Layer - Pure job entities and argument handling

pub mod arguments;
pub mod error;
pub mod job;
pub mod job_data;

// Re-exports
pub use arguments::{extract_trailing_options, Argument, ArgumentStore, Options};
pub use error::{ArgumentError, BoxError, ErrorKind, JobError};
pub use job::{Job, JobClass, JobId};
pub use job_data::JobData;
