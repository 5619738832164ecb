// jobrun Core - Job entities, ports and the synchronous execution kernel
// NO infrastructure dependencies (hexagonal layout)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{ExecutionKernel, Executor, JobRegistry, KernelConfig, PerformOutcome};
pub use domain::{Argument, Job, JobData, JobError, Options};
pub use error::{AppError, Result};
pub use port::Performer;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
