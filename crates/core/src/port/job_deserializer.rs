// Job Deserializer Port
// Turns a serialized payload into a job that is ready for perform_now

use crate::application::kernel::ExecutionKernel;
use crate::domain::{Argument, Job, JobData, JobError, JobId};
use crate::port::Performer;
use std::sync::Arc;

/// A deserialized job together with the variant that runs it
pub struct ResolvedJob {
    pub job: Job,
    pub performer: Box<dyn Performer>,
    pub kernel: Arc<ExecutionKernel>,
}

/// Job Deserializer trait
///
/// Implementations:
/// - JobRegistry: looks the job class up in an in-memory table
pub trait JobDeserializer: Send + Sync {
    /// Reconstruct a job from its payload
    ///
    /// # Errors
    /// - JobError::UnknownJobClass if no variant is registered for the class
    ///
    /// Argument problems are not reported here; arguments stay serialized
    /// until the kernel materializes them.
    fn deserialize(&self, data: &JobData) -> Result<ResolvedJob, JobError>;

    /// Build a brand-new job of `job_class` from in-memory arguments
    ///
    /// # Errors
    /// - JobError::UnknownJobClass if no variant is registered for the class
    fn instantiate(
        &self,
        job_id: JobId,
        job_class: &str,
        arguments: Vec<Argument>,
    ) -> Result<ResolvedJob, JobError>;
}
