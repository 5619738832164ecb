// Job Domain Model

use crate::domain::arguments::ArgumentStore;
use crate::domain::error::ArgumentError;
use crate::domain::job_data::{JobData, DEFAULT_QUEUE_NAME};
use serde::{Deserialize, Serialize};

/// Job ID (UUID v4 unless injected)
pub type JobId = String;

/// Name of the concrete job variant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobClass(String);

impl JobClass {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job Entity
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub job_class: JobClass,
    pub queue_name: String,
    pub priority: Option<i32>,

    /// Number of times `perform_now` has run this job. `None` for jobs
    /// that were serialized before executions were counted.
    pub executions: Option<u32>,

    pub arguments: ArgumentStore,
}

impl Job {
    /// Create a new Job
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `job_class` - Name of the job variant
    /// * `arguments` - Serialized or materialized arguments
    pub fn new(
        id: impl Into<String>,
        job_class: JobClass,
        arguments: impl Into<ArgumentStore>,
    ) -> Self {
        Self {
            id: id.into(),
            job_class,
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            priority: None,
            executions: None,
            arguments: arguments.into(),
        }
    }

    /// Create a test job with a deterministic ID (test-1, test-2, ...).
    ///
    /// **Note**: production code should inject IDs through an `IdProvider`.
    pub fn new_test(job_class: impl Into<String>, arguments: impl Into<ArgumentStore>) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        Self::new(
            format!("test-{}", counter),
            JobClass::new(job_class),
            arguments,
        )
    }

    pub fn with_queue(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = queue_name.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_executions(mut self, executions: Option<u32>) -> Self {
        self.executions = executions;
        self
    }

    /// Count one more execution, treating an absent counter as zero
    pub fn record_execution(&mut self) -> u32 {
        let next = self.executions.unwrap_or(0).saturating_add(1);
        self.executions = Some(next);
        next
    }

    /// Rebuild a job from its serialized payload. Arguments stay serialized
    /// until the kernel materializes them.
    pub fn from_job_data(data: &JobData) -> Self {
        Self {
            id: data.job_id.clone(),
            job_class: JobClass::new(data.job_class.clone()),
            queue_name: data.queue_name.clone(),
            priority: data.priority,
            executions: data.executions,
            arguments: ArgumentStore::serialized(data.arguments.clone()),
        }
    }

    /// Serialize the job back into its payload form
    pub fn to_job_data(&self) -> Result<JobData, ArgumentError> {
        Ok(JobData {
            job_class: self.job_class.as_str().to_string(),
            job_id: self.id.clone(),
            queue_name: self.queue_name.clone(),
            priority: self.priority,
            arguments: self.arguments.serialize()?,
            executions: self.executions,
        })
    }
}
