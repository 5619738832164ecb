// Job Registry - in-memory table of job variants, used as the deserializer

use crate::application::kernel::ExecutionKernel;
use crate::domain::{Argument, ArgumentStore, Job, JobClass, JobData, JobError, JobId};
use crate::port::{JobDeserializer, Performer, ResolvedJob};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type PerformerFactory = Box<dyn Fn() -> Box<dyn Performer> + Send + Sync>;

/// A registered job variant
struct JobVariant {
    kernel: Arc<ExecutionKernel>,
    factory: PerformerFactory,
}

/// Maps job class names to their kernel and performer factory
#[derive(Default)]
pub struct JobRegistry {
    variants: HashMap<JobClass, JobVariant>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variant. Registering the same class twice replaces it.
    pub fn register<F, P>(
        &mut self,
        job_class: impl Into<String>,
        kernel: impl Into<Arc<ExecutionKernel>>,
        factory: F,
    ) -> &mut Self
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: Performer + 'static,
    {
        let job_class = JobClass::new(job_class);
        debug!(job_class = %job_class, "Registering job variant");
        self.variants.insert(
            job_class,
            JobVariant {
                kernel: kernel.into(),
                factory: Box::new(move || Box::new(factory()) as Box<dyn Performer>),
            },
        );
        self
    }

    pub fn contains(&self, job_class: &str) -> bool {
        self.variants.contains_key(&JobClass::new(job_class))
    }

    /// Registered class names, sorted
    pub fn job_classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = self.variants.keys().map(JobClass::as_str).collect();
        classes.sort_unstable();
        classes
    }

    pub fn kernel(&self, job_class: &str) -> Option<&Arc<ExecutionKernel>> {
        self.variants
            .get(&JobClass::new(job_class))
            .map(|variant| &variant.kernel)
    }

    fn variant(&self, job_class: &JobClass) -> Result<&JobVariant, JobError> {
        self.variants
            .get(job_class)
            .ok_or_else(|| JobError::UnknownJobClass(job_class.to_string()))
    }
}

impl JobDeserializer for JobRegistry {
    fn deserialize(&self, data: &JobData) -> Result<ResolvedJob, JobError> {
        let job = Job::from_job_data(data);
        let variant = self.variant(&job.job_class)?;
        Ok(ResolvedJob {
            job,
            performer: (variant.factory)(),
            kernel: Arc::clone(&variant.kernel),
        })
    }

    fn instantiate(
        &self,
        job_id: JobId,
        job_class: &str,
        arguments: Vec<Argument>,
    ) -> Result<ResolvedJob, JobError> {
        let job_class = JobClass::new(job_class);
        let variant = self.variant(&job_class)?;
        Ok(ResolvedJob {
            job: Job::new(job_id, job_class, ArgumentStore::from(arguments)),
            performer: (variant.factory)(),
            kernel: Arc::clone(&variant.kernel),
        })
    }
}

impl std::fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRegistry")
            .field("job_classes", &self.job_classes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::performer::mocks::MockPerformer;
    use serde_json::json;

    #[test]
    fn test_deserialize_known_class() {
        let mut registry = JobRegistry::new();
        registry.register("GreetJob", ExecutionKernel::default(), MockPerformer::new_success);

        let mut data = JobData::new("GreetJob", "job-42", json!(["mike"]));
        data.executions = Some(2);
        let resolved = registry.deserialize(&data).unwrap();

        assert_eq!(resolved.job.id, "job-42");
        assert_eq!(resolved.job.executions, Some(2));
        assert!(!resolved.job.arguments.is_materialized());
    }

    #[test]
    fn test_deserialize_unknown_class() {
        let registry = JobRegistry::new();
        let data = JobData::new("MissingJob", "job-1", json!([]));

        match registry.deserialize(&data) {
            Err(JobError::UnknownJobClass(class)) => assert_eq!(class, "MissingJob"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected UnknownJobClass"),
        }
    }

    #[test]
    fn test_each_resolution_gets_a_fresh_performer_and_shared_kernel() {
        let mut registry = JobRegistry::new();
        registry.register("GreetJob", ExecutionKernel::default(), MockPerformer::new_success);

        let first = registry
            .instantiate("a".into(), "GreetJob", vec![Argument::from("x")])
            .unwrap();
        let second = registry
            .instantiate("b".into(), "GreetJob", Vec::new())
            .unwrap();

        assert!(first.job.arguments.is_materialized());
        assert!(Arc::ptr_eq(&first.kernel, &second.kernel));
        assert_eq!(registry.job_classes(), vec!["GreetJob"]);
        assert!(registry.contains("GreetJob"));
        assert!(registry.kernel("Other").is_none());
    }
}
