// Executor - entry point for serialized jobs

use crate::application::callbacks::{CallbackChain, ChainOutcome};
use crate::application::kernel::constants::EXECUTE_PHASE;
use crate::application::kernel::PerformOutcome;
use crate::application::registry::JobRegistry;
use crate::domain::{Argument, JobData, JobError, JobId};
use crate::port::id_provider::UuidProvider;
use crate::port::{IdProvider, JobDeserializer, ResolvedJob};
use std::sync::Arc;
use tracing::{info, warn};

/// Executor
///
/// Wraps deserialize + perform_now in the `execute` phase callbacks. The
/// execute hooks are shared by every job the executor runs.
pub struct Executor {
    deserializer: Arc<dyn JobDeserializer>,
    callbacks: CallbackChain<JobData>,
    id_provider: Arc<dyn IdProvider>,
}

impl Executor {
    pub fn new(deserializer: Arc<dyn JobDeserializer>) -> Self {
        Self {
            deserializer,
            callbacks: CallbackChain::new(EXECUTE_PHASE),
            id_provider: Arc::new(UuidProvider),
        }
    }

    pub fn with_id_provider(mut self, id_provider: Arc<dyn IdProvider>) -> Self {
        self.id_provider = id_provider;
        self
    }

    pub fn callbacks(&self) -> &CallbackChain<JobData> {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut CallbackChain<JobData> {
        &mut self.callbacks
    }

    /// Deserialize and perform one job inside the execute callbacks.
    ///
    /// Failures before the job exists (unknown class) skip the job's rescue
    /// handlers and are returned as-is.
    pub fn execute(&self, job_data: JobData) -> Result<PerformOutcome, JobError> {
        let mut job_data = job_data;
        let mut performed = None;

        let outcome = self.callbacks.run(&mut job_data, |data| {
            let ResolvedJob {
                mut job,
                mut performer,
                kernel,
            } = self.deserializer.deserialize(data)?;
            performed = Some(kernel.perform_now(&mut job, performer.as_mut())?);
            Ok(())
        });

        match (outcome, performed) {
            (ChainOutcome::Completed, Some(result)) => Ok(result),
            (ChainOutcome::Failed(err), _) => Err(err),
            _ => {
                warn!(
                    job_id = %job_data.job_id,
                    job_class = %job_data.job_class,
                    "Execute chain was halted by a callback"
                );
                Ok(PerformOutcome::Halted)
            }
        }
    }

    /// Parse a JSON payload and execute it
    pub fn execute_json(&self, payload: &str) -> Result<PerformOutcome, JobError> {
        self.execute(JobData::from_json(payload)?)
    }

    /// Instantiate `job_class` with `arguments` and perform it right away,
    /// outside the execute callbacks. The job id comes from the id provider.
    pub fn perform_now(
        &self,
        job_class: &str,
        arguments: Vec<Argument>,
    ) -> Result<PerformOutcome, JobError> {
        self.perform_now_as(self.next_job_id(), job_class, arguments)
    }

    /// Same as `perform_now`, with a caller-chosen job id
    pub fn perform_now_as(
        &self,
        job_id: JobId,
        job_class: &str,
        arguments: Vec<Argument>,
    ) -> Result<PerformOutcome, JobError> {
        info!(job_id = %job_id, job_class = %job_class, "Instantiating job for immediate perform");

        let ResolvedJob {
            mut job,
            mut performer,
            kernel,
        } = self.deserializer.instantiate(job_id, job_class, arguments)?;
        kernel.perform_now(&mut job, performer.as_mut())
    }

    pub fn next_job_id(&self) -> JobId {
        self.id_provider.generate_id()
    }
}

impl From<JobRegistry> for Executor {
    fn from(registry: JobRegistry) -> Self {
        Executor::new(Arc::new(registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::callbacks::Flow;
    use crate::application::kernel::ExecutionKernel;
    use crate::port::id_provider::SequentialIdProvider;
    use crate::port::performer::mocks::MockPerformer;
    use serde_json::json;
    use std::sync::Mutex;

    fn executor_with(performer: MockPerformer) -> Executor {
        let mut registry = JobRegistry::new();
        registry.register("GreetJob", ExecutionKernel::default(), move || performer.clone());
        Executor::from(registry)
    }

    #[test]
    fn test_execute_performs_deserialized_job() {
        let performer = MockPerformer::new_success();
        let executor = executor_with(performer.clone());

        let outcome = executor
            .execute(JobData::new("GreetJob", "job-1", json!(["mike", {"priority": "high"}])))
            .unwrap();

        assert!(outcome.is_success());
        let calls = performer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, vec![Argument::from("mike")]);
        assert!(calls[0].options.is_some());
    }

    #[test]
    fn test_execute_hooks_wrap_the_whole_run() {
        let performer = MockPerformer::new_success();
        let mut executor = executor_with(performer.clone());
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));

        let around_seen = seen.clone();
        executor.callbacks_mut().around(move |data, next| {
            around_seen.lock().unwrap().push(format!("enter:{}", data.job_id));
            let result = next(data);
            around_seen.lock().unwrap().push("exit".to_string());
            result
        });

        executor
            .execute(JobData::new("GreetJob", "job-7", json!([])))
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["enter:job-7", "exit"]);
        assert_eq!(performer.call_count(), 1);
    }

    #[test]
    fn test_halted_execute_chain_skips_deserialization() {
        let mut executor = executor_with(MockPerformer::new_success());
        executor.callbacks_mut().before(|_| Ok(Flow::Halt));

        let outcome = executor
            .execute(JobData::new("MissingJob", "job-1", json!([])))
            .unwrap();

        assert!(matches!(outcome, PerformOutcome::Halted));
    }

    #[test]
    fn test_unknown_class_propagates() {
        let executor = executor_with(MockPerformer::new_success());
        let err = executor
            .execute_json(r#"{"job_class": "MissingJob", "job_id": "x"}"#)
            .unwrap_err();

        assert!(matches!(err, JobError::UnknownJobClass(_)));
    }

    #[test]
    fn test_perform_now_by_class_uses_id_provider() {
        let performer = MockPerformer::new_success();
        let executor =
            executor_with(performer.clone()).with_id_provider(Arc::new(SequentialIdProvider::default()));

        let outcome = executor
            .perform_now("GreetJob", vec![Argument::from("mike")])
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(performer.calls()[0].args, vec![Argument::from("mike")]);
    }

    #[test]
    fn test_perform_now_as_uses_given_id() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = seen.clone();
        let mut kernel = ExecutionKernel::default();
        kernel.callbacks_mut().before(move |job| {
            sink.lock().unwrap().push(job.id.clone());
            Ok(Flow::Continue)
        });
        let mut registry = JobRegistry::new();
        registry.register("GreetJob", kernel, MockPerformer::new_success);
        let executor =
            Executor::from(registry).with_id_provider(Arc::new(SequentialIdProvider::default()));

        let job_id = executor.next_job_id();
        executor
            .perform_now_as(job_id.clone(), "GreetJob", Vec::new())
            .unwrap();
        executor.perform_now("GreetJob", Vec::new()).unwrap();

        assert_eq!(job_id, "job-1");
        assert_eq!(*seen.lock().unwrap(), vec!["job-1", "job-2"]);
    }

    #[test]
    fn test_perform_now_unknown_class() {
        let executor = executor_with(MockPerformer::new_success());
        let err = executor.perform_now("MissingJob", Vec::new()).unwrap_err();
        assert!(matches!(err, JobError::UnknownJobClass(ref class) if class == "MissingJob"));
    }
}
