//! Job variants bundled with the `jobrun` binary

use jobrun_core::application::{ExecutionKernel, Flow, JobRegistry, KernelConfig, RescueKind};
use jobrun_core::domain::{Argument, Job, JobError, Options};
use jobrun_core::Performer;
use thiserror::Error;
use tracing::{info, warn};

pub const ECHO_JOB: &str = "EchoJob";
pub const SUM_JOB: &str = "SumJob";

/// Argument given to `SumJob` that is not an integer
#[derive(Debug, Error)]
#[error("not an integer: {0}")]
pub struct NotAnInteger(pub String);

/// `SumJob` total differs from the `expect` option
#[derive(Debug, Error)]
#[error("sum {actual} does not match expected {expected}")]
pub struct SumMismatch {
    pub actual: i64,
    pub expected: i64,
}

/// Logs its arguments. Skipped when the options carry `"skip": true`.
pub struct EchoJob;

impl Performer for EchoJob {
    fn perform(&mut self, args: Vec<Argument>, options: Option<Options>) -> Result<(), JobError> {
        let args = serde_json::to_string(&args).map_err(JobError::perform)?;
        let options = serde_json::to_string(&options).map_err(JobError::perform)?;
        info!(args = %args, options = %options, "echo");
        Ok(())
    }
}

/// Adds up integer arguments; `{"expect": n}` asserts the total
pub struct SumJob;

impl Performer for SumJob {
    fn perform(&mut self, args: Vec<Argument>, options: Option<Options>) -> Result<(), JobError> {
        let mut total: i64 = 0;
        for arg in &args {
            let value = arg
                .as_i64()
                .ok_or_else(|| JobError::perform(NotAnInteger(format!("{:?}", arg))))?;
            total = total.saturating_add(value);
        }

        let expected = options
            .as_ref()
            .and_then(|o| o.get("expect"))
            .and_then(Argument::as_i64);
        if let Some(expected) = expected {
            if expected != total {
                return Err(JobError::perform(SumMismatch {
                    actual: total,
                    expected,
                }));
            }
        }

        info!(total = total, "sum");
        Ok(())
    }
}

fn skip_requested(job: &Job) -> bool {
    job.arguments
        .values()
        .and_then(|args| args.last())
        .and_then(Argument::as_map)
        .and_then(|options| options.get("skip"))
        .and_then(Argument::as_bool)
        .unwrap_or(false)
}

/// Registry with every bundled variant
pub fn registry(config: &KernelConfig) -> JobRegistry {
    let mut echo = ExecutionKernel::new(config.clone());
    echo.callbacks_mut().before(|job| {
        if skip_requested(job) {
            info!(job_id = %job.id, "skip requested, halting");
            return Ok(Flow::Halt);
        }
        Ok(Flow::Continue)
    });

    let mut sum = ExecutionKernel::new(config.clone());
    sum.rescues_mut()
        .register(RescueKind::Panicked, |job, err| {
            warn!(job_id = %job.id, error = %err, "SumJob panicked");
            Ok(())
        })
        .rescue_from::<NotAnInteger, _>(|job, err| {
            warn!(job_id = %job.id, error = %err, "Discarding SumJob with bad input");
            Ok(())
        });

    let mut registry = JobRegistry::new();
    registry
        .register(ECHO_JOB, echo, || EchoJob)
        .register(SUM_JOB, sum, || SumJob);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobrun_core::application::Executor;
    use jobrun_core::domain::JobData;
    use jobrun_core::PerformOutcome;
    use serde_json::json;

    fn executor() -> Executor {
        Executor::from(registry(&KernelConfig::default()))
    }

    #[test]
    fn test_echo_skip_halts() {
        let outcome = executor()
            .execute(JobData::new(ECHO_JOB, "1", json!(["hi", {"skip": true}])))
            .unwrap();
        assert!(matches!(outcome, PerformOutcome::Halted));

        let outcome = executor()
            .execute(JobData::new(ECHO_JOB, "2", json!(["hi", {"skip": false}])))
            .unwrap();
        assert!(outcome.is_success());
    }

    #[test]
    fn test_sum_bad_input_is_rescued() {
        let outcome = executor()
            .execute(JobData::new(SUM_JOB, "1", json!([1, "two"])))
            .unwrap();

        match outcome {
            PerformOutcome::Rescued(err) => assert!(err.downcast_ref::<NotAnInteger>().is_some()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_sum_mismatch_is_not_rescued() {
        let err = executor()
            .execute(JobData::new(SUM_JOB, "1", json!([1, 2, {"expect": 4}])))
            .unwrap_err();

        let mismatch = err.downcast_ref::<SumMismatch>().unwrap();
        assert_eq!(mismatch.actual, 3);
        assert_eq!(mismatch.expected, 4);
    }

    #[test]
    fn test_sum_matching_expectation() {
        let outcome = executor()
            .execute(JobData::new(SUM_JOB, "1", json!([1, 2, {"expect": 3}])))
            .unwrap();
        assert!(outcome.is_success());
    }
}
