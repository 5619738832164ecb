// Execution Kernel - runs one job synchronously

pub mod config;
pub mod constants;
mod panic_guard;


pub use config::KernelConfig;
pub use panic_guard::{execute_guarded, PanicGuardResult};

use crate::application::callbacks::{CallbackChain, ChainOutcome, HookPhase};
use crate::application::rescue::{RescueOutcome, RescueRegistry};
use crate::domain::{Job, JobError};
use crate::port::time_provider::SystemTimeProvider;
use crate::port::{Performer, TimeProvider};
use constants::PERFORM_PHASE;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

/// How a `perform_now` call ended without raising
#[derive(Debug)]
pub enum PerformOutcome {
    /// The perform body ran to completion
    Completed,
    /// A callback stopped the chain before perform completed
    Halted,
    /// perform failed and a rescue handler took care of the error
    Rescued(JobError),
}

impl PerformOutcome {
    /// True only when perform ran to completion
    pub fn is_success(&self) -> bool {
        matches!(self, PerformOutcome::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformOutcome::Completed => "completed",
            PerformOutcome::Halted => "halted",
            PerformOutcome::Rescued(_) => "rescued",
        }
    }
}

/// Execution Kernel for one job variant
///
/// Holds the variant's perform-phase callbacks and rescue handlers. The
/// kernel keeps no per-job state, so one instance serves every job of the
/// variant.
pub struct ExecutionKernel {
    callbacks: CallbackChain<Job>,
    rescues: RescueRegistry<Job>,
    config: KernelConfig,
    time_provider: Arc<dyn TimeProvider>,
}

impl ExecutionKernel {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            callbacks: CallbackChain::new(PERFORM_PHASE),
            rescues: RescueRegistry::new(),
            config,
            time_provider: Arc::new(SystemTimeProvider),
        }
    }

    pub fn with_time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn callbacks(&self) -> &CallbackChain<Job> {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut CallbackChain<Job> {
        &mut self.callbacks
    }

    pub fn rescues(&self) -> &RescueRegistry<Job> {
        &self.rescues
    }

    pub fn rescues_mut(&mut self) -> &mut RescueRegistry<Job> {
        &mut self.rescues
    }

    /// Perform `job` immediately on the calling thread.
    ///
    /// Returns `Ok(Completed)` when perform ran, `Ok(Halted)` when a callback
    /// stopped the chain, and `Ok(Rescued(err))` when perform failed but a
    /// rescue handler accepted the error. Errors no handler accepts are
    /// returned unchanged.
    pub fn perform_now(
        &self,
        job: &mut Job,
        performer: &mut dyn Performer,
    ) -> Result<PerformOutcome, JobError> {
        let executions = job.record_execution();
        let started_at = self.time_provider.now_millis();
        info!(
            job_id = %job.id,
            job_class = %job.job_class,
            executions = executions,
            "Performing job"
        );

        match self.run(job, performer) {
            Ok(outcome) => {
                info!(
                    job_id = %job.id,
                    outcome = outcome.as_str(),
                    perform_ms = self.time_provider.elapsed_millis(started_at),
                    "perform_now returned"
                );
                Ok(outcome)
            }
            Err(err) => self.rescue(job, err),
        }
    }

    fn run(&self, job: &mut Job, performer: &mut dyn Performer) -> Result<PerformOutcome, JobError> {
        job.arguments.materialize()?;

        let catch_panics = self.config.catch_panics;
        let outcome = self.callbacks.run(job, |job| {
            let (positional, options) = job.arguments.split_options()?;
            let options = if options.is_empty() {
                None
            } else {
                Some(options)
            };

            if !catch_panics {
                return performer.perform(positional, options);
            }
            match execute_guarded(AssertUnwindSafe(|| performer.perform(positional, options))) {
                PanicGuardResult::Success(result) => result,
                PanicGuardResult::Panicked(msg) => Err(JobError::Panicked(msg)),
            }
        });

        match outcome {
            ChainOutcome::Completed => Ok(PerformOutcome::Completed),
            ChainOutcome::Halted => {
                if self.config.warn_on_halt {
                    warn!(
                        job_id = %job.id,
                        job_class = %job.job_class,
                        skipped_after_hooks = self.callbacks.count(HookPhase::After),
                        "Perform chain was halted by a callback before perform completed; \
                         after hooks were not run and the job is reported as not performed"
                    );
                }
                Ok(PerformOutcome::Halted)
            }
            ChainOutcome::Failed(err) => Err(err),
        }
    }

    fn rescue(&self, job: &mut Job, err: JobError) -> Result<PerformOutcome, JobError> {
        warn!(
            job_id = %job.id,
            kind = %err.kind(),
            error = %err,
            "Job failed, consulting rescue handlers"
        );

        match self.rescues.handle(job, err)? {
            RescueOutcome::Handled(err) => {
                info!(job_id = %job.id, error = %err, "Job failure rescued");
                Ok(PerformOutcome::Rescued(err))
            }
            RescueOutcome::Unhandled(err) => {
                error!(job_id = %job.id, error = %err, "Job failed with no matching rescue handler");
                Err(err)
            }
        }
    }
}

impl Default for ExecutionKernel {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}

impl std::fmt::Debug for ExecutionKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionKernel")
            .field("callbacks", &self.callbacks)
            .field("rescues", &self.rescues)
            .field("config", &self.config)
            .finish()
    }
}
