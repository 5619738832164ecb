// Performer Port
// The business logic of a concrete job variant

use crate::domain::{Argument, JobError, Options};

/// Perform behavior supplied by each job variant.
///
/// `options` is `Some` only when the job's last argument was a keyed-options
/// map; Rust has no named parameters, so the map is handed over as-is.
pub trait Performer: Send {
    /// Run the job's work.
    ///
    /// # Errors
    /// The default implementation always fails with `JobError::NotImplemented`.
    fn perform(&mut self, args: Vec<Argument>, options: Option<Options>) -> Result<(), JobError> {
        let _ = (args, options);
        Err(JobError::NotImplemented)
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};
    use thiserror::Error;

    /// Error raised by `MockPerformer` in `Fail` mode
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    #[error("mock failure: {0}")]
    pub struct MockFailure(pub String);

    /// Mock performer behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Success,
        /// Always fail with `MockFailure`
        Fail(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
    }

    /// One recorded `perform` call
    #[derive(Debug, Clone, PartialEq)]
    pub struct PerformCall {
        pub args: Vec<Argument>,
        pub options: Option<Options>,
    }

    /// Mock Performer that records every call
    #[derive(Clone)]
    pub struct MockPerformer {
        behavior: MockBehavior,
        calls: Arc<Mutex<Vec<PerformCall>>>,
    }

    impl MockPerformer {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }

        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }

        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }

        pub fn calls(&self) -> Vec<PerformCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Performer for MockPerformer {
        fn perform(
            &mut self,
            args: Vec<Argument>,
            options: Option<Options>,
        ) -> Result<(), JobError> {
            self.calls
                .lock()
                .unwrap()
                .push(PerformCall { args, options });

            match &self.behavior {
                MockBehavior::Success => Ok(()),
                MockBehavior::Fail(msg) => Err(JobError::perform(MockFailure(msg.clone()))),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
            }
        }
    }

    /// Performer that keeps the default `perform`
    pub struct UnimplementedPerformer;

    impl Performer for UnimplementedPerformer {}
}
