// Application Layer - Execution kernel and its collaborators

pub mod callbacks;
pub mod executor;
pub mod kernel;
pub mod registry;
pub mod rescue;

// Re-exports
pub use callbacks::{CallbackChain, ChainOutcome, Flow, HookPhase, Next};
pub use executor::Executor;
pub use kernel::{ExecutionKernel, KernelConfig, PerformOutcome};
pub use registry::JobRegistry;
pub use rescue::{RescueKind, RescueOutcome, RescueRegistry};
