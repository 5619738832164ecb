// Kernel constants (ADR: No magic values)

/// Name of the callback phase wrapping a job's perform body
pub const PERFORM_PHASE: &str = "perform";

/// Name of the callback phase wrapping deserialize + perform
pub const EXECUTE_PHASE: &str = "execute";

/// Env var toggling panic isolation around perform bodies
pub const ENV_CATCH_PANICS: &str = "JOBRUN_CATCH_PANICS";

/// Env var toggling the halted-chain diagnostic
pub const ENV_WARN_ON_HALT: &str = "JOBRUN_WARN_ON_HALT";
