// ID Provider Port (for deterministic testing)

use std::sync::atomic::{AtomicU64, Ordering};

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new unique job ID
    fn generate_id(&self) -> String;
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Sequential provider (job-1, job-2, ...)
#[derive(Default)]
pub struct SequentialIdProvider {
    next: AtomicU64,
}

impl IdProvider for SequentialIdProvider {
    fn generate_id(&self) -> String {
        format!("job-{}", self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
