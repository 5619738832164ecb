// Clock Port - wall-clock readings used to time perform_now calls

/// Millisecond clock consulted by the execution kernel
pub trait TimeProvider: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;

    /// Milliseconds since `started_at`, never negative even if the clock
    /// stepped backwards mid-perform
    fn elapsed_millis(&self, started_at: i64) -> i64 {
        self.now_millis().saturating_sub(started_at).max(0)
    }
}

/// Reads `chrono::Utc::now()`
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
