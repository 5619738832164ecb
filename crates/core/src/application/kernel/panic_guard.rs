// Panic isolation for perform bodies
use std::any::Any;
use std::panic::{catch_unwind, UnwindSafe};
use tracing::error;

/// What came back from a perform body run under `execute_guarded`
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    Success(T),
    /// The body unwound; carries the panic payload rendered as text
    Panicked(String),
}

/// Run `f`, turning an unwinding panic into `PanicGuardResult::Panicked`.
///
/// The kernel maps `Panicked` to `JobError::Panicked` so the panic reaches
/// the rescue registry instead of the caller of `perform_now`.
pub fn execute_guarded<F, T>(f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T + UnwindSafe,
{
    catch_unwind(f).map_or_else(
        |payload| {
            let message = panic_message(payload.as_ref());
            error!(panic_msg = %message, "Perform body panicked");
            PanicGuardResult::Panicked(message)
        },
        PanicGuardResult::Success,
    )
}

/// `panic!` payloads are `&str` for literals and `String` for formatted messages
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_passes_value_through() {
        match execute_guarded(|| 42) {
            PanicGuardResult::Success(v) => assert_eq!(v, 42),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_panic_message_is_captured() {
        let result: PanicGuardResult<()> = execute_guarded(|| panic!("static message"));
        assert!(matches!(result, PanicGuardResult::Panicked(ref m) if m == "static message"));

        let code = 7;
        let result: PanicGuardResult<()> = execute_guarded(move || panic!("code {}", code));
        assert!(matches!(result, PanicGuardResult::Panicked(ref m) if m == "code 7"));
    }

    #[test]
    fn test_non_string_payload() {
        let result: PanicGuardResult<()> = execute_guarded(|| std::panic::panic_any(42_u8));
        assert!(matches!(result, PanicGuardResult::Panicked(ref m) if m == "non-string panic payload"));
    }
}
