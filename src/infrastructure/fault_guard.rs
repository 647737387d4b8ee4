//! Fault Guard
//!
//! Contains panics at the boundary of public registry operations so an
//! instrumentation call can never abort its caller.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run `f`, converting a panic into a logged `fallback()` result.
///
/// Locks used inside are `parking_lot` locks, which do not poison, and the
/// in-flight guard releases during unwinding, so the registry stays usable
/// after a contained panic.
pub fn contain<T>(operation: &'static str, fallback: impl FnOnce() -> T, f: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            tracing::error!(
                operation,
                "recovered from panic in metrics registry: {}",
                panic_message(payload.as_ref())
            );
            fallback()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_contain_passes_value_through() {
        let value = contain("op", || 0, || 42);
        assert_eq!(value, 42);
    }

    #[test]
    #[traced_test]
    fn test_contain_returns_fallback_on_panic() {
        let value: Result<(), String> = contain("gauge", || Ok(()), || panic!("client exploded"));
        assert!(value.is_ok());
        assert!(logs_contain("recovered from panic in metrics registry: client exploded"));
    }

    #[test]
    #[traced_test]
    fn test_contain_formatted_panic_message() {
        let value = contain("increment", || -1, || panic!("slot {} missing", 3));
        assert_eq!(value, -1);
        assert!(logs_contain("slot 3 missing"));
    }

    #[test]
    fn test_panic_message_unknown_payload() {
        let payload: Box<dyn Any + Send> = Box::new(17u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
