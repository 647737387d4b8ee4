//! Process-wide Registry
//!
//! The single shared [`MetricRegistry`] and the free-function surface that
//! delegates to it. Code that wants isolation (tests, embedded use) builds
//! its own `MetricRegistry` instead.

use crate::application::MetricRegistry;
use crate::domain::errors::MetricError;
use std::sync::OnceLock;

static REGISTRY: OnceLock<MetricRegistry> = OnceLock::new();

/// Get the process-wide registry, constructing it on first use.
///
/// Concurrent first callers all observe the same instance.
pub fn registry() -> &'static MetricRegistry {
    REGISTRY.get_or_init(MetricRegistry::new)
}

/// Supply a configured registry before first use.
///
/// Returns the registry back if the process-wide instance already exists.
pub fn install(registry: MetricRegistry) -> Result<(), MetricRegistry> {
    REGISTRY.set(registry)
}

pub fn init<S: AsRef<str>>(prefix: &str, destinations: &[S]) -> Result<(), MetricError> {
    registry().init(prefix, destinations)
}

pub fn re_create<S: AsRef<str>>(prefix: &str, destinations: &[S]) -> Result<(), MetricError> {
    registry().re_create(prefix, destinations)
}

pub fn stop() {
    registry().stop()
}

pub fn increment(name: &str, count: i64, rate: f64, need_flush: bool) -> Result<(), MetricError> {
    registry().increment(name, count, rate, need_flush)
}

pub fn gauge(name: &str, value: i64, need_flush: bool) -> Result<(), MetricError> {
    registry().gauge(name, value, need_flush)
}

pub fn histogram(name: &str, value: i64, need_flush: bool) -> Result<(), MetricError> {
    registry().histogram(name, value, need_flush)
}

pub fn flush_all() -> Result<(), MetricError> {
    registry().flush_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_registry_constructed_once() {
        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(|| registry() as *const MetricRegistry as usize))
            .collect();
        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
        assert!(std::ptr::eq(registry(), registry()));
    }

    #[test]
    fn test_install_after_first_use_is_rejected() {
        let _ = registry();
        assert!(install(MetricRegistry::new()).is_err());
    }
}
