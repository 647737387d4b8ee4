//! Router Service
//!
//! Pure domain logic mapping a metric name to a client pool slot.

use crate::domain::value_objects::MetricKind;
use rand::Rng;

/// Routing strategy for the client pool.
///
/// Routing contract:
/// - Counters and gauges go to `crc32(name) % pool_len`, where `crc32` is the
///   IEEE CRC-32 of the UTF-8 name bytes. The same name always lands on the
///   same slot for a given pool size, and operators may rely on that.
/// - Histograms go to a uniformly random slot on every call.
/// - A pool of one always yields slot 0; an empty pool yields nothing.
pub struct Router;

impl Router {
    /// Select the pool slot for a metric.
    ///
    /// # Returns
    /// The slot index, or None if the pool is empty
    pub fn select(name: &str, kind: MetricKind, pool_len: usize) -> Option<usize> {
        match pool_len {
            0 => None,
            1 => Some(0),
            _ if kind.is_stable_routed() => Some(Self::stable_index(name, pool_len)),
            _ => Some(rand::thread_rng().gen_range(0..pool_len)),
        }
    }

    /// Hash-based slot for a name. `pool_len` must be non-zero.
    pub fn stable_index(name: &str, pool_len: usize) -> usize {
        (crc32fast::hash(name.as_bytes()) % pool_len as u32) as usize
    }
}
