//! Application Layer
//!
//! The registry use case and its process-wide instance.

pub mod global;
mod metric_registry;
mod pool;

pub use metric_registry::MetricRegistry;
pub use pool::ClientPool;
