//! Domain Layer
//!
//! Metric value objects, error taxonomy, outbound ports and pure routing logic.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::Destination;
pub use errors::{MetricError, TransportError};
pub use value_objects::{HistogramTag, Metric, MetricKind, Protocol};
