//! Transport Client Port
//!
//! Defines the interface for encoding and sending metric events to one
//! collector destination.

use crate::domain::errors::TransportError;

/// One connection-like object bound to one destination.
///
/// This is an outbound port. The registry owns every client and shares it
/// between concurrent emitters, so implementations synchronize internally.
pub trait TransportClient: Send + Sync {
    /// Encode a counter increment, sampled at `rate`.
    fn increment(&self, name: &str, count: i64, rate: f64) -> Result<(), TransportError>;

    /// Encode a gauge value.
    fn gauge(&self, name: &str, value: i64) -> Result<(), TransportError>;

    /// Encode a histogram sample.
    fn histogram(&self, name: &str, value: i64) -> Result<(), TransportError>;

    /// Send everything buffered so far.
    fn flush(&self) -> Result<(), TransportError>;

    /// Release the underlying connection. Further writes fail.
    fn close(&self) -> Result<(), TransportError>;

    /// Set the prefix prepended to every metric name.
    fn set_prefix(&self, prefix: &str);
}
