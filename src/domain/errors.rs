//! Domain Errors
//!
//! Error taxonomy for the metric facade: transport-level failures raised by a
//! single client, and registry-level failures surfaced to callers.

use std::io;

/// Failures raised by a transport client or while establishing one.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The destination string could not be parsed or resolved.
    #[error("invalid destination: {0}")]
    InvalidDestination(String),
    /// Connection establishment exceeded the configured bound.
    #[error("connection timeout")]
    ConnectTimeout,
    /// The client was already closed.
    #[error("client closed")]
    Closed,
    /// Counter sample rate outside `(0, +inf)`.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f64),
    /// Socket level failure while connecting, writing or closing.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Errors returned by the metric registry and its free-function surface.
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    /// A destination could not be reached while (re)building the pool.
    #[error("failed to connect to {destination}: {source}")]
    Configuration {
        destination: String,
        #[source]
        source: TransportError,
    },
    /// An individual send/flush failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// A metric line could not be parsed.
    #[error("malformed metric line {line:?}: {reason}")]
    Parse { line: String, reason: &'static str },
}

impl MetricError {
    pub(crate) fn parse(line: &str, reason: &'static str) -> Self {
        MetricError::Parse {
            line: line.to_string(),
            reason,
        }
    }
}
