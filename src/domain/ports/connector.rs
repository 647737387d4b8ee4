//! Connector Port
//!
//! Defines how network-mode transport clients are constructed.

use crate::domain::entities::Destination;
use crate::domain::errors::TransportError;
use crate::domain::ports::TransportClient;
use crate::domain::value_objects::HistogramTag;
use std::time::Duration;

/// Fixed bound on connection establishment during a rebuild.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest payload that fits one unfragmented datagram on common links.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1432;

/// Settings shared by every client a registry builds.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    /// Bound on connection establishment
    pub connect_timeout: Duration,
    /// Buffered bytes that trigger an early flush
    pub max_packet_size: usize,
    /// Tag written for histogram samples
    pub histogram_tag: HistogramTag,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            histogram_tag: HistogramTag::default(),
        }
    }
}

/// Factory for network-mode transport clients.
///
/// Implementations must bound connection establishment by
/// `options.connect_timeout`.
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        destination: &Destination,
        options: &ClientOptions,
    ) -> Result<Box<dyn TransportClient>, TransportError>;
}
