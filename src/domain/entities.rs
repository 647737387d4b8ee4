//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the metric facade.
//! They have no external dependencies and contain only business logic.

use crate::domain::errors::TransportError;
use crate::domain::value_objects::Protocol;
use serde::{Deserialize, Serialize};

/// A metrics collector endpoint one pool slot is bound to.
///
/// Accepted forms are `udp://host:port`, `tcp://host:port` and a bare
/// `host:port`, which takes the caller's default protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    /// Transport used to reach the collector
    pub protocol: Protocol,
    /// `host:port` address, unresolved
    pub address: String,
}

impl Destination {
    pub fn new(protocol: Protocol, address: impl Into<String>) -> Self {
        Self {
            protocol,
            address: address.into(),
        }
    }

    /// Parse a destination string.
    pub fn parse(s: &str, default_protocol: Protocol) -> Result<Self, TransportError> {
        let s = s.trim();
        let (protocol, address) = match s.split_once("://") {
            Some(("udp", rest)) => (Protocol::Udp, rest),
            Some(("tcp", rest)) => (Protocol::Tcp, rest),
            Some(_) => return Err(TransportError::InvalidDestination(s.to_string())),
            None => (default_protocol, s),
        };

        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| TransportError::InvalidDestination(s.to_string()))?;
        if host.is_empty() || port.parse::<u16>().is_err() {
            return Err(TransportError::InvalidDestination(s.to_string()));
        }

        Ok(Self::new(protocol, address))
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.protocol, self.address)
    }
}
