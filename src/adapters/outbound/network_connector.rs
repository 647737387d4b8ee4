//! Network Connector
//!
//! Builds network-mode statsd clients. Name resolution and every address
//! attempt share one deadline of `connect_timeout`.

use crate::adapters::outbound::StatsdClient;
use crate::domain::entities::Destination;
use crate::domain::errors::TransportError;
use crate::domain::ports::{ClientOptions, Connector, TransportClient};
use crate::domain::value_objects::Protocol;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Instant;

/// Connector dialing real UDP/TCP destinations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkConnector;

impl NetworkConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for NetworkConnector {
    fn connect(
        &self,
        destination: &Destination,
        options: &ClientOptions,
    ) -> Result<Box<dyn TransportClient>, TransportError> {
        let deadline = Instant::now() + options.connect_timeout;
        let addrs = resolve(destination, deadline)?;

        let client = match destination.protocol {
            Protocol::Tcp => {
                let stream = connect_tcp(&addrs, deadline)?;
                stream.set_nodelay(true)?;
                stream.set_write_timeout(Some(options.connect_timeout))?;
                StatsdClient::tcp(stream, options)
            }
            Protocol::Udp => StatsdClient::udp(connect_udp(&addrs)?, options),
        };

        tracing::debug!("connected metrics client to {}", destination);
        Ok(Box::new(client))
    }
}

/// Resolve a destination before `deadline`.
///
/// Literal socket addresses skip the lookup. Host names are resolved on a
/// helper thread so a stalled resolver cannot outlive the deadline; the
/// thread finishes on its own and its late answer is dropped.
fn resolve(destination: &Destination, deadline: Instant) -> Result<Vec<SocketAddr>, TransportError> {
    if let Ok(addr) = destination.address.parse::<SocketAddr>() {
        return Ok(vec![addr]);
    }

    let (tx, rx) = mpsc::channel();
    let address = destination.address.clone();
    thread::Builder::new()
        .name("metric-mux-resolve".to_string())
        .spawn(move || {
            let _ = tx.send(address.to_socket_addrs().map(|a| a.collect::<Vec<_>>()));
        })?;

    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(Ok(addrs)) if !addrs.is_empty() => Ok(addrs),
        Ok(Ok(_)) | Err(RecvTimeoutError::Disconnected) => {
            Err(TransportError::InvalidDestination(destination.to_string()))
        }
        Ok(Err(e)) => Err(TransportError::InvalidDestination(format!(
            "{}: {}",
            destination, e
        ))),
        Err(RecvTimeoutError::Timeout) => Err(TransportError::ConnectTimeout),
    }
}

/// Try each address in turn with whatever time is left before `deadline`.
fn connect_tcp(addrs: &[SocketAddr], deadline: Instant) -> Result<TcpStream, TransportError> {
    let mut last_err = None;
    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(TransportError::ConnectTimeout);
        }
        match TcpStream::connect_timeout(addr, remaining) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(match last_err {
        Some(e) if e.kind() == io::ErrorKind::TimedOut => TransportError::ConnectTimeout,
        Some(e) => TransportError::Io(e),
        None => TransportError::ConnectTimeout,
    })
}

fn connect_udp(addrs: &[SocketAddr]) -> Result<UdpSocket, TransportError> {
    let mut last_err = None;
    for addr in addrs {
        let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let attempt = UdpSocket::bind(bind_addr).and_then(|socket| {
            socket.connect(addr)?;
            Ok(socket)
        });
        match attempt {
            Ok(socket) => return Ok(socket),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err
        .map(TransportError::Io)
        .unwrap_or(TransportError::ConnectTimeout))
}
