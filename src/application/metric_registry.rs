//! Metric Registry - Main application use case
//!
//! Owns the client pool and mediates every emission and reconfiguration.
//! Emission is gated by a [`QuiescenceGate`]; reconfiguration closes the
//! gate, waits for in-flight sends to finish, and only then touches clients.

use crate::adapters::outbound::{LocalBuffer, NetworkConnector, StatsdClient};
use crate::application::pool::ClientPool;
use crate::config::Config;
use crate::domain::entities::Destination;
use crate::domain::errors::MetricError;
use crate::domain::ports::{ClientOptions, Connector, TransportClient};
use crate::domain::services::Router;
use crate::domain::value_objects::{Metric, MetricKind, Protocol};
use crate::infrastructure::fault_guard::contain;
use crate::infrastructure::quiescence::{PoolState, QuiescenceGate};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Metric emission facade over a pool of transport clients.
///
/// Every public method is safe to call in any state: before activation,
/// during a rebuild and after stop, emissions are silent no-ops. Panics
/// raised below a public method are logged and swallowed.
pub struct MetricRegistry {
    gate: QuiescenceGate,
    pool: RwLock<ClientPool>,
    /// Serializes init/re_create/stop.
    reconfigure: Mutex<()>,
    connector: Arc<dyn Connector>,
    options: ClientOptions,
    default_protocol: Protocol,
}

impl MetricRegistry {
    /// Create an inactive registry dialing real UDP/TCP destinations.
    pub fn new() -> Self {
        Self {
            gate: QuiescenceGate::new(),
            pool: RwLock::new(ClientPool::default()),
            reconfigure: Mutex::new(()),
            connector: Arc::new(NetworkConnector::new()),
            options: ClientOptions::default(),
            default_protocol: Protocol::default(),
        }
    }

    /// Create an inactive registry using the client settings of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_client_options(config.client_options())
            .with_default_protocol(config.protocol)
    }

    /// Replace the factory used for network-mode clients.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn with_client_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Protocol for destinations given without a `udp://` or `tcp://` scheme.
    pub fn with_default_protocol(mut self, protocol: Protocol) -> Self {
        self.default_protocol = protocol;
        self
    }

    // ===== Lifecycle =====

    /// Activate the registry against network destinations.
    pub fn init<S: AsRef<str>>(&self, prefix: &str, destinations: &[S]) -> Result<(), MetricError> {
        self.activate(prefix, destinations, false)
    }

    /// Tear down the current pool and re-point to new network destinations.
    pub fn re_create<S: AsRef<str>>(
        &self,
        prefix: &str,
        destinations: &[S],
    ) -> Result<(), MetricError> {
        self.activate(prefix, destinations, false)
    }

    /// Rebuild with buffer-backed clients, one per destination entry.
    ///
    /// No network I/O happens; destinations only determine the pool size.
    /// Emissions return the exact wire bytes through [`emit`](Self::emit).
    pub fn re_create_local<S: AsRef<str>>(
        &self,
        prefix: &str,
        destinations: &[S],
    ) -> Result<(), MetricError> {
        self.activate(prefix, destinations, true)
    }

    /// Drain-then-swap rebuild of the pool.
    ///
    /// On a connect failure the rebuild stops at the failing destination:
    /// the clients built so far stay in the pool, the error is returned and
    /// the registry is left not ready.
    #[tracing::instrument(skip(self, destinations), fields(destinations = destinations.len()))]
    fn activate<S: AsRef<str>>(
        &self,
        prefix: &str,
        destinations: &[S],
        local: bool,
    ) -> Result<(), MetricError> {
        contain("activate", || Ok(()), || {
            let _reconfigure = self.reconfigure.lock();

            self.gate.close();
            self.gate.wait_quiescent();

            let previous = std::mem::take(&mut *self.pool.write());
            self.gate.set_state(PoolState::Rebuilding);
            previous.release(!local);

            let (next, result) = self.build_pool(prefix, destinations, local);
            let size = next.len();
            *self.pool.write() = next;

            match result {
                Ok(()) if size > 0 => {
                    self.gate.open();
                    tracing::info!(
                        "metrics pool active: {} client(s), local={}, prefix={:?}",
                        size,
                        local,
                        prefix
                    );
                    Ok(())
                }
                Ok(()) => {
                    self.gate.set_state(PoolState::Inactive);
                    tracing::info!("metrics pool released, no destinations configured");
                    Ok(())
                }
                Err(e) => {
                    self.gate.set_state(PoolState::Inactive);
                    tracing::warn!("metrics pool rebuild aborted after {} client(s): {}", size, e);
                    Err(e)
                }
            }
        })
    }

    fn build_pool<S: AsRef<str>>(
        &self,
        prefix: &str,
        destinations: &[S],
        local: bool,
    ) -> (ClientPool, Result<(), MetricError>) {
        let mut pool = if local {
            ClientPool::local()
        } else {
            ClientPool::network()
        };

        for destination in destinations {
            let destination = destination.as_ref();

            if local {
                let buffer = LocalBuffer::new();
                let client = StatsdClient::local(buffer.clone(), &self.options);
                client.set_prefix(prefix);
                pool.push_local(Box::new(client), buffer);
                continue;
            }

            let connected = Destination::parse(destination, self.default_protocol)
                .and_then(|d| self.connector.connect(&d, &self.options));
            match connected {
                Ok(client) => {
                    client.set_prefix(prefix);
                    pool.push(client);
                }
                Err(source) => {
                    let err = MetricError::Configuration {
                        destination: destination.to_string(),
                        source,
                    };
                    return (pool, Err(err));
                }
            }
        }

        (pool, Ok(()))
    }

    /// Deactivate: drain, then flush and close every client.
    ///
    /// Clients stay allocated until the next rebuild. A second call is a
    /// no-op because the registry is no longer ready.
    pub fn stop(&self) {
        contain("stop", || (), || {
            let _reconfigure = self.reconfigure.lock();
            if !self.gate.is_ready() {
                return;
            }

            self.gate.close();
            self.gate.wait_quiescent();

            self.pool.write().flush_and_close_all();
            self.gate.set_state(PoolState::Stopped);
            tracing::info!("metrics registry stopped");
        })
    }

    // ===== Emission =====

    /// Increment a counter, sampled at `rate`.
    pub fn increment(
        &self,
        name: &str,
        count: i64,
        rate: f64,
        need_flush: bool,
    ) -> Result<(), MetricError> {
        self.emit(&Metric::counter(name, count, rate), need_flush)
            .map(|_| ())
    }

    /// Set a gauge.
    pub fn gauge(&self, name: &str, value: i64, need_flush: bool) -> Result<(), MetricError> {
        self.emit(&Metric::gauge(name, value), need_flush).map(|_| ())
    }

    /// Record a histogram sample.
    pub fn histogram(&self, name: &str, value: i64, need_flush: bool) -> Result<(), MetricError> {
        self.emit(&Metric::histogram(name, value), need_flush)
            .map(|_| ())
    }

    /// Route and send one metric.
    ///
    /// In local mode the client is always flushed and the paired buffer is
    /// drained into the returned string, which holds the exact wire bytes of
    /// this call only: the slot stays locked from encode to read-back.
    /// In network mode the client is flushed only when `need_flush` is set
    /// and the result is `None`.
    pub fn emit(&self, metric: &Metric<'_>, need_flush: bool) -> Result<Option<String>, MetricError> {
        contain(metric.kind.as_str(), || Ok(None), || self.dispatch(metric, need_flush))
    }

    fn dispatch(&self, metric: &Metric<'_>, need_flush: bool) -> Result<Option<String>, MetricError> {
        let Some(_in_flight) = self.gate.enter() else {
            return Ok(None);
        };
        let pool = self.pool.read();

        let Some(index) = Router::select(metric.name, metric.kind, pool.len()) else {
            return Ok(None);
        };
        let Some(client) = pool.client(index) else {
            return Ok(None);
        };
        let _slot = pool.lock_local(index);

        match metric.kind {
            MetricKind::Counter => client.increment(metric.name, metric.value, metric.rate)?,
            MetricKind::Gauge => client.gauge(metric.name, metric.value)?,
            MetricKind::Histogram => client.histogram(metric.name, metric.value)?,
        }

        if pool.is_local() || need_flush {
            client.flush()?;
        }

        if pool.is_local() {
            return Ok(pool.local_buffer(index).map(LocalBuffer::take_string));
        }
        Ok(None)
    }

    /// Flush every client of the active pool.
    pub fn flush_all(&self) -> Result<(), MetricError> {
        contain("flush_all", || Ok(()), || {
            let Some(_in_flight) = self.gate.enter() else {
                return Ok(());
            };
            self.pool.read().flush_all()?;
            Ok(())
        })
    }

    // ===== Introspection =====

    /// Check if emissions are currently admitted.
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Whether the current pool is buffer-backed.
    pub fn is_local(&self) -> bool {
        self.pool.read().is_local()
    }

    /// Number of clients in the current pool, usable or not.
    pub fn pool_size(&self) -> usize {
        self.pool.read().len()
    }

    /// Number of emissions currently executing.
    pub fn in_flight(&self) -> usize {
        self.gate.in_flight()
    }

    pub fn state(&self) -> PoolState {
        self.gate.state()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}
