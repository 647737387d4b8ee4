//! metric-mux Library
//!
//! Process-local statsd emission facade that multiplexes counters, gauges
//! and histograms across a pool of collector connections.
//!
//! The process-wide surface (`init`, `re_create`, `stop`, `increment`,
//! `gauge`, `histogram`) delegates to a single lazily constructed
//! [`MetricRegistry`]; isolated registries can be built directly.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use adapters::outbound::{LocalBuffer, NetworkConnector, StatsdClient};
pub use application::global::{
    flush_all, gauge, histogram, increment, init, install, re_create, registry, stop,
};
pub use application::MetricRegistry;
pub use config::{load_config, Config};
pub use domain::entities::Destination;
pub use domain::errors::{MetricError, TransportError};
pub use domain::ports::{ClientOptions, Connector, TransportClient};
pub use domain::services::Router;
pub use domain::value_objects::{HistogramTag, Metric, MetricKind, Protocol};
pub use infrastructure::PoolState;
