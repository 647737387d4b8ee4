use crate::domain::ports::{ClientOptions, DEFAULT_MAX_PACKET_SIZE};
use crate::domain::value_objects::{HistogramTag, Protocol};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    // Pool settings
    pub prefix: String,
    pub destinations: Vec<String>,
    pub protocol: Protocol,
    pub local: bool,

    // Client settings
    pub connect_timeout_secs: u64,
    pub max_packet_size: usize,
    pub histogram_tag: HistogramTag,

    // Binary settings
    pub flush_interval_ms: u64,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            destinations: vec!["127.0.0.1:8125".to_string()],
            protocol: Protocol::Udp,
            local: false,
            connect_timeout_secs: 5,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            histogram_tag: HistogramTag::Histogram,
            flush_interval_ms: 1000,
            debug: false,
        }
    }
}

impl Config {
    /// Settings applied to every client the registry builds.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            max_packet_size: self.max_packet_size,
            histogram_tag: self.histogram_tag,
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Build a config from an arbitrary variable lookup.
pub fn load_config_from<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();
    let flag = |key: &str| {
        lookup(key)
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false)
    };

    let prefix = lookup("METRICMUX_PREFIX").unwrap_or(defaults.prefix);

    let destinations = lookup("METRICMUX_DESTINATIONS")
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or(defaults.destinations);

    let protocol = lookup("METRICMUX_PROTOCOL")
        .map(|v| Protocol::from_str(&v))
        .unwrap_or(defaults.protocol);

    let local = flag("METRICMUX_LOCAL");

    let connect_timeout_secs = lookup("METRICMUX_CONNECT_TIMEOUT_SECS")
        .and_then(|v| v.parse().ok())
        .filter(|secs: &u64| *secs > 0)
        .unwrap_or(defaults.connect_timeout_secs);

    let max_packet_size = lookup("METRICMUX_MAX_PACKET_SIZE")
        .and_then(|v| v.parse().ok())
        .filter(|size: &usize| *size > 0)
        .unwrap_or(defaults.max_packet_size);

    let histogram_tag = lookup("METRICMUX_HISTOGRAM_TAG")
        .map(|v| HistogramTag::from_str(&v))
        .unwrap_or(defaults.histogram_tag);

    let flush_interval_ms = lookup("METRICMUX_FLUSH_INTERVAL_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.flush_interval_ms);

    let debug = lookup("DEBUG").is_some();

    Ok(Config {
        prefix,
        destinations,
        protocol,
        local,
        connect_timeout_secs,
        max_packet_size,
        histogram_tag,
        flush_interval_ms,
        debug,
    })
}
