//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use crate::domain::errors::MetricError;
use serde::{Deserialize, Serialize};

/// Kind of metric event carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Running count (`c`)
    Counter,
    /// Point-in-time value (`g`)
    Gauge,
    /// Distribution sample (`h` or `ms`, see [`HistogramTag`])
    Histogram,
}

impl MetricKind {
    /// Whether calls for one name must always land on the same client.
    ///
    /// Counters and gauges are routed by name hash; histograms have no
    /// continuity requirement and are spread randomly.
    pub fn is_stable_routed(&self) -> bool {
        matches!(self, Self::Counter | Self::Gauge)
    }

    /// Short name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wire tag emitted for histogram samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistogramTag {
    /// DogStatsD style histogram (`h`)
    Histogram,
    /// Classic statsd timer (`ms`)
    Timing,
}

impl HistogramTag {
    /// Parse a tag from a string, falling back to `h`.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "ms" | "timing" => Self::Timing,
            _ => Self::Histogram,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Histogram => "h",
            Self::Timing => "ms",
        }
    }
}

impl Default for HistogramTag {
    fn default() -> Self {
        Self::Histogram
    }
}

/// Network transport used for destinations in network mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// Connectionless datagrams, one packet per flush
    Udp,
    /// Stream connection, newline-terminated packets
    Tcp,
}

impl Protocol {
    /// Parse a protocol from a string, falling back to UDP.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "tcp" => Self::Tcp,
            _ => Self::Udp,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
        }
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::Udp
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single metric event before encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric<'a> {
    pub name: &'a str,
    pub value: i64,
    pub kind: MetricKind,
    /// Sample rate; only meaningful for counters.
    pub rate: f64,
}

impl<'a> Metric<'a> {
    pub fn counter(name: &'a str, count: i64, rate: f64) -> Self {
        Self {
            name,
            value: count,
            kind: MetricKind::Counter,
            rate,
        }
    }

    pub fn gauge(name: &'a str, value: i64) -> Self {
        Self {
            name,
            value,
            kind: MetricKind::Gauge,
            rate: 1.0,
        }
    }

    pub fn histogram(name: &'a str, value: i64) -> Self {
        Self {
            name,
            value,
            kind: MetricKind::Histogram,
            rate: 1.0,
        }
    }

    /// Parse one `name:value|type[|@rate]` line.
    ///
    /// The prefix is not part of the line; it is applied by the client at
    /// encode time. `h` and `ms` both parse as histograms.
    pub fn parse_line(line: &'a str) -> Result<Self, MetricError> {
        let trimmed = line.trim();
        let (head, rest) = trimmed
            .split_once('|')
            .ok_or_else(|| MetricError::parse(line, "missing type"))?;
        let (name, value) = head
            .rsplit_once(':')
            .ok_or_else(|| MetricError::parse(line, "missing value"))?;
        if name.is_empty() {
            return Err(MetricError::parse(line, "empty name"));
        }
        let value: i64 = value
            .parse()
            .map_err(|_| MetricError::parse(line, "value is not an integer"))?;

        let mut parts = rest.split('|');
        let kind = match parts.next().unwrap_or_default() {
            "c" => MetricKind::Counter,
            "g" => MetricKind::Gauge,
            "h" | "ms" => MetricKind::Histogram,
            _ => return Err(MetricError::parse(line, "unknown type")),
        };

        let rate = match parts.next() {
            Some(sample) => sample
                .strip_prefix('@')
                .and_then(|r| r.parse::<f64>().ok())
                .ok_or_else(|| MetricError::parse(line, "malformed sample rate"))?,
            None => 1.0,
        };
        if parts.next().is_some() {
            return Err(MetricError::parse(line, "trailing fields"));
        }
        if kind != MetricKind::Counter && rate != 1.0 {
            return Err(MetricError::parse(line, "sample rate on non-counter"));
        }

        Ok(match kind {
            MetricKind::Counter => Metric::counter(name, value, rate),
            MetricKind::Gauge => Metric::gauge(name, value),
            MetricKind::Histogram => Metric::histogram(name, value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_routing_kinds() {
        assert!(MetricKind::Counter.is_stable_routed());
        assert!(MetricKind::Gauge.is_stable_routed());
        assert!(!MetricKind::Histogram.is_stable_routed());
    }

    #[test]
    fn test_protocol_from_str() {
        assert_eq!(Protocol::from_str("tcp"), Protocol::Tcp);
        assert_eq!(Protocol::from_str("TCP"), Protocol::Tcp);
        assert_eq!(Protocol::from_str("udp"), Protocol::Udp);
        assert_eq!(Protocol::from_str("carrier-pigeon"), Protocol::Udp); // fallback
        assert_eq!(Protocol::default(), Protocol::Udp);
    }

    #[test]
    fn test_histogram_tag_from_str() {
        assert_eq!(HistogramTag::from_str("ms"), HistogramTag::Timing);
        assert_eq!(HistogramTag::from_str("h"), HistogramTag::Histogram);
        assert_eq!(HistogramTag::from_str(""), HistogramTag::Histogram);
        assert_eq!(HistogramTag::Timing.as_str(), "ms");
        assert_eq!(HistogramTag::default().as_str(), "h");
    }

    #[test]
    fn test_parse_counter() {
        let m = Metric::parse_line("requests:3|c").unwrap();
        assert_eq!(m, Metric::counter("requests", 3, 1.0));
    }

    #[test]
    fn test_parse_counter_with_rate() {
        let m = Metric::parse_line("requests:1|c|@0.25\n").unwrap();
        assert_eq!(m.kind, MetricKind::Counter);
        assert_eq!(m.rate, 0.25);
    }

    #[test]
    fn test_parse_gauge_negative() {
        let m = Metric::parse_line("queue.depth:-4|g").unwrap();
        assert_eq!(m, Metric::gauge("queue.depth", -4));
    }

    #[test]
    fn test_parse_histogram_tags() {
        assert_eq!(
            Metric::parse_line("latency:12|ms").unwrap().kind,
            MetricKind::Histogram
        );
        assert_eq!(
            Metric::parse_line("latency:12|h").unwrap().kind,
            MetricKind::Histogram
        );
    }

    #[test]
    fn test_parse_name_with_colon_uses_last_separator() {
        let m = Metric::parse_line("a:b:7|g").unwrap();
        assert_eq!(m.name, "a:b");
        assert_eq!(m.value, 7);
    }

    #[test]
    fn test_parse_errors() {
        let cases = vec![
            "requests",
            "requests|c",
            ":1|c",
            "requests:x|c",
            "requests:1|z",
            "requests:1|c|0.5",
            "requests:1|c|@abc",
            "requests:1|c|@0.5|extra",
        ];
        for line in cases {
            assert!(
                matches!(Metric::parse_line(line), Err(MetricError::Parse { .. })),
                "expected parse error for {:?}",
                line
            );
        }
    }

    #[test]
    fn test_parse_rejects_rate_on_non_counters() {
        for line in ["depth:3|g|@0.5", "latency:9|h|@0.1", "latency:9|ms|@0.1"] {
            match Metric::parse_line(line) {
                Err(MetricError::Parse { reason, .. }) => {
                    assert_eq!(reason, "sample rate on non-counter")
                }
                other => panic!("expected parse error for {:?}, got {:?}", line, other),
            }
        }

        // an explicit unit rate changes nothing
        let m = Metric::parse_line("depth:3|g|@1").unwrap();
        assert_eq!(m, Metric::gauge("depth", 3));
    }
}
