//! Statsd Client
//!
//! Buffered statsd line encoder implementing the TransportClient port over
//! UDP, TCP or an in-memory [`LocalBuffer`].

use crate::adapters::outbound::LocalBuffer;
use crate::domain::errors::TransportError;
use crate::domain::ports::{ClientOptions, TransportClient};
use bytes::{BufMut, BytesMut};
use parking_lot::Mutex;
use rand::Rng;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::net::{Shutdown, TcpStream, UdpSocket};

/// Destination of flushed packets.
pub(crate) trait PacketSink: Send {
    fn send(&mut self, packet: &[u8]) -> io::Result<()>;
    fn close(&mut self) -> io::Result<()>;
}

struct UdpSink(UdpSocket);

impl PacketSink for UdpSink {
    fn send(&mut self, packet: &[u8]) -> io::Result<()> {
        self.0.send(packet).map(|_| ())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct TcpSink(TcpStream);

impl PacketSink for TcpSink {
    fn send(&mut self, packet: &[u8]) -> io::Result<()> {
        self.0.write_all(packet)?;
        self.0.write_all(b"\n")?;
        self.0.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        match self.0.shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e),
            _ => Ok(()),
        }
    }
}

impl PacketSink for LocalBuffer {
    fn send(&mut self, packet: &[u8]) -> io::Result<()> {
        self.append_packet(packet);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Encode one statsd line.
///
/// The `|@rate` suffix is written only when `rate != 1`.
pub fn format_line(prefix: &str, name: &str, value: i64, tag: &str, rate: f64) -> String {
    let mut line = format!("{}{}:{}|{}", prefix, name, value, tag);
    if rate != 1.0 {
        let _ = write!(line, "|@{}", rate);
    }
    line
}

struct ClientState {
    prefix: String,
    pending: BytesMut,
    sink: Option<Box<dyn PacketSink>>,
    max_packet_size: usize,
}

impl ClientState {
    fn append(&mut self, line: &str) -> Result<(), TransportError> {
        if self.sink.is_none() {
            return Err(TransportError::Closed);
        }
        if !self.pending.is_empty() && self.pending.len() + 1 + line.len() > self.max_packet_size {
            self.flush()?;
        }
        if !self.pending.is_empty() {
            self.pending.put_u8(b'\n');
        }
        self.pending.extend_from_slice(line.as_bytes());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let sink = self.sink.as_mut().ok_or(TransportError::Closed)?;
        // Unsent data is dropped on failure; there is no retry.
        let packet = self.pending.split();
        sink.send(&packet)?;
        Ok(())
    }
}

/// Buffered statsd client.
///
/// Lines are joined with `\n` into one packet until `flush` is called or the
/// next line would exceed `max_packet_size`.
pub struct StatsdClient {
    state: Mutex<ClientState>,
    histogram_tag: &'static str,
}

impl StatsdClient {
    fn with_sink(sink: Box<dyn PacketSink>, options: &ClientOptions) -> Self {
        Self {
            state: Mutex::new(ClientState {
                prefix: String::new(),
                pending: BytesMut::with_capacity(options.max_packet_size),
                sink: Some(sink),
                max_packet_size: options.max_packet_size,
            }),
            histogram_tag: options.histogram_tag.as_str(),
        }
    }

    /// Client writing to an in-memory buffer. Performs no I/O.
    pub fn local(buffer: LocalBuffer, options: &ClientOptions) -> Self {
        Self::with_sink(Box::new(buffer), options)
    }

    /// Client sending one datagram per flush on a connected socket.
    pub fn udp(socket: UdpSocket, options: &ClientOptions) -> Self {
        Self::with_sink(Box::new(UdpSink(socket)), options)
    }

    /// Client writing newline-terminated packets to a stream.
    pub fn tcp(stream: TcpStream, options: &ClientOptions) -> Self {
        Self::with_sink(Box::new(TcpSink(stream)), options)
    }

    #[cfg(test)]
    pub(crate) fn from_sink(sink: Box<dyn PacketSink>, options: &ClientOptions) -> Self {
        Self::with_sink(sink, options)
    }

    fn record(&self, name: &str, value: i64, tag: &str, rate: f64) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        let line = format_line(&state.prefix, name, value, tag, rate);
        state.append(&line)
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().sink.is_none()
    }
}

impl TransportClient for StatsdClient {
    fn increment(&self, name: &str, count: i64, rate: f64) -> Result<(), TransportError> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(TransportError::InvalidSampleRate(rate));
        }
        if rate < 1.0 && rand::thread_rng().gen::<f64>() >= rate {
            return Ok(());
        }
        self.record(name, count, "c", rate)
    }

    fn gauge(&self, name: &str, value: i64) -> Result<(), TransportError> {
        self.record(name, value, "g", 1.0)
    }

    fn histogram(&self, name: &str, value: i64) -> Result<(), TransportError> {
        self.record(name, value, self.histogram_tag, 1.0)
    }

    fn flush(&self) -> Result<(), TransportError> {
        self.state.lock().flush()
    }

    fn close(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.pending.clear();
        if let Some(mut sink) = state.sink.take() {
            sink.close()?;
        }
        Ok(())
    }

    fn set_prefix(&self, prefix: &str) {
        self.state.lock().prefix = prefix.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::HistogramTag;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct RecordingSink {
        packets: Arc<Mutex<Vec<String>>>,
    }

    impl PacketSink for RecordingSink {
        fn send(&mut self, packet: &[u8]) -> io::Result<()> {
            self.packets
                .lock()
                .push(String::from_utf8_lossy(packet).into_owned());
            Ok(())
        }

        fn close(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingSink;

    impl PacketSink for FailingSink {
        fn send(&mut self, _packet: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }

        fn close(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn local_client(prefix: &str) -> (StatsdClient, LocalBuffer) {
        let buf = LocalBuffer::new();
        let client = StatsdClient::local(buf.clone(), &ClientOptions::default());
        client.set_prefix(prefix);
        (client, buf)
    }

    #[test]
    fn test_format_line() {
        assert_eq!(format_line("P.", "x", 1, "c", 1.0), "P.x:1|c");
        assert_eq!(format_line("", "y", -5, "g", 1.0), "y:-5|g");
        assert_eq!(format_line("P.", "x", 1, "c", 0.5), "P.x:1|c|@0.5");
        assert_eq!(format_line("P.", "t", 12, "ms", 1.0), "P.t:12|ms");
    }

    #[test]
    fn test_counter_and_gauge_wire_format() {
        let (client, buf) = local_client("P.");

        client.increment("x", 1, 1.0).unwrap();
        client.flush().unwrap();
        assert_eq!(buf.take_string(), "P.x:1|c");

        client.gauge("y", 5).unwrap();
        client.flush().unwrap();
        assert_eq!(buf.take_string(), "P.y:5|g");
    }

    #[test]
    fn test_histogram_tag_follows_options() {
        let buf = LocalBuffer::new();
        let options = ClientOptions {
            histogram_tag: HistogramTag::Timing,
            ..Default::default()
        };
        let client = StatsdClient::local(buf.clone(), &options);
        client.histogram("latency", 42).unwrap();
        client.flush().unwrap();
        assert_eq!(buf.take_string(), "latency:42|ms");

        let (client, buf) = local_client("");
        client.histogram("latency", 42).unwrap();
        client.flush().unwrap();
        assert_eq!(buf.take_string(), "latency:42|h");
    }

    #[test]
    fn test_nothing_sent_before_flush() {
        let (client, buf) = local_client("");
        client.increment("a", 1, 1.0).unwrap();
        client.gauge("b", 2).unwrap();
        assert!(buf.is_empty());

        client.flush().unwrap();
        assert_eq!(buf.take_string(), "a:1|c\nb:2|g");
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let (client, buf) = local_client("");
        client.flush().unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_oversized_buffer_flushes_early() {
        let sink = RecordingSink::default();
        let options = ClientOptions {
            max_packet_size: 16,
            ..Default::default()
        };
        let client = StatsdClient::from_sink(Box::new(sink.clone()), &options);

        client.gauge("aaaa", 1).unwrap(); // "aaaa:1|g" = 8 bytes
        client.gauge("bbbb", 2).unwrap(); // 8 + 1 + 8 = 17 > 16
        assert_eq!(sink.packets.lock().clone(), vec!["aaaa:1|g".to_string()]);

        client.flush().unwrap();
        assert_eq!(
            sink.packets.lock().clone(),
            vec!["aaaa:1|g".to_string(), "bbbb:2|g".to_string()]
        );
    }

    #[test]
    fn test_invalid_sample_rate_rejected() {
        let (client, _buf) = local_client("");
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                client.increment("x", 1, rate),
                Err(TransportError::InvalidSampleRate(_))
            ));
        }
    }

    #[test]
    fn test_sampled_counter_carries_rate() {
        let (client, buf) = local_client("");
        for _ in 0..200 {
            client.increment("x", 1, 0.5).unwrap();
        }
        client.flush().unwrap();
        let out = buf.take_string();
        let lines: Vec<&str> = out.lines().collect();
        assert!(!lines.is_empty() && lines.len() < 200);
        assert!(lines.iter().all(|l| *l == "x:1|c|@0.5"));
    }

    #[test]
    fn test_rate_above_one_is_not_sampled() {
        let (client, buf) = local_client("");
        client.increment("x", 1, 2.0).unwrap();
        client.flush().unwrap();
        assert_eq!(buf.take_string(), "x:1|c|@2");
    }

    #[test]
    fn test_close_is_idempotent_and_rejects_writes() {
        let (client, _buf) = local_client("");
        assert!(!client.is_closed());
        client.close().unwrap();
        client.close().unwrap();
        assert!(client.is_closed());
        assert!(matches!(client.gauge("x", 1), Err(TransportError::Closed)));
        client.flush().unwrap();
    }

    #[test]
    fn test_send_failure_surfaces_and_drops_data() {
        let client = StatsdClient::from_sink(Box::new(FailingSink), &ClientOptions::default());
        client.gauge("x", 1).unwrap();
        assert!(matches!(client.flush(), Err(TransportError::Io(_))));
        // pending data was dropped, nothing left to send
        client.flush().unwrap();
    }

    #[test]
    fn test_udp_loopback() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(std::time::Duration::from_secs(2)))
            .unwrap();

        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.connect(receiver.local_addr().unwrap()).unwrap();
        let client = StatsdClient::udp(socket, &ClientOptions::default());
        client.set_prefix("svc.");
        client.increment("hits", 3, 1.0).unwrap();
        client.flush().unwrap();

        let mut buf = [0u8; 1500];
        let n = receiver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"svc.hits:3|c");
    }
}
