//! Integration test for the process-wide surface
//!
//! Kept to a single test: the global registry is shared by every test in
//! this binary.

use metric_mux::{ClientOptions, HistogramTag, MetricRegistry, PoolState};
use std::net::UdpSocket;
use std::time::Duration;

fn recv(socket: &UdpSocket) -> Option<String> {
    let mut buf = [0u8; 2048];
    socket
        .recv(&mut buf)
        .ok()
        .map(|n| String::from_utf8_lossy(&buf[..n]).into_owned())
}

#[test]
fn test_global_lifecycle() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let addr = socket.local_addr().unwrap().to_string();

    let options = ClientOptions {
        histogram_tag: HistogramTag::Timing,
        ..Default::default()
    };
    assert!(metric_mux::install(MetricRegistry::new().with_client_options(options)).is_ok());

    // Safe before init
    assert!(metric_mux::increment("early", 1, 1.0, true).is_ok());
    assert_eq!(metric_mux::registry().state(), PoolState::Uninitialized);

    metric_mux::init("P.", &[addr.as_str()]).unwrap();
    metric_mux::increment("x", 1, 1.0, true).unwrap();
    assert_eq!(recv(&socket).as_deref(), Some("P.x:1|c"));

    metric_mux::gauge("y", 5, true).unwrap();
    assert_eq!(recv(&socket).as_deref(), Some("P.y:5|g"));

    metric_mux::histogram("z", 9, false).unwrap();
    metric_mux::flush_all().unwrap();
    assert_eq!(recv(&socket).as_deref(), Some("P.z:9|ms"));

    metric_mux::re_create("Q.", &[addr.as_str()]).unwrap();
    metric_mux::gauge("y", 6, true).unwrap();
    assert_eq!(recv(&socket).as_deref(), Some("Q.y:6|g"));

    metric_mux::stop();
    metric_mux::stop();
    assert_eq!(metric_mux::registry().state(), PoolState::Stopped);
    assert!(metric_mux::gauge("late", 1, true).is_ok());

    // Installing after construction is rejected
    assert!(metric_mux::install(MetricRegistry::new()).is_err());
}
