mod local_buffer;
mod network_connector;
mod statsd_client;

pub use local_buffer::LocalBuffer;
pub use network_connector::NetworkConnector;
pub use statsd_client::{format_line, StatsdClient};
