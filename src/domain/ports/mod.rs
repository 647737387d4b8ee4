mod connector;
mod transport_client;

pub use connector::{ClientOptions, Connector, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_PACKET_SIZE};
pub use transport_client::TransportClient;
