//! Local Buffer
//!
//! In-memory packet sink used in local mode so the exact wire bytes can be
//! read back after each emission.

use bytes::{BufMut, BytesMut};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared in-memory buffer standing in for a network destination.
///
/// Clones share the same storage: the pool keeps one handle and the client
/// writes through another.
#[derive(Debug, Clone, Default)]
pub struct LocalBuffer {
    inner: Arc<Mutex<BytesMut>>,
}

impl LocalBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one flushed packet. Packets are separated by `\n`.
    pub fn append_packet(&self, packet: &[u8]) {
        let mut buf = self.inner.lock();
        if !buf.is_empty() {
            buf.put_u8(b'\n');
        }
        buf.extend_from_slice(packet);
    }

    /// Read back everything written so far and clear the buffer.
    pub fn take_string(&self) -> String {
        let bytes = self.inner.lock().split();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_string_clears() {
        let buf = LocalBuffer::new();
        buf.append_packet(b"P.x:1|c");
        assert_eq!(buf.len(), 7);
        assert_eq!(buf.take_string(), "P.x:1|c");
        assert!(buf.is_empty());
        assert_eq!(buf.take_string(), "");
    }

    #[test]
    fn test_packets_joined_by_newline() {
        let buf = LocalBuffer::new();
        buf.append_packet(b"a:1|c");
        buf.append_packet(b"b:2|g");
        assert_eq!(buf.take_string(), "a:1|c\nb:2|g");
    }

    #[test]
    fn test_clones_share_storage() {
        let buf = LocalBuffer::new();
        let writer = buf.clone();
        writer.append_packet(b"y:5|g");
        assert_eq!(buf.take_string(), "y:5|g");
        assert!(writer.is_empty());
    }
}
