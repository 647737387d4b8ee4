//! Client Pool
//!
//! Ordered collection of transport clients. The index is the unit of
//! routing; in local mode each slot is paired with the buffer its client
//! writes to.

use crate::adapters::outbound::LocalBuffer;
use crate::domain::errors::TransportError;
use crate::domain::ports::TransportClient;
use parking_lot::{Mutex, MutexGuard};

/// Ordered set of clients, replaced as a whole on every rebuild.
///
/// Invariant: in local mode `local_slots.len() == clients.len()`,
/// otherwise `local_slots` is empty.
#[derive(Default)]
pub struct ClientPool {
    clients: Vec<Box<dyn TransportClient>>,
    local_slots: Vec<LocalSlot>,
    local: bool,
}

/// Buffer behind one local-mode client and the lock held across a single
/// emission's encode, flush and read-back.
struct LocalSlot {
    buffer: LocalBuffer,
    emission: Mutex<()>,
}

impl ClientPool {
    /// Create an empty pool of network clients.
    pub fn network() -> Self {
        Self::default()
    }

    /// Create an empty pool of buffer-backed clients.
    pub fn local() -> Self {
        Self {
            local: true,
            ..Self::default()
        }
    }

    pub fn push(&mut self, client: Box<dyn TransportClient>) {
        debug_assert!(!self.local, "local pools pair every client with a buffer");
        self.clients.push(client);
    }

    pub fn push_local(&mut self, client: Box<dyn TransportClient>, buffer: LocalBuffer) {
        debug_assert!(self.local, "network pools carry no buffers");
        self.clients.push(client);
        self.local_slots.push(LocalSlot {
            buffer,
            emission: Mutex::new(()),
        });
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn client(&self, index: usize) -> Option<&dyn TransportClient> {
        self.clients.get(index).map(|c| c.as_ref())
    }

    pub fn local_buffer(&self, index: usize) -> Option<&LocalBuffer> {
        self.local_slots.get(index).map(|slot| &slot.buffer)
    }

    /// Claim a local slot so that only the holder's lines reach its buffer
    /// until the guard drops. `None` for network pools.
    pub fn lock_local(&self, index: usize) -> Option<MutexGuard<'_, ()>> {
        self.local_slots.get(index).map(|slot| slot.emission.lock())
    }

    /// Flush every client, returning the first error after trying all.
    pub fn flush_all(&self) -> Result<(), TransportError> {
        let mut first_err = None;
        for client in &self.clients {
            if let Err(e) = client.flush() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Flush and close every client, keeping them allocated.
    pub fn flush_and_close_all(&self) {
        for (index, client) in self.clients.iter().enumerate() {
            if let Err(e) = client.flush() {
                tracing::debug!("flush of metrics client {} failed: {}", index, e);
            }
            if let Err(e) = client.close() {
                tracing::debug!("close of metrics client {} failed: {}", index, e);
            }
        }
    }

    /// Tear down a pool being replaced: flush every client and close it
    /// when `close` is set.
    pub fn release(self, close: bool) {
        for (index, client) in self.clients.iter().enumerate() {
            if let Err(e) = client.flush() {
                tracing::debug!("flush of metrics client {} failed: {}", index, e);
            }
            if close {
                if let Err(e) = client.close() {
                    tracing::debug!("close of metrics client {} failed: {}", index, e);
                }
            }
        }
    }
}
