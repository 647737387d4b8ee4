//! Quiescence Gate
//!
//! Admission flag plus in-flight tracking for safe online reconfiguration of
//! the client pool.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Lifecycle state of the client pool.
///
/// ```text
/// Uninitialized ─▶ Draining ─▶ Quiescent ─▶ Rebuilding ─▶ Active | Inactive
/// Active ─▶ Draining ─▶ Quiescent ─▶ Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Never activated
    Uninitialized,
    /// Admitting operations
    Active,
    /// Not admitting, waiting for in-flight operations
    Draining,
    /// Not admitting, nothing in flight
    Quiescent,
    /// Old pool released, new pool under construction
    Rebuilding,
    /// Rebuild finished without activating (no destinations, or a connect failure)
    Inactive,
    /// Deactivated by stop
    Stopped,
}

/// Admission gate tracking operations running against the pool.
///
/// Emitters call [`enter`](Self::enter) and hold the returned guard for the
/// duration of the send. Reconfiguration calls [`close`](Self::close), then
/// [`wait_quiescent`](Self::wait_quiescent), and only then touches clients.
pub struct QuiescenceGate {
    ready: AtomicBool,
    in_flight: AtomicUsize,
    state: Mutex<PoolState>,
    drained: Condvar,
}

impl QuiescenceGate {
    /// Create a closed gate.
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            state: Mutex::new(PoolState::Uninitialized),
            drained: Condvar::new(),
        }
    }

    /// Check if new operations are admitted.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Get the number of operations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> PoolState {
        *self.state.lock()
    }

    pub fn set_state(&self, state: PoolState) {
        *self.state.lock() = state;
    }

    /// Try to admit one operation.
    ///
    /// The counter is raised before `ready` is read, so a concurrent `close`
    /// either rejects this caller or waits for its guard.
    pub fn enter(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if !self.is_ready() {
            self.leave();
            return None;
        }
        Some(InFlightGuard { gate: self })
    }

    fn leave(&self) {
        let prev = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if prev == 1 && !self.is_ready() {
            // Taking the lock orders this notify after a waiter's check.
            let _state = self.state.lock();
            self.drained.notify_all();
        }
    }

    /// Stop admitting new operations.
    pub fn close(&self) {
        self.ready.store(false, Ordering::SeqCst);
        self.set_state(PoolState::Draining);
    }

    /// Block until every admitted operation has finished.
    pub fn wait_quiescent(&self) {
        let mut state = self.state.lock();
        while self.in_flight.load(Ordering::SeqCst) > 0 {
            self.drained.wait(&mut state);
        }
        *state = PoolState::Quiescent;
    }

    /// Start admitting operations.
    pub fn open(&self) {
        let mut state = self.state.lock();
        *state = PoolState::Active;
        self.ready.store(true, Ordering::SeqCst);
    }
}

impl Default for QuiescenceGate {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for one admitted operation.
///
/// Automatically decrements the in-flight count when dropped, including
/// during unwinding.
pub struct InFlightGuard<'a> {
    gate: &'a QuiescenceGate,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.gate.leave();
    }
}
