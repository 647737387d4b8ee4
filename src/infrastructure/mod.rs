//! Infrastructure Layer
//!
//! Cross-cutting concerns and infrastructure components.

pub mod fault_guard;
pub mod quiescence;
pub mod signals;

pub use fault_guard::contain;
pub use quiescence::{InFlightGuard, PoolState, QuiescenceGate};
pub use signals::{ControlSignal, SignalListener};
