//! Process Signals
//!
//! Maps OS signals onto registry lifecycle actions for the binary.

/// Lifecycle action requested by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Ctrl+C or SIGTERM: stop the registry and exit
    Shutdown,
    /// SIGHUP: reload configuration and rebuild the pool
    Reload,
}

/// Listens for shutdown and reload signals.
pub struct SignalListener {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    hangup: tokio::signal::unix::Signal,
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl SignalListener {
    /// Install signal handlers. Must be called inside a tokio runtime.
    pub fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                terminate: signal(SignalKind::terminate())?,
                hangup: signal(SignalKind::hangup())?,
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Wait for the next signal.
    pub async fn recv(&mut self) -> ControlSignal {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("received Ctrl+C, initiating shutdown");
                    ControlSignal::Shutdown
                }
                _ = self.terminate.recv() => {
                    tracing::info!("received SIGTERM, initiating shutdown");
                    ControlSignal::Shutdown
                }
                _ = self.hangup.recv() => {
                    tracing::info!("received SIGHUP, reloading configuration");
                    ControlSignal::Reload
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("received Ctrl+C, initiating shutdown");
            ControlSignal::Shutdown
        }
    }
}
