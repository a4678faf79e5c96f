//! Shutdown signals
//!
//! Both nodes drive hardware lines that keep their level after the process
//! exits, so termination requests must reach the normal shutdown path.

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Handlers for the signals that request a clean shutdown
#[derive(Debug)]
pub struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: Signal,
    #[cfg(unix)]
    terminate: Signal,
}

impl ShutdownSignal {
    /// Register the handlers. Signals arriving between this call and
    /// [`ShutdownSignal::wait`] are not lost. Must run inside a tokio runtime.
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Resolve with the name of the first signal received
    #[cfg(unix)]
    pub async fn wait(mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }

    #[cfg(not(unix))]
    pub async fn wait(self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "Ctrl-C",
            Err(_) => std::future::pending().await,
        }
    }
}
