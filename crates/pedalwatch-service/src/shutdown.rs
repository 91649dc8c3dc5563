//! Process-wide shutdown fan-out.
//!
//! The async side (HTTP server, signal task) listens on a tokio broadcast
//! channel. The sampling thread sleeps on a crossbeam channel whose sender is
//! dropped on shutdown, which wakes every `recv_timeout` immediately.

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Owner side: triggers shutdown once, from any thread.
#[derive(Debug, Clone)]
pub struct Shutdown {
    wake: Arc<Mutex<Option<Sender<()>>>>,
    sleeper: Receiver<()>,
    notify: broadcast::Sender<()>,
}

/// Blocking-side view used by the sampling thread.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sleeper: Receiver<()>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (wake, sleeper) = channel::bounded(0);
        let (notify, _) = broadcast::channel(1);
        Self {
            wake: Arc::new(Mutex::new(Some(wake))),
            sleeper,
            notify,
        }
    }

    /// Request shutdown. Later calls are no-ops.
    pub fn trigger(&self) {
        if self.wake.lock().take().is_some() {
            debug!("shutdown triggered");
            // No receivers just means nobody is listening yet.
            if self.notify.send(()).is_err() {
                debug!("no async shutdown listeners");
            }
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.wake.lock().is_none()
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            sleeper: self.sleeper.clone(),
        }
    }

    /// Future resolving once shutdown has been triggered.
    pub fn wait(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.notify.subscribe();
        let already = self.is_triggered();
        async move {
            if !already {
                // Lagged or closed both mean the trigger already fired.
                let _closed_or_fired = rx.recv().await;
            }
        }
    }
}

impl ShutdownSignal {
    /// Sleep for `duration` unless shutdown interrupts it.
    ///
    /// Returns `true` if shutdown was requested.
    pub fn sleep(&self, duration: Duration) -> bool {
        match self.sleeper.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self.sleeper.try_recv(), Err(TryRecvError::Disconnected))
    }
}

/// Wait for Ctrl-C or SIGTERM, then trigger `shutdown`.
pub async fn wait_for_signal(shutdown: Shutdown) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                    result = tokio::signal::ctrl_c() => log_ctrl_c(result),
                    () = shutdown.wait() => return,
                }
            }
            Err(e) => {
                error!(error = %e, "failed to register SIGTERM handler");
                tokio::select! {
                    result = tokio::signal::ctrl_c() => log_ctrl_c(result),
                    () = shutdown.wait() => return,
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            result = tokio::signal::ctrl_c() => log_ctrl_c(result),
            () = shutdown.wait() => return,
        }
    }

    shutdown.trigger();
}

fn log_ctrl_c(result: std::io::Result<()>) {
    match result {
        Ok(()) => info!("Received Ctrl+C"),
        Err(e) => error!(error = %e, "error waiting for Ctrl+C"),
    }
}
