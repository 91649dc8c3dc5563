//! Spoken alerts.
//!
//! `speak` must never block the sampling thread. [`CommandSpeaker`] hands the
//! text to a worker thread that runs an external text-to-speech program and
//! records how long it took.

use std::process::Command;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam::channel::{self, Sender, TrySendError};
use pedalwatch_telemetry_streams::BridgeMetrics;
use tracing::{debug, info, warn};

/// Alert phrases.
pub mod phrases {
    pub fn disconnected(wait_secs: u64) -> String {
        format!("Controller disconnected. Waiting {wait_secs} seconds.")
    }

    pub const RECONNECTED: &str = "Controller found. Resuming monitoring.";
    pub const NOT_FOUND: &str = "Controller not found. Retrying.";
    pub const CLUTCH_NOISE: &str = "Clutch noise detected.";

    pub fn gas_drift(percent: u32) -> String {
        format!("Gas drift. Reached {percent} percent.")
    }

    pub fn new_estimate(percent: u32) -> String {
        format!("New deadzone estimation: {percent}")
    }
}

/// Fire-and-forget text-to-speech.
pub trait Speaker: Send {
    fn speak(&self, text: &str);

    /// Flush pending alerts and release the backend. Alerts spoken after
    /// `close` are dropped.
    fn close(&mut self) {}
}

/// Logs alerts instead of speaking them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn speak(&self, text: &str) {
        info!(alert = text, "alert");
    }
}

const SPEECH_QUEUE_DEPTH: usize = 16;

/// Runs `program <text>` on a dedicated worker thread.
#[derive(Debug)]
pub struct CommandSpeaker {
    tx: Option<Sender<String>>,
    worker: Option<JoinHandle<()>>,
}

impl CommandSpeaker {
    /// Start the worker thread.
    pub fn spawn(program: String, metrics: Arc<BridgeMetrics>) -> std::io::Result<Self> {
        let (tx, rx) = channel::bounded::<String>(SPEECH_QUEUE_DEPTH);
        let worker = std::thread::Builder::new()
            .name("pedalwatch-speech".to_string())
            .spawn(move || {
                for text in rx {
                    let started = Instant::now();
                    match Command::new(&program).arg(&text).status() {
                        Ok(status) if status.success() => {}
                        Ok(status) => warn!(%status, program = %program, "speech command failed"),
                        Err(e) => warn!(error = %e, program = %program, "failed to run speech command"),
                    }
                    let elapsed = started.elapsed();
                    metrics.record_speak(elapsed);
                    debug!(elapsed_ms = elapsed.as_millis(), text = %text, "alert spoken");
                }
            })?;
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str) {
        info!(alert = text, "alert");
        let Some(tx) = &self.tx else {
            debug!(alert = text, "speech closed, alert dropped");
            return;
        };
        match tx.try_send(text.to_string()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!(alert = text, "speech queue full, alert dropped"),
            Err(TrySendError::Disconnected(_)) => {
                warn!(alert = text, "speech worker gone, alert dropped")
            }
        }
    }

    /// Drop the sender so the worker drains the queue and exits, then join it.
    fn close(&mut self) {
        drop(self.tx.take());
        let Some(worker) = self.worker.take() else {
            return;
        };
        if worker.join().is_err() {
            warn!("speech worker panicked");
        } else {
            debug!("speech worker stopped");
        }
    }
}

impl<T: Speaker + Sync + ?Sized> Speaker for Arc<T> {
    fn speak(&self, text: &str) {
        (**self).speak(text);
    }

    /// Only the last handle closes the backend.
    fn close(&mut self) {
        if let Some(inner) = Arc::get_mut(self) {
            inner.close();
        }
    }
}

impl<T: Speaker + ?Sized> Speaker for Box<T> {
    fn speak(&self, text: &str) {
        (**self).speak(text);
    }

    fn close(&mut self) {
        (**self).close();
    }
}

pub mod mock {
    //! Speaker that records every alert for assertions.

    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, Default)]
    pub struct RecordingSpeaker {
        spoken: Arc<Mutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl RecordingSpeaker {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn spoken(&self) -> Vec<String> {
            self.spoken.lock().clone()
        }

        pub fn is_closed(&self) -> bool {
            self.closed.load(Ordering::Acquire)
        }
    }

    impl Speaker for RecordingSpeaker {
        fn speak(&self, text: &str) {
            if !self.is_closed() {
                self.spoken.lock().push(text.to_string());
            }
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::Release);
        }
    }
}
