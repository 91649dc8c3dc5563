//! Cross-thread bridge metrics.
//!
//! Each value has exactly one writer: the responder records serve duration,
//! the speech worker records render duration, and batch ids are handed out
//! to responder requests. Relaxed ordering is enough for all of them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug)]
pub struct BridgeMetrics {
    next_batch_id: AtomicU64,
    last_http_serve_us: AtomicU64,
    last_speak_us: AtomicU64,
}

/// Point-in-time copy of [`BridgeMetrics`] durations, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub last_http_serve_duration_ms: f64,
    pub last_speak_duration_ms: f64,
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeMetrics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_batch_id: AtomicU64::new(1),
            last_http_serve_us: AtomicU64::new(0),
            last_speak_us: AtomicU64::new(0),
        }
    }

    /// Hand out the next batch id. Ids start at 1 and never repeat.
    pub fn next_batch_id(&self) -> u64 {
        self.next_batch_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn record_http_serve(&self, elapsed: Duration) {
        self.last_http_serve_us
            .store(saturating_micros(elapsed), Ordering::Relaxed);
    }

    pub fn record_speak(&self, elapsed: Duration) {
        self.last_speak_us
            .store(saturating_micros(elapsed), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            last_http_serve_duration_ms: micros_to_ms(
                self.last_http_serve_us.load(Ordering::Relaxed),
            ),
            last_speak_duration_ms: micros_to_ms(self.last_speak_us.load(Ordering::Relaxed)),
        }
    }
}

fn saturating_micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

fn micros_to_ms(us: u64) -> f64 {
    Duration::from_micros(us).as_secs_f64() * 1000.0
}
