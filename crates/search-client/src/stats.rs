//! Per-client request counters

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Point-in-time copy of a client's counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub requests: u64,
    pub successes: u64,
    pub repaired_responses: u64,
    pub decode_failures: u64,
    pub last_request: Option<DateTime<Utc>>,
}

impl SearchStats {
    /// Share of requests that returned a usable envelope, 0.0 before any request
    pub fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.successes as f64 / self.requests as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    requests: AtomicU64,
    successes: AtomicU64,
    repaired_responses: AtomicU64,
    decode_failures: AtomicU64,
    last_request: Mutex<Option<DateTime<Utc>>>,
}

impl StatsRecorder {
    pub(crate) fn request_started(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(Utc::now());
        }
    }

    pub(crate) fn succeeded(&self, repaired: bool) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        if repaired {
            self.repaired_responses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn decode_failed(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SearchStats {
        SearchStats {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            repaired_responses: self.repaired_responses.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            last_request: self.last_request.lock().ok().and_then(|last| *last),
        }
    }
}
