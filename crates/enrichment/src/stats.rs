//! Per-client AI service counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the AI client's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AiStats {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub rate_limited: u64,
    pub json_parse_failures: u64,
    pub fallbacks: u64,
}

impl AiStats {
    pub fn success_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.successful_calls as f64 / self.total_calls as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct AiStatsRecorder {
    total_calls: AtomicU64,
    successful_calls: AtomicU64,
    rate_limited: AtomicU64,
    json_parse_failures: AtomicU64,
    fallbacks: AtomicU64,
}

impl AiStatsRecorder {
    pub(crate) fn call_started(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn call_succeeded(&self) {
        self.successful_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn parse_failed(&self) {
        self.json_parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fell_back(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> AiStats {
        AiStats {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            successful_calls: self.successful_calls.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            json_parse_failures: self.json_parse_failures.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }
}
