//! Decision counters for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Allow/deny counters updated by every enforcement
#[derive(Debug, Default)]
pub struct EnforcerStats {
    allowed: AtomicU64,
    denied: AtomicU64,
}

impl EnforcerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, allowed: bool) {
        let counter = if allowed { &self.allowed } else { &self.denied };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            allowed: self.allowed.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
        }
    }
}

/// Copy of the decision counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub allowed: u64,
    pub denied: u64,
}

impl StatsSnapshot {
    /// Total number of decisions
    pub fn total(&self) -> u64 {
        self.allowed + self.denied
    }

    /// Fraction of decisions that allowed the request
    pub fn allow_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.allowed as f64 / total as f64
        }
    }
}
