//! Shared health state for the /health endpoint.
//! Updated from the pass-report consumer in main.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use crate::types::PassReport;

#[derive(Default)]
pub struct HealthState {
    /// Nanosecond timestamp of the last finished pass (0 = none yet).
    last_pass_at_ns: AtomicI64,
    last_pass_refreshed: AtomicU64,
    last_pass_failed: AtomicU64,
    passes_completed: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(&self, report: &PassReport) {
        self.last_pass_at_ns.store(report.finished_at_ns, Ordering::Relaxed);
        self.last_pass_refreshed.store(report.refreshed as u64, Ordering::Relaxed);
        self.last_pass_failed.store(report.failed as u64, Ordering::Relaxed);
        self.passes_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_pass_at_ns(&self) -> Option<i64> {
        match self.last_pass_at_ns.load(Ordering::Relaxed) {
            0 => None,
            ns => Some(ns),
        }
    }

    pub fn last_pass_counts(&self) -> (u64, u64) {
        (
            self.last_pass_refreshed.load(Ordering::Relaxed),
            self.last_pass_failed.load(Ordering::Relaxed),
        )
    }

    pub fn passes_completed(&self) -> u64 {
        self.passes_completed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PassTrigger;

    #[test]
    fn records_last_pass() {
        let health = HealthState::new();
        assert_eq!(health.last_pass_at_ns(), None);
        health.record_pass(&PassReport {
            trigger: PassTrigger::Scheduled,
            refreshed: 4,
            failed: 1,
            interrupted: false,
            started_at_ns: 10,
            finished_at_ns: 20,
        });
        assert_eq!(health.last_pass_at_ns(), Some(20));
        assert_eq!(health.last_pass_counts(), (4, 1));
        assert_eq!(health.passes_completed(), 1);
    }
}
