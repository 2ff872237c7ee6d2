//! Run progress: completion counts, cumulative bytes, EWMA-based ETA.
//!
//! The tracker is the sole mutation point for shared run state. Counters use
//! atomic adds; the duration average sits behind a mutex. Safe to update
//! from any number of units concurrently; consumers poll `snapshot`.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Smoothing factor for the per-unit duration average (weights roughly the
/// last 20 completions).
const EWMA_ALPHA: f64 = 0.1;

#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    completed: AtomicUsize,
    cumulative_bytes: AtomicU64,
    secs_per_unit: Mutex<Option<f64>>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            cumulative_bytes: AtomicU64::new(0),
            secs_per_unit: Mutex::new(None),
        }
    }

    /// Called once per completed target, from concurrent units.
    pub fn on_unit_complete(&self, elapsed: Duration, disk_bytes: u64) {
        self.cumulative_bytes.fetch_add(disk_bytes, Ordering::AcqRel);
        {
            let mut ewma = self.secs_per_unit.lock().unwrap();
            let sample = elapsed.as_secs_f64();
            *ewma = Some(match *ewma {
                Some(prev) => prev + EWMA_ALPHA * (sample - prev),
                None => sample,
            });
        }
        self.completed.fetch_add(1, Ordering::AcqRel);
    }

    pub fn is_done(&self) -> bool {
        self.completed.load(Ordering::Acquire) >= self.total
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed.load(Ordering::Acquire),
            total: self.total,
            cumulative_bytes: self.cumulative_bytes.load(Ordering::Acquire),
            secs_per_unit: *self.secs_per_unit.lock().unwrap(),
        }
    }
}

/// Read-only view for an external display to poll.
#[derive(Debug, Clone, Copy)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    pub cumulative_bytes: u64,
    pub secs_per_unit: Option<f64>,
}

impl ProgressSnapshot {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }

    /// Elapsed-weighted estimate of seconds remaining (None before the
    /// first completion).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total.saturating_sub(self.completed);
        if remaining == 0 {
            return Some(0.0);
        }
        self.secs_per_unit.map(|secs| secs * remaining as f64)
    }
}
