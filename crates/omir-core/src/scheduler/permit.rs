//! Counting admission permits bounding concurrent target syncs.
//!
//! A unit of work must hold a permit for its whole duration; the permit is
//! returned on drop regardless of outcome. The in-flight gauge records a
//! high-water mark so the bound is observable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Default)]
struct Gauge {
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

#[derive(Debug)]
pub struct SyncPermits {
    sem: Arc<Semaphore>,
    gauge: Arc<Gauge>,
}

impl SyncPermits {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            sem: Arc::new(Semaphore::new(max_in_flight.max(1))),
            gauge: Arc::new(Gauge::default()),
        }
    }

    /// Waits until a permit is free. The permit is released when the
    /// returned guard drops.
    pub async fn acquire(&self) -> SyncPermit {
        let permit = Arc::clone(&self.sem)
            .acquire_owned()
            .await
            .expect("permit semaphore is never closed");
        let now = self.gauge.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.gauge.high_water.fetch_max(now, Ordering::AcqRel);
        SyncPermit {
            gauge: Arc::clone(&self.gauge),
            _permit: permit,
        }
    }

    /// Number of permits currently held.
    pub fn in_flight(&self) -> usize {
        self.gauge.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of simultaneously held permits observed.
    pub fn high_water(&self) -> usize {
        self.gauge.high_water.load(Ordering::Acquire)
    }
}

/// RAII guard for one admission permit.
pub struct SyncPermit {
    gauge: Arc<Gauge>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.gauge.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn acquire_and_release() {
        let permits = SyncPermits::new(2);
        let a = permits.acquire().await;
        let b = permits.acquire().await;
        assert_eq!(permits.in_flight(), 2);
        drop(a);
        assert_eq!(permits.in_flight(), 1);
        drop(b);
        assert_eq!(permits.in_flight(), 0);
        assert_eq!(permits.high_water(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn bound_holds_under_load() {
        let permits = Arc::new(SyncPermits::new(4));
        let mut join_set = tokio::task::JoinSet::new();
        for _ in 0..40 {
            let permits = Arc::clone(&permits);
            join_set.spawn(async move {
                let _permit = permits.acquire().await;
                tokio::time::sleep(Duration::from_millis(5)).await;
            });
        }
        while join_set.join_next().await.is_some() {}
        assert!(
            permits.high_water() <= 4,
            "bound exceeded: {}",
            permits.high_water()
        );
        assert!(permits.high_water() > 0);
        assert_eq!(permits.in_flight(), 0);
    }

    #[tokio::test]
    async fn zero_is_clamped_to_one() {
        let permits = SyncPermits::new(0);
        let guard = permits.acquire().await;
        assert_eq!(permits.in_flight(), 1);
        drop(guard);
    }
}
