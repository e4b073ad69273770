//! Concurrency control and backpressure.
//!
//! Bounds the number of firings in flight with a semaphore. The driver only
//! dispatches while a permit is free; closing the controller makes every
//! later acquire fail, which is how a fail-fast run stops dispatching.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Limits the number of concurrent firings.
#[derive(Debug)]
pub struct ConcurrencyControl {
    semaphore: Arc<Semaphore>,
    /// Approximate; updated by permits.
    in_flight: Arc<AtomicUsize>,
}

impl ConcurrencyControl {
    pub fn new(max_inflight: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_inflight)),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Take a permit if one is free right now. Returns `None` when the
    /// controller is at capacity or closed.
    ///
    /// The permit is released when dropped.
    pub fn try_acquire(&self) -> Option<ConcurrencyPermit> {
        let permit = Arc::clone(&self.semaphore).try_acquire_owned().ok()?;
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        Some(ConcurrencyPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Fail all future acquires.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }
}

/// RAII guard for one in-flight firing.
#[derive(Debug)]
pub struct ConcurrencyPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for ConcurrencyPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
