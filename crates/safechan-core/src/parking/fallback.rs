//! Fallback parking using std::sync::Condvar
//!
//! Used on platforms without futex support. The epoch is re-checked
//! under the mutex, and notifiers take the same mutex before signalling.

use super::Parking;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

/// Condvar-based parking (fallback)
pub struct FallbackParking {
    epoch: AtomicU32,
    mutex: Mutex<()>,
    condvar: Condvar,
    parked: AtomicUsize,
}

impl FallbackParking {
    pub fn new() -> Self {
        Self {
            epoch: AtomicU32::new(0),
            mutex: Mutex::new(()),
            condvar: Condvar::new(),
            parked: AtomicUsize::new(0),
        }
    }
}

impl Default for FallbackParking {
    fn default() -> Self {
        Self::new()
    }
}

impl Parking for FallbackParking {
    #[inline]
    fn epoch(&self) -> u32 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn wait(&self, epoch: u32) {
        self.parked.fetch_add(1, Ordering::SeqCst);

        // The mutex guards no data, so a poisoned lock is still usable.
        let mut guard = self.mutex.lock().unwrap_or_else(|e| e.into_inner());
        while self.epoch.load(Ordering::SeqCst) == epoch {
            guard = self
                .condvar
                .wait(guard)
                .unwrap_or_else(|e| e.into_inner());
        }
        drop(guard);

        self.parked.fetch_sub(1, Ordering::SeqCst);
    }

    fn notify_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);

        if self.parked.load(Ordering::SeqCst) == 0 {
            return;
        }

        drop(self.mutex.lock().unwrap_or_else(|e| e.into_inner()));
        self.condvar.notify_all();
    }
}
