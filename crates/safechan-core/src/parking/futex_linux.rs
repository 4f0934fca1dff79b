//! Linux futex-based parking
//!
//! The futex word *is* the epoch. `FUTEX_WAIT` only sleeps while the word
//! still equals the epoch the waiter observed, which closes the race
//! between "checked state" and "went to sleep" inside the kernel.

use super::Parking;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Linux futex-based parking
pub struct FutexParking {
    /// Futex word, bumped on every channel state change
    epoch: AtomicU32,

    /// Count of parked threads, lets notify skip the syscall
    parked: AtomicUsize,
}

impl FutexParking {
    pub fn new() -> Self {
        Self {
            epoch: AtomicU32::new(0),
            parked: AtomicUsize::new(0),
        }
    }
}

impl Default for FutexParking {
    fn default() -> Self {
        Self::new()
    }
}

impl Parking for FutexParking {
    #[inline]
    fn epoch(&self) -> u32 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn wait(&self, epoch: u32) {
        self.parked.fetch_add(1, Ordering::SeqCst);

        // FUTEX_WAIT: sleep only while the word still equals `epoch`.
        // EAGAIN (word changed) and EINTR are both fine: the caller re-checks.
        unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.epoch.as_ptr(),
                libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
                epoch,
                std::ptr::null::<libc::timespec>(),
                std::ptr::null::<u32>(),
                0u32,
            );
        }

        self.parked.fetch_sub(1, Ordering::SeqCst);
    }

    fn notify_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);

        if self.parked.load(Ordering::SeqCst) == 0 {
            return;
        }

        unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.epoch.as_ptr(),
                libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
                i32::MAX,
                std::ptr::null::<libc::timespec>(),
                std::ptr::null::<u32>(),
                0u32,
            );
        }
    }
}

// Safety: FutexParking only contains atomics
unsafe impl Send for FutexParking {}
unsafe impl Sync for FutexParking {}
