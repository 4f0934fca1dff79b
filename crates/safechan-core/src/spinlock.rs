//! Spinlock guarding channel state
//!
//! Channel critical sections are a handful of field reads and a
//! `VecDeque` push/pop, so a spinlock beats a parking mutex here.
//! Threads that must actually wait (full buffer, no value) park on
//! the channel's `Parking` instead, never on this lock.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

/// A test-and-test-and-set spinlock.
///
/// Unwinding out of a critical section releases the lock (the guard's
/// `Drop` runs), so a fault raised while the state is held never leaves
/// the channel wedged.
pub struct SpinLock<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

// Safety: SpinLock hands out exclusive access to T one holder at a time
unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        SpinLock {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(value),
        }
    }

    /// Acquire the lock, spinning with backoff until it is free
    #[inline]
    pub fn lock(&self) -> SpinGuard<'_, T> {
        let mut backoff = 1u32;
        loop {
            if self
                .locked
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return SpinGuard { lock: self };
            }

            while self.locked.load(Ordering::Relaxed) {
                for _ in 0..backoff {
                    core::hint::spin_loop();
                }
                if backoff < 64 {
                    backoff <<= 1;
                } else {
                    // Holder was likely descheduled; let it run.
                    std::thread::yield_now();
                }
            }
        }
    }

    #[cfg(test)]
    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// Releases the spinlock when dropped, including during unwinding
pub struct SpinGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<'a, T> Deref for SpinGuard<'a, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // Safety: we hold the lock
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T> DerefMut for SpinGuard<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // Safety: we hold the lock
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'a, T> Drop for SpinGuard<'a, T> {
    #[inline]
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}
