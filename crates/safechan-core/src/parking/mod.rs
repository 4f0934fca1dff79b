//! Thread parking for blocked channel operations
//!
//! Waiters use an epoch protocol instead of per-waiter queues:
//!
//! 1. Read the current epoch
//! 2. Lock the channel state and check whether the operation can proceed
//! 3. If not, unlock and `wait(epoch)`
//!
//! Every state change bumps the epoch *after* releasing the state lock and
//! then wakes all parked threads. A change that lands between steps 1 and 3
//! has already moved the epoch, so `wait` returns immediately and the
//! waiter re-checks. No wakeup can be lost.

/// Platform-specific epoch parking
pub trait Parking: Send + Sync {
    /// Current epoch value. Read this before checking channel state.
    fn epoch(&self) -> u32;

    /// Block until the epoch differs from `epoch`
    ///
    /// May return spuriously; callers always re-check their condition.
    fn wait(&self, epoch: u32);

    /// Advance the epoch and wake every parked thread
    fn notify_all(&self);
}

// Platform-specific implementations
cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod futex_linux;
        pub use futex_linux::FutexParking as PlatformParking;
    } else {
        mod fallback;
        pub use fallback::FallbackParking as PlatformParking;
    }
}

/// Spin up to `spin_limit` times waiting for the epoch to move, then park
///
/// Most rendezvous partners show up within a few hundred nanoseconds, so a
/// short spin saves the syscall in the common case.
#[inline]
pub fn wait_for_change<P: Parking + ?Sized>(parking: &P, epoch: u32, spin_limit: u32) {
    for _ in 0..spin_limit {
        if parking.epoch() != epoch {
            return;
        }
        core::hint::spin_loop();
    }
    parking.wait(epoch);
}
