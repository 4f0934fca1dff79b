//! Go-style MPMC channel with host fault semantics
//!
//! `Chan<T>` behaves the way a channel primitive behaves in a runtime with
//! built-in channels, misuse included:
//!
//! | state  | `close()`         | `send(v)`              | `recv()`                 |
//! |--------|-------------------|------------------------|--------------------------|
//! | nil    | panics            | blocks forever         | blocks forever           |
//! | open   | closes            | blocks until room      | blocks until a value     |
//! | closed | panics            | panics, `v` dropped    | drains, then `None`      |
//!
//! A sender blocked on a full channel panics as soon as the channel closes.
//! Receivers blocked on an empty channel return `None` on close.
//!
//! These panics are the "process fault" the `safechan` guard layer exists to
//! intercept. Code that calls `Chan` directly gets exactly the host behavior.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::config::ChanConfig;
use crate::ktrace;
use crate::parking::{wait_for_change, Parking, PlatformParking};
use crate::spinlock::SpinLock;

/// Fault message raised by `close()` on a nil handle
pub const CLOSE_OF_NIL: &str = "close of nil channel";

/// Fault message raised by a second `close()`
pub const CLOSE_OF_CLOSED: &str = "close of closed channel";

/// Fault message raised by `send()` once the channel is closed
pub const SEND_ON_CLOSED: &str = "send on closed channel";

/// Buffer slots allocated up front; larger channels grow on demand
const PREALLOC_LIMIT: usize = 64;

/// Handle to a channel, or the nil handle
///
/// Cloning a handle shares the channel. `Chan::default()` is nil, like the
/// zero value of a channel type. Equality is identity.
pub struct Chan<T> {
    inner: Option<Arc<ChanInner<T>>>,
}

/// Internal channel state
struct ChanInner<T> {
    state: SpinLock<ChanState<T>>,

    /// Epoch parking for blocked senders and receivers
    parking: PlatformParking,

    /// Buffer capacity, 0 = rendezvous
    capacity: usize,

    config: ChanConfig,
}

struct ChanState<T> {
    /// Buffered values, plus values handed off to waiting receivers
    buffer: VecDeque<T>,

    /// Receivers parked waiting for a value
    recv_waiting: usize,

    /// Set once, never cleared
    closed: bool,
}

impl<T> ChanState<T> {
    /// A sender may enqueue while the buffer has room, or when a parked
    /// receiver is committed to take the value. With capacity 0 the second
    /// clause is the whole rendezvous: every queued value has a receiver
    /// that will drain it, even if the channel closes right after.
    #[inline]
    fn has_room(&self, capacity: usize) -> bool {
        self.buffer.len() < capacity.saturating_add(self.recv_waiting)
    }
}

/// Observable identity of a channel handle: its allocation address, or nil
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChanId(usize);

impl ChanId {
    pub const NIL: ChanId = ChanId(0);

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn addr(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ChanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            write!(f, "nil")
        } else {
            write!(f, "{:#x}", self.0)
        }
    }
}

impl fmt::Debug for ChanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<T> Chan<T> {
    /// The nil handle. Never becomes open.
    pub const fn nil() -> Self {
        Chan { inner: None }
    }

    /// Allocate an open channel; `capacity == 0` is a rendezvous channel
    pub fn new(capacity: usize) -> Self {
        Self::with_config(capacity, ChanConfig::default())
    }

    pub fn with_config(capacity: usize, config: ChanConfig) -> Self {
        Chan {
            inner: Some(Arc::new(ChanInner {
                state: SpinLock::new(ChanState {
                    buffer: VecDeque::with_capacity(capacity.min(PREALLOC_LIMIT)),
                    recv_waiting: 0,
                    closed: false,
                }),
                parking: PlatformParking::new(),
                capacity,
                config,
            })),
        }
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.inner.is_none()
    }

    pub fn id(&self) -> ChanId {
        match &self.inner {
            Some(inner) => ChanId(Arc::as_ptr(inner) as *const () as usize),
            None => ChanId::NIL,
        }
    }

    /// Close the channel
    ///
    /// # Panics
    ///
    /// On a nil handle, and on a channel that is already closed.
    pub fn close(&self) {
        let Some(inner) = &self.inner else {
            panic!("{}", CLOSE_OF_NIL);
        };

        {
            let mut state = inner.state.lock();
            if state.closed {
                drop(state);
                panic!("{}", CLOSE_OF_CLOSED);
            }
            state.closed = true;
        }

        ktrace!("{:?} closed", self);
        inner.parking.notify_all();
    }

    /// Send a value, blocking until there is room or a receiver
    ///
    /// A nil handle blocks the calling thread forever.
    ///
    /// # Panics
    ///
    /// If the channel is closed before the value is enqueued, including
    /// while this call is blocked. The value is dropped, not delivered.
    pub fn send(&self, value: T) {
        if self.send_or_return(value).is_err() {
            panic!("{}", SEND_ON_CLOSED);
        }
    }

    /// `send`, except a closed channel hands the value back instead of
    /// panicking
    ///
    /// Blocks exactly like `send`, nil handle included.
    pub fn send_or_return(&self, value: T) -> Result<(), T> {
        let Some(inner) = &self.inner else {
            block_forever();
        };

        loop {
            let epoch = inner.parking.epoch();
            {
                let mut state = inner.state.lock();
                if state.closed {
                    return Err(value);
                }
                if state.has_room(inner.capacity) {
                    state.buffer.push_back(value);
                    drop(state);
                    inner.parking.notify_all();
                    return Ok(());
                }
            }
            wait_for_change(&inner.parking, epoch, inner.config.spin_limit);
        }
    }

    /// Receive a value, blocking until one arrives
    ///
    /// Buffered values drain even after close. Returns `None` once the
    /// channel is closed and empty. A nil handle blocks forever.
    pub fn recv(&self) -> Option<T> {
        let Some(inner) = &self.inner else {
            block_forever();
        };

        let mut registered = false;
        loop {
            let epoch = inner.parking.epoch();
            {
                let mut state = inner.state.lock();
                if let Some(value) = state.buffer.pop_front() {
                    if registered {
                        state.recv_waiting -= 1;
                    }
                    drop(state);
                    // Room for a blocked sender
                    inner.parking.notify_all();
                    return Some(value);
                }
                if state.closed {
                    if registered {
                        state.recv_waiting -= 1;
                    }
                    return None;
                }
                if !registered {
                    state.recv_waiting += 1;
                    registered = true;
                    drop(state);
                    // A rendezvous sender may proceed now
                    inner.parking.notify_all();
                    continue;
                }
            }
            wait_for_change(&inner.parking, epoch, inner.config.spin_limit);
        }
    }
}

/// Park the calling thread permanently. Unparks are spurious by contract.
fn block_forever() -> ! {
    loop {
        std::thread::park();
    }
}

impl<T> Clone for Chan<T> {
    fn clone(&self) -> Self {
        Chan {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for Chan<T> {
    fn default() -> Self {
        Chan::nil()
    }
}

impl<T> PartialEq for Chan<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<T> Eq for Chan<T> {}

impl<T> fmt::Debug for Chan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chan({})", self.id())
    }
}
