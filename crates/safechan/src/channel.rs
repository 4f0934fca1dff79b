//! Guarded close/send/receive
//!
//! Each operation checks for a nil handle first and returns `NilChannel`
//! without touching the primitive. Everything else is delegated to `Chan`
//! inside the fault boundary, so a double close or a send that loses a
//! race with `close` comes back as `OperationFault` instead of unwinding
//! through the caller.
//!
//! Send and receive block exactly like the bare primitive. Close never
//! blocks.
//!
//! ```rust,ignore
//! use safechan::{channel, Chan, ErrorKind};
//!
//! let ch: Chan<i32> = Chan::new(0);
//! channel::close(&ch)?;
//! assert_eq!(channel::send(&ch, 42).unwrap_err().kind(), ErrorKind::OperationFault);
//! assert_eq!(channel::receive(&ch).unwrap_err().kind(), ErrorKind::ClosedChannel);
//! ```

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use safechan_core::{Chan, SEND_ON_CLOSED};

use crate::error::{GuardError, GuardResult, Operation, Target};
use crate::fault::{isolate, Fault};

/// Any type whose representation is a channel of `Item`
///
/// Implement this on newtypes around `Chan<T>` to use them with the guards:
///
/// ```rust,ignore
/// struct Jobs(Chan<u32>);
///
/// impl ChanLike for Jobs {
///     type Item = u32;
///     fn as_chan(&self) -> &Chan<u32> { &self.0 }
/// }
/// ```
pub trait ChanLike {
    type Item;

    fn as_chan(&self) -> &Chan<Self::Item>;
}

impl<T> ChanLike for Chan<T> {
    type Item = T;

    #[inline]
    fn as_chan(&self) -> &Chan<T> {
        self
    }
}

impl<C: ChanLike + ?Sized> ChanLike for &C {
    type Item = C::Item;

    #[inline]
    fn as_chan(&self) -> &Chan<C::Item> {
        (**self).as_chan()
    }
}

impl<C: ChanLike + ?Sized> ChanLike for Box<C> {
    type Item = C::Item;

    #[inline]
    fn as_chan(&self) -> &Chan<C::Item> {
        (**self).as_chan()
    }
}

impl<C: ChanLike + ?Sized> ChanLike for Rc<C> {
    type Item = C::Item;

    #[inline]
    fn as_chan(&self) -> &Chan<C::Item> {
        (**self).as_chan()
    }
}

impl<C: ChanLike + ?Sized> ChanLike for Arc<C> {
    type Item = C::Item;

    #[inline]
    fn as_chan(&self) -> &Chan<C::Item> {
        (**self).as_chan()
    }
}

/// Close the channel
///
/// - nil: `NilChannel`, nothing attempted
/// - already closed: `OperationFault`
pub fn close<C>(ch: &C) -> GuardResult<()>
where
    C: ChanLike + ?Sized,
{
    let chan = ch.as_chan();
    if chan.is_nil() {
        return Err(GuardError::nil_channel(Operation::Close, None));
    }

    let id = chan.id();
    isolate(|| chan.close())
        .map_err(|fault| GuardError::intercepted(Operation::Close, Target::Chan(id), fault, None))
}

/// Send `value`, blocking until it is enqueued or handed to a receiver
///
/// - nil: `NilChannel` immediately, value not delivered
/// - closed before or during the send: `OperationFault`, value not delivered
///
/// The value is rendered with `Debug` only when it is not delivered, and
/// the rendering runs inside the fault boundary too.
pub fn send<C>(ch: &C, value: C::Item) -> GuardResult<()>
where
    C: ChanLike + ?Sized,
    C::Item: fmt::Debug,
{
    let chan = ch.as_chan();
    if chan.is_nil() {
        return Err(GuardError::nil_channel(Operation::Send, Some(render(&value))));
    }

    let target = Target::Chan(chan.id());
    match isolate(move || chan.send_or_return(value)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(value)) => Err(GuardError::intercepted(
            Operation::Send,
            target,
            Fault::new(SEND_ON_CLOSED),
            Some(render(&value)),
        )),
        Err(fault) => Err(GuardError::intercepted(Operation::Send, target, fault, None)),
    }
}

/// `Debug` text of an undelivered value; a panicking `Debug` impl is
/// contained and reported in place of the value
fn render<T: fmt::Debug>(value: &T) -> String {
    isolate(|| format!("{:?}", value))
        .unwrap_or_else(|fault| format!("<unprintable: {}>", fault))
}

/// Receive a value, blocking until one arrives or the channel closes
///
/// - nil: `NilChannel` immediately
/// - closed and drained: `ClosedChannel` immediately
///
/// `Chan::recv` itself never faults; the `OperationFault` arm only keeps
/// the boundary total.
///
/// Use `GuardResultExt::into_pair` for the `(zero value, error)` form.
pub fn receive<C>(ch: &C) -> GuardResult<C::Item>
where
    C: ChanLike + ?Sized,
{
    let chan = ch.as_chan();
    if chan.is_nil() {
        return Err(GuardError::nil_channel(Operation::Receive, None));
    }

    let id = chan.id();
    match isolate(|| chan.recv()) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(GuardError::closed_channel(id)),
        Err(fault) => Err(GuardError::intercepted(
            Operation::Receive,
            Target::Chan(id),
            fault,
            None,
        )),
    }
}
