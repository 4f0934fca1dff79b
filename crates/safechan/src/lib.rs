//! # safechan
//!
//! Guarded channel operations and reference dereference. Misuse of a
//! channel or an optional reference comes back as a [`GuardError`]
//! instead of a panic or a deadlock.
//!
//! | Operation | nil handle   | closed channel                   |
//! |-----------|--------------|----------------------------------|
//! | `close`   | `NilChannel` | `OperationFault` (double close)  |
//! | `send`    | `NilChannel` | `OperationFault` (send on closed)|
//! | `receive` | `NilChannel` | `ClosedChannel` once drained     |
//! | `deref`   | `NilReference` | n/a                            |
//!
//! On a live channel, send and receive block exactly as the bare
//! [`Chan`] does.
//!
//! ## Panic messages
//!
//! Intercepted faults are real panics caught at the boundary, so the
//! process panic hook still runs for them and by default prints a
//! message to stderr. Install a filtering hook with
//! `std::panic::set_hook` if that output is unwanted; this crate never
//! touches the process-wide hook itself.
//!
//! ## Modules
//!
//! - `channel` - `close`, `send`, `receive` and the `ChanLike` trait
//! - `reference` - `deref` and the `Reference` trait
//! - `error` - `GuardError`, `ErrorKind` and the canonical message format
//! - `fault` - The fault-isolation boundary

pub mod channel;
pub mod error;
pub mod fault;
pub mod reference;

// Re-exports for convenience
pub use channel::{close, receive, send, ChanLike};
pub use error::{ErrorKind, GuardError, GuardResult, GuardResultExt, Operation, Target};
pub use fault::Fault;
pub use reference::{deref, Reference};
pub use safechan_core::{Chan, ChanConfig, ChanId};
