//! # safechan-core
//!
//! The channel primitive that the `safechan` guard layer wraps, plus the
//! small platform and ambient pieces it needs.
//!
//! `Chan<T>` deliberately reproduces host channel semantics, faults
//! included: closing twice or sending on a closed channel panics, and
//! operations on a nil handle either panic or block forever. See the
//! `chan` module for the full matrix.
//!
//! ## Modules
//!
//! - `chan` - Go-style MPMC channel (`Chan<T>`, `ChanId`)
//! - `config` - Per-channel tuning with env overrides
//! - `parking` - Epoch parking (futex on Linux, condvar elsewhere)
//! - `spinlock` - Lock guarding channel state
//! - `kprint` - Kernel-style leveled logging macros
//! - `env` - Environment variable utilities

pub mod chan;
pub mod config;
pub mod parking;
pub mod spinlock;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use chan::{Chan, ChanId, CLOSE_OF_CLOSED, CLOSE_OF_NIL, SEND_ON_CLOSED};
pub use config::ChanConfig;
pub use parking::{Parking, PlatformParking};
pub use spinlock::SpinLock;
pub use env::{env_get, env_get_bool, env_get_opt};
