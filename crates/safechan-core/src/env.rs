//! Environment variable helpers
//!
//! All runtime knobs in this workspace follow the same rule: a compile-time
//! default, overridden by a `SAFECHAN_*` environment variable when it is set
//! and parses. A value that fails to parse is ignored, never fatal.
//!
//! ```ignore
//! use safechan_core::env::{env_get, env_get_bool};
//!
//! let spins: u32 = env_get("SAFECHAN_SPIN_LIMIT", 64);
//! let flush = env_get_bool("SAFECHAN_FLUSH_EPRINT", false);
//! ```

use std::str::FromStr;

/// Parse `key` as `T`, falling back to `default` when unset or unparsable
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Parse `key` as `T` when it is set and well-formed
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Boolean flag: "1", "true", "yes", "on" (any case) are true
///
/// Any other value is false. Unset returns `default`.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(
            val.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}
