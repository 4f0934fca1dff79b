//! Channel configuration
//!
//! Compile-time defaults with environment overrides, then builder
//! methods on top:
//!
//! ```rust,ignore
//! use safechan_core::{Chan, ChanConfig};
//!
//! let config = ChanConfig::from_env().spin_limit(0);
//! let ch: Chan<u64> = Chan::with_config(16, config);
//! ```

use std::sync::OnceLock;

use crate::env::env_get;

/// Library defaults
pub mod defaults {
    /// Epoch polls before a blocked operation parks its thread
    pub const SPIN_LIMIT: u32 = 64;
}

/// Per-channel tuning. Affects latency only, never semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChanConfig {
    /// Epoch polls before parking a blocked send/recv
    pub spin_limit: u32,
}

/// Environment overrides, read on first use
static ENV_CONFIG: OnceLock<ChanConfig> = OnceLock::new();

impl Default for ChanConfig {
    /// `from_env`, read once per process
    fn default() -> Self {
        *ENV_CONFIG.get_or_init(Self::from_env)
    }
}

impl ChanConfig {
    /// Defaults only, ignoring the environment
    pub const fn builtin() -> Self {
        Self {
            spin_limit: defaults::SPIN_LIMIT,
        }
    }

    /// Defaults with environment overrides
    ///
    /// - `SAFECHAN_SPIN_LIMIT` - epoch polls before parking
    pub fn from_env() -> Self {
        Self {
            spin_limit: env_get("SAFECHAN_SPIN_LIMIT", defaults::SPIN_LIMIT),
        }
    }

    pub fn spin_limit(mut self, spins: u32) -> Self {
        self.spin_limit = spins;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        assert_eq!(ChanConfig::builtin().spin_limit, defaults::SPIN_LIMIT);
    }

    #[test]
    fn test_default_is_stable() {
        let first = ChanConfig::default();
        std::env::set_var("SAFECHAN_SPIN_LIMIT", "3");
        assert_eq!(ChanConfig::default(), first);
        std::env::remove_var("SAFECHAN_SPIN_LIMIT");
    }

    #[test]
    fn test_builder_overrides() {
        let config = ChanConfig::builtin().spin_limit(0);
        assert_eq!(config.spin_limit, 0);
    }
}
