//! Kernel-style leveled logging to stderr
//!
//! # Environment Variables
//!
//! - `SAFECHAN_LOG_LEVEL=<level>` - off|error|warn|info|debug|trace or 0-5 (default: info)
//! - `SAFECHAN_FLUSH_EPRINT=1` - flush stderr after every line
//!
//! The channel primitive only emits `ktrace!` lines for lifecycle
//! transitions. Guarded operations never log: their errors go back to
//! the caller as values.
//!
//! ```ignore
//! use safechan_core::{kinfo, ktrace};
//!
//! kinfo!("round {} done", n);
//! ktrace!("{:?} closed", ch);
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::env::{env_get_bool, env_get_opt};

/// Log levels, most severe first
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Parse a level name or digit; `None` for anything else
    pub fn parse(s: &str) -> Option<Self> {
        let level = match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => LogLevel::Off,
            "error" | "1" => LogLevel::Error,
            "warn" | "2" => LogLevel::Warn,
            "info" | "3" => LogLevel::Info,
            "debug" | "4" => LogLevel::Debug,
            "trace" | "5" => LogLevel::Trace,
            _ => return None,
        };
        Some(level)
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }
}

static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Read `SAFECHAN_LOG_LEVEL` / `SAFECHAN_FLUSH_EPRINT` once
///
/// Runs lazily on the first log call; tools call it up front so the
/// environment is read at a deterministic point.
pub fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    FLUSH_ENABLED.store(env_get_bool("SAFECHAN_FLUSH_EPRINT", false), Ordering::Relaxed);

    if let Some(level) = env_get_opt::<String>("SAFECHAN_LOG_LEVEL") {
        let level = LogLevel::parse(&level).unwrap_or(LogLevel::Info);
        LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    }
}

#[inline]
pub fn flush_enabled() -> bool {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    FLUSH_ENABLED.load(Ordering::Relaxed)
}

#[inline]
pub fn log_level() -> LogLevel {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Override the level programmatically (wins over the environment)
pub fn set_log_level(level: LogLevel) {
    INITIALIZED.store(true, Ordering::SeqCst);
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level != LogLevel::Off && level <= log_level()
}

/// Internal: one locked, optionally flushed line per call
#[doc(hidden)]
pub fn _klog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = write!(handle, "{} ", level.prefix());
    let _ = handle.write_fmt(args);
    let _ = handle.write_all(b"\n");
    if flush_enabled() {
        let _ = handle.flush();
    }
}

#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Error, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Warn, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Info, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Debug, format_args!($($arg)*));
    }};
}

/// Trace level; arguments are not formatted unless trace is enabled
#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {{
        if $crate::kprint::level_enabled($crate::kprint::LogLevel::Trace) {
            $crate::kprint::_klog_impl($crate::kprint::LogLevel::Trace, format_args!($($arg)*));
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn test_parse_names_and_digits() {
        assert_eq!(LogLevel::parse("TRACE"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse(" warn "), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("0"), Some(LogLevel::Off));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogLevel::from_u8(42), LogLevel::Trace);
    }

    #[test]
    fn test_off_is_never_enabled() {
        assert!(!level_enabled(LogLevel::Off));
    }

    #[test]
    fn test_macros_compile() {
        set_log_level(LogLevel::Off);
        kerror!("error {}", 1);
        kwarn!("warn");
        kinfo!("info {}", "x");
        kdebug!("debug");
        ktrace!("trace {:?}", Some(3));
        assert_eq!(log_level(), LogLevel::Off);
    }
}
