//! Fault-isolation boundary
//!
//! Every guarded operation delegates to the underlying primitive through
//! `isolate`. A panic raised by the primitive (double close, send on a
//! closed channel, a dropped referent) unwinds to here and is
//! turned into a [`Fault`] value. The successful path is a plain call: no
//! extra locking, and blocking inside `f` blocks exactly as it would bare.
//!
//! Interception needs the default `panic = "unwind"` strategy. Under
//! `panic = "abort"` a fault still aborts the process.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Description of a fault intercepted at the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    message: String,
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Recover a description from a panic payload
    ///
    /// `panic!` payloads are `&'static str` or `String`; anything else was
    /// raised with `panic_any` and has no portable text.
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(text) => *text,
            Err(payload) => match payload.downcast_ref::<&'static str>() {
                Some(text) => (*text).to_string(),
                None => "opaque fault payload".to_string(),
            },
        };
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn into_message(self) -> String {
        self.message
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Run `f`, converting an unwinding fault into `Err(Fault)`
///
/// `AssertUnwindSafe` holds because the primitives raise their faults
/// after releasing internal locks and before mutating shared state, so a
/// channel or referent observed after a fault is still consistent.
#[inline]
pub(crate) fn isolate<R, F>(f: F) -> Result<R, Fault>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(Fault::from_payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_passes_through() {
        assert_eq!(isolate(|| 40 + 2), Ok(42));
    }

    #[test]
    fn test_static_str_payload() {
        let fault = isolate(|| -> () { panic!("plain text") }).unwrap_err();
        assert_eq!(fault.message(), "plain text");
    }

    #[test]
    fn test_formatted_payload() {
        let fault = isolate(|| -> () { panic!("code {}", 7) }).unwrap_err();
        assert_eq!(fault.to_string(), "code 7");
    }

    #[test]
    fn test_opaque_payload() {
        let fault = isolate(|| -> () { std::panic::panic_any(17u32) }).unwrap_err();
        assert_eq!(fault.message(), "opaque fault payload");
    }

    #[test]
    fn test_side_effects_before_fault_are_kept() {
        let mut seen = Vec::new();
        let result = isolate(|| {
            seen.push(1);
            if seen.len() == 1 {
                panic!("after push");
            }
        });
        assert!(result.is_err());
        assert_eq!(seen, vec![1]);
    }
}
