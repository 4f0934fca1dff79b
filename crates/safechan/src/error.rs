//! Error values returned by guarded operations
//!
//! Every failure renders in one canonical line:
//!
//! ```text
//! <Tag>: <operation> <chan|ref>=<identity>[ value=<value>][ fault="<text>"]
//!
//! NilChannel: close chan=nil
//! ClosedChannel: receive chan=0x55d1c2a3e010
//! OperationFault: send chan=0x55d1c2a3e010 value=42 fault="send on closed channel"
//! NilReference: deref ref=nil
//! ```
//!
//! The leading tag is stable and parses back with `str::parse::<ErrorKind>`
//! or [`ErrorKind::from_message`]. Everything after it is diagnostic text.

use core::fmt;
use core::str::FromStr;

use safechan_core::ChanId;

use crate::fault::Fault;

/// Result type for guarded operations
pub type GuardResult<T> = Result<T, GuardError>;

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operation on a nil channel handle. Returned before the channel is touched.
    NilChannel,

    /// Receive on a channel that is closed and drained. A defined outcome, not a fault.
    ClosedChannel,

    /// Dereference of an absent reference
    NilReference,

    /// The underlying primitive faulted (double close, send on closed,
    /// invalid referent) and the fault was intercepted
    OperationFault,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 4] = [
        ErrorKind::NilChannel,
        ErrorKind::ClosedChannel,
        ErrorKind::NilReference,
        ErrorKind::OperationFault,
    ];

    /// The machine-parseable tag
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NilChannel => "NilChannel",
            ErrorKind::ClosedChannel => "ClosedChannel",
            ErrorKind::NilReference => "NilReference",
            ErrorKind::OperationFault => "OperationFault",
        }
    }

    /// Stable numeric code, for callers that bucket errors in counters
    pub fn code(&self) -> u16 {
        match self {
            ErrorKind::NilChannel => 1,
            ErrorKind::ClosedChannel => 2,
            ErrorKind::NilReference => 3,
            ErrorKind::OperationFault => 4,
        }
    }

    /// Read the tag off the front of a rendered `GuardError`
    pub fn from_message(message: &str) -> Option<ErrorKind> {
        let (tag, _) = message.split_once(':')?;
        tag.parse().ok()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not an `ErrorKind` tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKindError(String);

impl fmt::Display for ParseKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown error kind tag: {:?}", self.0)
    }
}

impl std::error::Error for ParseKindError {}

impl FromStr for ErrorKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

/// The guarded operation that was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Close,
    Send,
    Receive,
    Deref,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Close => "close",
            Operation::Send => "send",
            Operation::Receive => "receive",
            Operation::Deref => "deref",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the channel or reference as observed at call time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Chan(ChanId),
    /// Referent address; 0 for an absent reference
    Ref(usize),
}

impl Target {
    pub fn is_nil(&self) -> bool {
        match self {
            Target::Chan(id) => id.is_nil(),
            Target::Ref(addr) => *addr == 0,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Chan(id) => write!(f, "chan={}", id),
            Target::Ref(0) => write!(f, "ref=nil"),
            Target::Ref(addr) => write!(f, "ref={:#x}", addr),
        }
    }
}

/// A misuse or fault, converted into a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardError {
    kind: ErrorKind,
    operation: Operation,
    target: Target,
    /// `Debug` rendering of the value a send could not deliver
    value: Option<String>,
    /// Description recovered from an intercepted fault
    fault: Option<String>,
}

impl GuardError {
    pub(crate) fn nil_channel(operation: Operation, value: Option<String>) -> Self {
        Self {
            kind: ErrorKind::NilChannel,
            operation,
            target: Target::Chan(ChanId::NIL),
            value,
            fault: None,
        }
    }

    pub(crate) fn closed_channel(id: ChanId) -> Self {
        Self {
            kind: ErrorKind::ClosedChannel,
            operation: Operation::Receive,
            target: Target::Chan(id),
            value: None,
            fault: None,
        }
    }

    pub(crate) fn nil_reference() -> Self {
        Self {
            kind: ErrorKind::NilReference,
            operation: Operation::Deref,
            target: Target::Ref(0),
            value: None,
            fault: None,
        }
    }

    pub(crate) fn intercepted(
        operation: Operation,
        target: Target,
        fault: Fault,
        value: Option<String>,
    ) -> Self {
        Self {
            kind: ErrorKind::OperationFault,
            operation,
            target,
            value,
            fault: Some(fault.into_message()),
        }
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    #[inline]
    pub fn target(&self) -> Target {
        self.target
    }

    /// The undelivered value, rendered with `Debug` (sends only)
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The intercepted fault's description (`OperationFault` only)
    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    /// True for `NilChannel` and `NilReference`
    pub fn is_nil(&self) -> bool {
        matches!(self.kind, ErrorKind::NilChannel | ErrorKind::NilReference)
    }

    pub fn is_fault(&self) -> bool {
        self.kind == ErrorKind::OperationFault
    }
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.kind, self.operation, self.target)?;
        if let Some(value) = &self.value {
            write!(f, " value={}", value)?;
        }
        if let Some(fault) = &self.fault {
            write!(f, " fault={:?}", fault)?;
        }
        Ok(())
    }
}

impl std::error::Error for GuardError {}

/// Value/error pair view of a guarded result
///
/// On error the value slot holds `T::default()`, the zero value.
pub trait GuardResultExt<T> {
    fn into_pair(self) -> (T, Option<GuardError>);
}

impl<T: Default> GuardResultExt<T> for GuardResult<T> {
    fn into_pair(self) -> (T, Option<GuardError>) {
        match self {
            Ok(value) => (value, None),
            Err(err) => (T::default(), Some(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nil_channel_display() {
        let err = GuardError::nil_channel(Operation::Close, None);
        assert_eq!(err.to_string(), "NilChannel: close chan=nil");
        assert!(err.is_nil());
        assert!(!err.is_fault());
    }

    #[test]
    fn test_nil_send_keeps_value() {
        let err = GuardError::nil_channel(Operation::Send, Some("42".to_string()));
        assert_eq!(err.value(), Some("42"));
        assert_eq!(err.to_string(), "NilChannel: send chan=nil value=42");
    }

    #[test]
    fn test_fault_display_quotes_text() {
        let err = GuardError::intercepted(
            Operation::Deref,
            Target::Ref(0x1000),
            Fault::new("referent dropped"),
            None,
        );
        assert_eq!(
            err.to_string(),
            r#"OperationFault: deref ref=0x1000 fault="referent dropped""#
        );
        assert_eq!(err.fault(), Some("referent dropped"));
    }

    #[test]
    fn test_nil_reference_display() {
        let err = GuardError::nil_reference();
        assert_eq!(err.to_string(), "NilReference: deref ref=nil");
        assert!(err.target().is_nil());
    }

    #[test]
    fn test_tag_round_trip() {
        for kind in ErrorKind::ALL {
            assert_eq!(kind.as_str().parse::<ErrorKind>(), Ok(kind));
        }
        assert!("Closed".parse::<ErrorKind>().is_err());
    }

    #[test]
    fn test_from_message() {
        let err = GuardError::intercepted(
            Operation::Send,
            Target::Chan(ChanId::NIL),
            Fault::new("send on closed channel"),
            Some("7".into()),
        );
        assert_eq!(
            ErrorKind::from_message(&err.to_string()),
            Some(ErrorKind::OperationFault)
        );
        assert_eq!(ErrorKind::from_message("no tag here"), None);
    }

    #[test]
    fn test_codes_are_distinct() {
        let mut codes: Vec<u16> = ErrorKind::ALL.iter().map(|k| k.code()).collect();
        codes.dedup();
        assert_eq!(codes.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn test_into_pair() {
        let ok: GuardResult<i32> = Ok(5);
        assert_eq!(ok.into_pair(), (5, None));

        let err: GuardResult<i32> = Err(GuardError::nil_reference());
        let (value, err) = err.into_pair();
        assert_eq!(value, 0);
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::NilReference));
    }
}
