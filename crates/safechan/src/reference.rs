//! Guarded dereference of optional references
//!
//! `deref` returns `NilReference` for an absent reference and reads
//! through a present one inside the fault boundary. A read that faults,
//! such as upgrading a `Weak` whose referent was dropped, comes back as
//! `OperationFault`.
//!
//! Raw pointers are deliberately not supported: reading a dangling raw
//! pointer is undefined behavior, not a fault that can be intercepted.

use std::rc::Rc;
use std::sync::Arc;

use crate::error::{GuardError, GuardResult, Operation, Target};
use crate::fault::isolate;

/// Fault raised when a nil reference is read directly
pub const NIL_DEREF: &str = "nil reference dereference";

/// Fault raised when a `Weak` referent no longer exists
pub const DROPPED_REFERENT: &str = "referent dropped";

/// A reference that either designates a value or is absent
pub trait Reference {
    type Target;

    fn is_nil(&self) -> bool;

    /// Referent address, 0 when absent
    fn addr(&self) -> usize;

    /// Read a copy of the referent
    ///
    /// # Panics
    ///
    /// When absent, and whenever the underlying type panics on access.
    fn read(&self) -> Self::Target;
}

impl<'a, T: Clone> Reference for Option<&'a T> {
    type Target = T;

    fn is_nil(&self) -> bool {
        self.is_none()
    }

    fn addr(&self) -> usize {
        self.map_or(0, |r| r as *const T as usize)
    }

    fn read(&self) -> T {
        match self {
            Some(r) => (*r).clone(),
            None => panic!("{}", NIL_DEREF),
        }
    }
}

macro_rules! impl_owning_reference {
    ($($ptr:ident),* $(,)?) => {$(
        impl<T: Clone> Reference for Option<$ptr<T>> {
            type Target = T;

            fn is_nil(&self) -> bool {
                self.is_none()
            }

            fn addr(&self) -> usize {
                self.as_ref().map_or(0, |p| &**p as *const T as usize)
            }

            fn read(&self) -> T {
                match self {
                    Some(p) => (**p).clone(),
                    None => panic!("{}", NIL_DEREF),
                }
            }
        }
    )*};
}

impl_owning_reference!(Box, Rc, Arc);

macro_rules! impl_weak_reference {
    ($($weak:path),* $(,)?) => {$(
        impl<T: Clone> Reference for Option<$weak> {
            type Target = T;

            fn is_nil(&self) -> bool {
                self.is_none()
            }

            fn addr(&self) -> usize {
                self.as_ref().map_or(0, |w| w.as_ptr() as usize)
            }

            /// Panics if every strong reference is gone
            fn read(&self) -> T {
                let Some(weak) = self else {
                    panic!("{}", NIL_DEREF);
                };
                match weak.upgrade() {
                    Some(strong) => (*strong).clone(),
                    None => panic!("{}", DROPPED_REFERENT),
                }
            }
        }
    )*};
}

impl_weak_reference!(std::sync::Weak<T>, std::rc::Weak<T>);

/// Read through `reference`
///
/// - absent: `NilReference`, nothing read
/// - read faults: `OperationFault` carrying the fault text
///
/// Use `GuardResultExt::into_pair` for the `(zero value, error)` form.
pub fn deref<R>(reference: &R) -> GuardResult<R::Target>
where
    R: Reference + ?Sized,
{
    if reference.is_nil() {
        return Err(GuardError::nil_reference());
    }

    let target = Target::Ref(reference.addr());
    isolate(|| reference.read())
        .map_err(|fault| GuardError::intercepted(Operation::Deref, target, fault, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, GuardResultExt};
    use crate::testutil::quiet_faults;
    use std::thread;

    #[test]
    fn test_valid_borrow() {
        let value = 17u64;
        assert_eq!(deref(&Some(&value)), Ok(17));
    }

    #[test]
    fn test_absent_reference() {
        let absent: Option<&String> = None;
        let (value, err) = deref(&absent).into_pair();
        assert_eq!(value, String::new());

        let err = err.unwrap();
        assert_eq!(err.kind(), ErrorKind::NilReference);
        assert_eq!(err.operation(), Operation::Deref);
        assert_eq!(err.to_string(), "NilReference: deref ref=nil");
    }

    #[test]
    fn test_owning_pointers() {
        assert_eq!(deref(&Some(Box::new(vec![1, 2]))), Ok(vec![1, 2]));
        assert_eq!(deref(&Some(Rc::new('x'))), Ok('x'));
        assert_eq!(deref(&Some(Arc::new("shared"))), Ok("shared"));
        assert_eq!(
            deref(&None::<Arc<i32>>).unwrap_err().kind(),
            ErrorKind::NilReference
        );
    }

    #[test]
    fn test_target_identity_is_referent_address() {
        let boxed = Some(Box::new(5i32));
        let addr = boxed.as_deref().map(|r| r as *const i32 as usize);
        assert_eq!(Reference::addr(&boxed), addr.unwrap());
        assert_ne!(Reference::addr(&boxed), 0);
    }

    #[test]
    fn test_never_upgradable_weak_is_fault() {
        quiet_faults();
        let weak: Option<std::sync::Weak<String>> = Some(std::sync::Weak::new());
        let err = deref(&weak).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OperationFault);
        assert_eq!(err.fault(), Some(DROPPED_REFERENT));
    }

    #[test]
    fn test_rc_weak() {
        quiet_faults();
        let strong = Rc::new(vec!["a"]);
        let weak = Some(Rc::downgrade(&strong));
        assert_eq!(deref(&weak), Ok(vec!["a"]));
        drop(strong);
        assert!(deref(&weak).unwrap_err().is_fault());
    }

    #[test]
    fn test_weak_read_from_other_thread() {
        quiet_faults();
        let strong = Arc::new(5u8);
        let weak = Some(Arc::downgrade(&strong));
        let reader = thread::spawn(move || deref(&weak));
        assert_eq!(reader.join().unwrap(), Ok(5));
        drop(strong);
    }

    #[test]
    fn test_dropped_weak_is_fault() {
        quiet_faults();
        let strong = Arc::new(99u32);
        let weak = Some(Arc::downgrade(&strong));
        assert_eq!(deref(&weak), Ok(99));

        drop(strong);
        let (value, err) = deref(&weak).into_pair();
        assert_eq!(value, 0);
        let err = err.unwrap();
        assert!(err.is_fault());
        assert_eq!(err.fault(), Some(DROPPED_REFERENT));
        assert!(err.to_string().starts_with("OperationFault: deref ref=0x"));
    }

    #[test]
    #[should_panic(expected = "nil reference dereference")]
    fn test_raw_read_of_absent_panics() {
        None::<&u8>.read();
    }
}
