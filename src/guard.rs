//! Running closures under a panic guard.
//!
//! [`try_run`] executes a closure and turns a panic inside it into an
//! [`Error`] instead of unwinding further. The recovered error carries
//! [`PANIC_MESSAGE`] as its message, the panic payload as its cause and the
//! stack trace of the panic site under [`TRACE_KEY`].
//!
//! The first guarded call installs a process-wide panic hook. While a guarded
//! call is running on the current thread, the hook records the trace and keeps
//! the default panic report off stderr. Panics outside guarded calls are
//! forwarded to the hook that was installed before.
//!
//! ```
//! use errorx::{Cause, TRACE_KEY, guard};
//!
//! let err = guard::try_run(|| -> Result<(), Cause> { panic!("index out of range") })
//!     .unwrap_err();
//!
//! let recovered = err.as_error().unwrap();
//! assert_eq!(recovered.message(), guard::PANIC_MESSAGE);
//! assert_eq!(recovered.inner_error().unwrap().to_string(), "index out of range");
//! assert!(recovered.context().contains_key(TRACE_KEY));
//! ```

use alloc::{boxed::Box, string::String, vec::Vec};
use core::{
    any::Any,
    cell::{Cell, RefCell},
    panic::AssertUnwindSafe,
};
use std::sync::Once;

use crate::{Cause, Error, TRACE_KEY, trace};

/// Message of every error produced from a recovered panic.
pub const PANIC_MESSAGE: &str = "PANIC RECOVER";

static INSTALL_HOOK: Once = Once::new();

std::thread_local! {
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
    static PANIC_TRACE: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if GUARD_DEPTH.try_with(Cell::get).unwrap_or(0) > 0 {
                let captured = trace::capture();
                let pending = PANIC_TRACE
                    .try_with(|slot| slot.borrow_mut().replace(captured).is_some())
                    .unwrap_or(true);
                if !must_report(cfg!(panic = "unwind"), pending) {
                    return;
                }
            }
            previous(info);
        }));
    });
}

/// Whether a panic inside a guarded call still goes to the previous hook.
///
/// Without unwinding the panic aborts the process. A trace that is still
/// pending means an earlier panic is unwinding and this one aborts as well.
fn must_report(unwinds: bool, pending_trace: bool) -> bool {
    !unwinds || pending_trace
}

/// Marks the current thread as running a guarded call.
struct GuardScope;

impl GuardScope {
    fn enter() -> Self {
        install_hook();
        GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
        PANIC_TRACE.with(|slot| slot.borrow_mut().take());
        Self
    }
}

impl Drop for GuardScope {
    fn drop(&mut self) {
        let _ = GUARD_DEPTH.try_with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Runs `f`, turning a panic into an error.
///
/// An `Err` returned by `f` is passed through untouched. A panic yields an
/// [`Error`] as described in the [module documentation](self).
pub fn try_run<T, F>(f: F) -> Result<T, Cause>
where
    F: FnOnce() -> Result<T, Cause>,
{
    let outcome = {
        let _scope = GuardScope::enter();
        std::panic::catch_unwind(AssertUnwindSafe(f))
    };

    match outcome {
        Ok(result) => result,
        Err(payload) => Err(recover(&*payload).into()),
    }
}

/// Runs `f` with a context value, turning a panic into an error.
///
/// `None` hands `C::default()` to `f`.
///
/// ```
/// use errorx::guard;
///
/// #[derive(Default)]
/// struct Request {
///     id: u32,
/// }
///
/// let id = guard::try_context(None, |request: Request| Ok(request.id)).unwrap();
/// assert_eq!(id, 0);
///
/// let id = guard::try_context(Some(Request { id: 7 }), |request| Ok(request.id)).unwrap();
/// assert_eq!(id, 7);
/// ```
pub fn try_context<C, T, F>(context: Option<C>, f: F) -> Result<T, Cause>
where
    C: Default,
    F: FnOnce(C) -> Result<T, Cause>,
{
    let context = context.unwrap_or_default();
    try_run(move || f(context))
}

/// Runs `f` under the guard and discards the outcome.
pub fn try_must<T, F>(f: F)
where
    F: FnOnce() -> Result<T, Cause>,
{
    let _ = try_run(f);
}

/// Builds the error for a caught panic payload.
///
/// Returns `None` when there is no payload, so the result of
/// [`std::panic::catch_unwind`] can be passed through directly:
///
/// ```
/// use errorx::guard;
///
/// let payload = std::panic::catch_unwind(|| {
///     panic!("boom");
/// })
/// .err();
/// let err = guard::catch_panic(payload.as_deref()).unwrap();
/// assert_eq!(err.to_string().lines().next(), Some("PANIC RECOVER: boom. Context: "));
///
/// assert!(guard::catch_panic(None).is_none());
/// ```
pub fn catch_panic(payload: Option<&(dyn Any + Send)>) -> Option<Error> {
    payload.map(recover)
}

fn recover(payload: &(dyn Any + Send)) -> Error {
    let cause = payload_cause(payload);
    tracing::warn!(panic = %cause, "recovered panic in guarded call");

    let captured = PANIC_TRACE
        .try_with(|slot| slot.borrow_mut().take())
        .ok()
        .flatten()
        .unwrap_or_else(trace::capture);

    let mut error = Error::new(PANIC_MESSAGE);
    error.set_error([cause]).add_context(TRACE_KEY, captured);
    error
}

fn payload_cause(payload: &(dyn Any + Send)) -> Cause {
    if let Some(cause) = payload.downcast_ref::<Cause>() {
        cause.clone()
    } else if let Some(error) = payload.downcast_ref::<Error>() {
        Cause::from(error.clone())
    } else if let Some(message) = payload.downcast_ref::<&'static str>() {
        Cause::msg(message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        Cause::msg(message)
    } else {
        Cause::msg("Box<dyn Any>")
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, string::ToString};

    use super::*;
    use crate::is;

    fn panic_with<P: Any + Send + 'static>(payload: P) -> Error {
        let err = try_run(|| -> Result<(), Cause> { std::panic::panic_any(payload) }).unwrap_err();
        err.as_error().cloned().unwrap()
    }

    #[test]
    fn test_ok_passes_through() {
        assert_eq!(try_run(|| Ok(5)).unwrap(), 5);
    }

    #[test]
    fn test_err_passes_through() {
        let sentinel = Cause::msg("failed");
        let err = try_run(|| -> Result<(), Cause> { Err(sentinel.clone()) }).unwrap_err();
        assert!(is(&err, &sentinel));
        assert!(err.as_plain().is_some());
    }

    #[test]
    fn test_panic_becomes_error() {
        let err = panic_with("boom");
        assert_eq!(err.message(), PANIC_MESSAGE);
        assert!(!err.has_type());
        assert_eq!(err.inner_error().map(ToString::to_string).as_deref(), Some("boom"));

        let trace = err.context()[TRACE_KEY].as_lines().unwrap();
        assert!(!trace.is_empty());
    }

    #[test]
    fn test_payload_kinds() {
        assert_eq!(panic_with(format!("code {}", 7)).inner_error().unwrap().to_string(), "code 7");
        assert_eq!(panic_with(42_u8).inner_error().unwrap().to_string(), "Box<dyn Any>");

        let sentinel = Cause::msg("sentinel");
        let recovered = panic_with(sentinel.clone());
        assert!(recovered.is(&sentinel));

        let typed = panic_with(Error::new("inner").with_type("Db"));
        assert_eq!(typed.to_string().lines().next(), Some("PANIC RECOVER: [Db] inner. Context: "));
    }

    #[test]
    fn test_unrecoverable_panics_are_reported() {
        assert!(!must_report(true, false));
        assert!(must_report(false, false));
        assert!(must_report(true, true));
        assert!(must_report(false, true));
    }

    #[test]
    fn test_trace_slot_cleared_after_recovery() {
        let _ = panic_with("first");
        assert!(PANIC_TRACE.with(|slot| slot.borrow().is_none()));
    }

    #[test]
    fn test_guard_depth_restored() {
        let _ = panic_with("first");
        assert_eq!(GUARD_DEPTH.with(Cell::get), 0);

        let nested = try_run(|| try_run(|| -> Result<(), Cause> { panic!("inner") }));
        let err = nested.unwrap_err();
        assert_eq!(err.as_error().map(Error::message).as_deref(), Some(PANIC_MESSAGE));
        assert_eq!(GUARD_DEPTH.with(Cell::get), 0);
    }

    #[test]
    fn test_try_context_default() {
        let value = try_context(None, |context: Vec<u8>| Ok(context.len())).unwrap();
        assert_eq!(value, 0);

        let err = try_context(Some(1_u32), |context| -> Result<(), Cause> {
            panic!("context {context}")
        })
        .unwrap_err();
        assert_eq!(
            err.as_error().and_then(Error::inner_error).map(ToString::to_string).as_deref(),
            Some("context 1")
        );
    }

    #[test]
    fn test_try_must_swallows_panic() {
        try_must(|| -> Result<(), Cause> { panic!("ignored") });
        try_must(|| Err::<(), _>(Cause::msg("ignored")));
    }

    #[test]
    fn test_catch_panic_none() {
        assert!(catch_panic(None).is_none());

        let payload: Box<dyn Any + Send> = Box::new("direct");
        let err = catch_panic(Some(&*payload)).unwrap();
        assert_eq!(err.message(), PANIC_MESSAGE);
        assert!(err.context().contains_key(TRACE_KEY));
    }
}
