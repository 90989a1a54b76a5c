//! Shared sentinel errors.
//!
//! A sentinel is a plain error created once and compared by identity. Every
//! handle obtained from this module refers to the same allocation, so
//! [`is`](crate::is) recognises it anywhere in a chain, however many layers
//! were wrapped around it.
//!
//! ```
//! use errorx::{Cause, ResultExt, is, sentinel};
//!
//! fn find(id: u32) -> Result<String, Cause> {
//!     Err(sentinel::NOT_FOUND.clone()).wrap_err("User Repository", format!("GetByID {id}"))
//! }
//!
//! let err = find(7).unwrap_err();
//! assert!(is(&err, &*sentinel::NOT_FOUND));
//! assert!(!is(&err, &*sentinel::CONFLICT));
//! assert_eq!(err.to_string(), "[User Repository] GetByID 7: not found");
//! ```

use spin::Lazy;

use crate::Cause;

/// The requested entity does not exist.
pub static NOT_FOUND: Lazy<Cause> = Lazy::new(|| Cause::msg("not found"));

/// The entity to create already exists.
pub static ALREADY_EXISTS: Lazy<Cause> = Lazy::new(|| Cause::msg("already exists"));

/// The input was rejected.
pub static BAD_REQUEST: Lazy<Cause> = Lazy::new(|| Cause::msg("bad request"));

/// The caller is not authenticated.
pub static UNAUTHORIZED: Lazy<Cause> = Lazy::new(|| Cause::msg("unauthorized"));

/// The caller may not perform the operation.
pub static FORBIDDEN: Lazy<Cause> = Lazy::new(|| Cause::msg("forbidden"));

/// The operation conflicts with the current state.
pub static CONFLICT: Lazy<Cause> = Lazy::new(|| Cause::msg("conflict"));

/// The operation did not finish in time.
pub static TIMEOUT: Lazy<Cause> = Lazy::new(|| Cause::msg("timeout"));

/// An unexpected internal failure.
pub static INTERNAL: Lazy<Cause> = Lazy::new(|| Cause::msg("internal"));

/// All sentinels with their names.
pub fn registry() -> [(&'static str, &'static Cause); 8] {
    [
        ("not found", &*NOT_FOUND),
        ("already exists", &*ALREADY_EXISTS),
        ("bad request", &*BAD_REQUEST),
        ("unauthorized", &*UNAUTHORIZED),
        ("forbidden", &*FORBIDDEN),
        ("conflict", &*CONFLICT),
        ("timeout", &*TIMEOUT),
        ("internal", &*INTERNAL),
    ]
}

/// Finds a sentinel by name, ignoring ASCII case.
///
/// ```
/// use errorx::{is, sentinel};
///
/// let timeout = sentinel::lookup("Timeout").unwrap();
/// assert!(is(timeout, &*sentinel::TIMEOUT));
/// assert!(sentinel::lookup("teapot").is_none());
/// ```
pub fn lookup(name: &str) -> Option<&'static Cause> {
    registry()
        .into_iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, sentinel)| sentinel)
}

/// The name of the sentinel found in `err`'s chain, if any.
///
/// ```
/// use errorx::{Cause, sentinel};
///
/// let mut err = sentinel::FORBIDDEN.clone();
/// err.wrap("Gateway", "authorize");
/// assert_eq!(sentinel::classify(&err), Some("forbidden"));
/// assert_eq!(sentinel::classify(&Cause::msg("forbidden")), None);
/// ```
pub fn classify(err: &Cause) -> Option<&'static str> {
    registry()
        .into_iter()
        .find(|(_, sentinel)| crate::is(err, *sentinel))
        .map(|(name, _)| name)
}
