//! Questions about a [`Cause`] that look through wrappers.
//!
//! Every function here finds an annotated [`Error`] wherever it sits: at the
//! top level, somewhere in a foreign error's [`source`] chain, or inside a
//! [`JoinedError`].
//!
//! Matching follows two rules. Annotated errors match structurally, by type
//! and rendering. Foreign errors and joined aggregates match by identity: a
//! clone of a handle matches the handle, a fresh error with the same message
//! does not.
//!
//! [`source`]: core::error::Error::source
//!
//! ```
//! use errorx::{Cause, Error, is, is_type, wrap};
//!
//! let sentinel = Cause::msg("not found");
//!
//! let mut err = Some(sentinel.clone());
//! wrap("Repository", &mut err, "GetByID");
//! let err = err.unwrap();
//!
//! assert!(is(&err, &sentinel));
//! assert!(!is(&err, &Cause::msg("not found")));
//! assert!(is_type(&err, "Repository"));
//! ```

use alloc::string::{String, ToString};
use core::ptr;

use crate::{Cause, DEFAULT_TYPE, Error, JoinedError, PlainError};

/// Whether `target` is found in `err`'s chain.
///
/// Returns `false` if either side is absent. When both sides hold an
/// annotated error they are compared structurally, see [`Error::is`].
/// Otherwise the chain of `err` is walked: foreign errors match by identity
/// and through their [`source`](core::error::Error::source) chain, annotated
/// errors match through [`Error::is`] and their unwrapped layers, joined
/// aggregates match by identity or through any member.
///
/// ```
/// use errorx::{Cause, Error, is};
///
/// let a = Cause::from(Error::new("m").with_type("t"));
/// let b = Cause::from(Error::new("m").with_type("t"));
/// assert!(is(&a, &b));
/// assert!(!is(&a, None));
/// ```
pub fn is<'a, 'b>(err: impl Into<Option<&'a Cause>>, target: impl Into<Option<&'b Cause>>) -> bool {
    let (Some(err), Some(target)) = (err.into(), target.into()) else {
        return false;
    };

    match (try_get(err), try_get(target)) {
        (Some(err), Some(target)) => err == target,
        _ => chain_contains(err, target),
    }
}

/// Finds the annotated error in `err`.
///
/// Looks at the top level first, then walks a foreign error's
/// [`source`](core::error::Error::source) chain, and searches joined
/// aggregates member by member.
///
/// ```
/// use errorx::{Cause, Error, try_get};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("request failed")]
/// struct RequestError(#[source] Error);
///
/// let err = Cause::from(RequestError(Error::new("inner").with_type("Db")));
/// assert_eq!(try_get(&err).map(Error::error_type).as_deref(), Some("Db"));
/// assert!(try_get(&Cause::msg("plain")).is_none());
/// ```
pub fn try_get(err: &Cause) -> Option<&Error> {
    match err {
        Cause::Annotated(error) => Some(error),
        Cause::Plain(plain) => find_in_sources(plain.as_dyn()),
        Cause::Joined(joined) => joined.iter().find_map(try_get),
    }
}

/// Narrows a handle to the annotated error inside it.
///
/// Returns the original handle when it holds no annotated error. An error
/// found below a foreign wrapper or inside a joined aggregate is cloned out.
pub fn get(err: Cause) -> Result<Error, Cause> {
    match err {
        Cause::Annotated(error) => Ok(*error),
        other => {
            let found = try_get(&other).cloned();
            found.ok_or(other)
        }
    }
}

/// The rendered type of the annotated error in `err`, or [`DEFAULT_TYPE`].
pub fn error_type(err: &Cause) -> String {
    try_get(err).map_or_else(|| DEFAULT_TYPE.to_string(), Error::error_type)
}

/// Whether `err` holds an annotated error whose rendered type is exactly
/// `error_type`.
pub fn is_type(err: &Cause, error_type: &str) -> bool {
    try_get(err).is_some_and(|custom| custom.error_type() == error_type)
}

/// Walks the chain of `err` looking for `target`.
///
/// Every layer is visited once: annotated errors are compared with the
/// annotated error in `target`, if any, and the walk continues with their
/// immediate cause.
pub(crate) fn chain_contains(err: &Cause, target: &Cause) -> bool {
    walk(err, target, try_get(target))
}

fn walk(err: &Cause, target: &Cause, custom: Option<&Error>) -> bool {
    match err {
        Cause::Plain(plain) => sources_contain(plain.as_dyn(), target, custom),
        Cause::Annotated(error) => annotated_contains(error, target, custom),
        Cause::Joined(joined) => joined_contains(joined, target, custom),
    }
}

fn annotated_contains(error: &Error, target: &Cause, custom: Option<&Error>) -> bool {
    custom.is_some_and(|custom| error == custom)
        || error
            .inner_error()
            .is_some_and(|inner| walk(inner, target, custom))
}

fn joined_contains(joined: &JoinedError, target: &Cause, custom: Option<&Error>) -> bool {
    matches!(target, Cause::Joined(other) if joined.same_as(other))
        || joined.iter().any(|member| walk(member, target, custom))
}

fn sources_contain(
    error: &(dyn core::error::Error + 'static),
    target: &Cause,
    custom: Option<&Error>,
) -> bool {
    let mut current = Some(error);
    while let Some(error) = current {
        if let Cause::Plain(target) = target {
            let same = match error.downcast_ref::<PlainError>() {
                Some(plain) => plain.same_as(target),
                None => ptr::addr_eq(error, target.as_dyn()),
            };
            if same {
                return true;
            }
        }
        if let Some(annotated) = error.downcast_ref::<Error>() {
            return annotated_contains(annotated, target, custom);
        }
        if let Some(joined) = error.downcast_ref::<JoinedError>() {
            return joined_contains(joined, target, custom);
        }
        current = match error.downcast_ref::<PlainError>() {
            Some(plain) => Some(plain.as_dyn()),
            None => error.source(),
        };
    }
    false
}

fn find_in_sources<'a>(error: &'a (dyn core::error::Error + 'static)) -> Option<&'a Error> {
    let mut current = Some(error);
    while let Some(error) = current {
        if let Some(annotated) = error.downcast_ref::<Error>() {
            return Some(annotated);
        }
        if let Some(joined) = error.downcast_ref::<JoinedError>() {
            return joined.iter().find_map(try_get);
        }
        current = match error.downcast_ref::<PlainError>() {
            Some(plain) => Some(plain.as_dyn()),
            None => error.source(),
        };
    }
    None
}
