#![no_std]
#![deny(
    missing_docs,
    unsafe_code,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Layered error annotation for Rust.
//!
//! ## Overview
//!
//! An [`Error`] records *how* a failure travelled up the call stack. Every
//! layer that sees the failure can push a message and a type label onto it,
//! merge structured context into it, and the value keeps a single cause that
//! points back at the underlying failure. Nothing is lost on the way up: the
//! rendered error reads most-recent-layer-first.
//!
//! ```
//! use errorx::{Cause, Error, wrap};
//!
//! fn query() -> Result<(), Cause> {
//!     Err(Cause::msg("connection reset"))
//! }
//!
//! fn repository() -> Result<(), Cause> {
//!     let mut err = query().err();
//!     wrap("User Repository", &mut err, "GetByID");
//!     err.map_or(Ok(()), Err)
//! }
//!
//! fn usecase() -> Result<(), Cause> {
//!     let mut err = repository().err();
//!     wrap("User Usecase", &mut err, "GetUser");
//!     err.map_or(Ok(()), Err)
//! }
//!
//! let err = usecase().unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "[User Usecase - User Repository] GetUser - GetByID: connection reset"
//! );
//! ```
//!
//! ## Core Concepts
//!
//! An [`Error`] holds four things:
//! - A stack of **messages**, one per layer, never empty.
//! - A stack of **types**, free-form category labels, possibly empty.
//! - A **context** map from string keys to [`ContextValue`]s. The `"trace"`
//!   key is reserved for stack traces.
//! - At most one **cause**, a [`Cause`].
//!
//! A [`Cause`] is the handle type that flows through `Result`s. It is one of
//! three variants: a plain foreign error, an annotated [`Error`], or a
//! [`JoinedError`] aggregate of several causes. Any
//! [`core::error::Error`] converts into a [`Cause`], so `?` works on std
//! errors.
//!
//! ## Layering
//!
//! [`wrap`] is the main entry point for call sites. The first call that sees a
//! foreign error promotes it to an [`Error`] exactly once; later calls push
//! further layers onto the same value instead of nesting wrapper inside
//! wrapper. The same is available on `Result`s through [`ResultExt`].
//!
//! ## Inspecting
//!
//! [`is`], [`try_get`], [`get`], [`error_type`] and [`is_type`] answer
//! questions about a [`Cause`] without caring how deep the [`Error`] sits.
//! Annotated errors compare structurally: two errors with the same type and
//! the same rendering are equal. Plain errors compare by identity, which is
//! what the [`sentinel`] registry relies on.
//!
//! ## Panics
//!
//! With the `std` feature, the [`guard`] module runs closures under a panic
//! guard and turns panics into [`Error`]s carrying the panic-site stack
//! trace. See [`guard::try_run`].
//!
//! ## Features
//!
//! - `std` (default): the panic guard and stack trace capture.
//! - `backtrace`: capture panic traces with the `backtrace` crate and filter
//!   out runtime frames. See [`trace::TraceFilter`].

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

#[macro_use]
mod macros;

mod cause;
pub mod context;
mod error;
pub mod inspect;
mod joined;
pub mod prelude;
mod result_ext;
pub mod sentinel;
mod util;
mod wrap;

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub mod guard;
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub mod trace;

pub use self::{
    cause::{Cause, PlainError},
    context::{Context, ContextObject, ContextValue, TRACE_KEY},
    error::Error,
    inspect::{error_type, get, is, is_type, try_get},
    joined::JoinedError,
    result_ext::ResultExt,
    wrap::{copy, wrap, wrap_with_context},
};

/// The type reported for errors that carry no type label.
pub const DEFAULT_TYPE: &str = "";

/// A [`Result`](core::result::Result) type alias where the error is a
/// [`Cause`].
pub type Result<T, E = Cause> = core::result::Result<T, E>;

// Not public API. Referenced by macro-generated code.
#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    pub use alloc::format;
    #[doc(hidden)]
    pub use core::result::Result::Err;

    use alloc::string::String;
    use core::fmt;

    use crate::{Context, ContextValue, Error};

    #[doc(hidden)]
    #[inline]
    #[cold]
    #[must_use]
    pub fn format_error(args: fmt::Arguments<'_>) -> Error {
        match args.as_str() {
            Some(message) => Error::new(message),
            None => Error::new(alloc::fmt::format(args)),
        }
    }

    #[doc(hidden)]
    #[inline]
    pub fn context_insert<K, V>(context: &mut Context, key: K, value: V)
    where
        K: Into<String>,
        V: Into<ContextValue>,
    {
        context.insert(key.into(), value.into());
    }
}
