//! Commonly used items for convenient importing.
//!
//! ```rust
//! use errorx::prelude::*;
//!
//! fn divide(a: i32, b: i32) -> Result<i32, Cause> {
//!     if b == 0 {
//!         bail!("cannot divide {a} by zero");
//!     }
//!     Ok(a / b)
//! }
//!
//! let err = divide(1, 0).wrap_err("Calculator", "divide").unwrap_err();
//! assert_eq!(err.to_string(), "[Calculator] divide - cannot divide 1 by zero");
//! ```
//!
//! This prelude includes [`Error`], [`Cause`], [`ResultExt`], the free
//! functions [`wrap`], [`is`] and [`try_get`], and the [`errorx!`],
//! [`bail!`] and [`context!`] macros.

pub use crate::{Cause, Error, ResultExt, bail, context, errorx, is, try_get, wrap};
