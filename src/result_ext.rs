use alloc::string::String;

use crate::{Cause, Context, ContextValue};

mod sealed {
    pub trait Sealed {}
    impl<V, E> Sealed for Result<V, E> {}
}

/// Extension methods that apply [`wrap`](crate::wrap) to the error of a
/// `Result`.
///
/// Any error that converts into a [`Cause`] is accepted, so std errors can be
/// annotated right where they appear:
///
/// ```
/// use errorx::{Cause, ResultExt};
///
/// fn parse(input: &str) -> Result<u16, Cause> {
///     input.parse::<u16>().wrap_err("Config", "parse port")
/// }
///
/// let err = parse("http").unwrap_err();
/// assert_eq!(
///     err.to_string(),
///     "[Config] parse port: invalid digit found in string"
/// );
/// ```
pub trait ResultExt<V, E>: sealed::Sealed {
    /// Converts the error into a [`Cause`] and adds a layer to it.
    fn wrap_err(self, error_type: impl Into<String>, message: impl Into<String>) -> Result<V, Cause>
    where
        E: Into<Cause>;

    /// Like [`ResultExt::wrap_err`], and merges `context` into the error.
    fn wrap_err_with_context<I, K, V2>(
        self,
        error_type: impl Into<String>,
        message: impl Into<String>,
        context: I,
    ) -> Result<V, Cause>
    where
        E: Into<Cause>,
        I: IntoIterator<Item = (K, V2)>,
        K: Into<String>,
        V2: Into<ContextValue>;

    /// Like [`ResultExt::wrap_err`], building the type and message only when
    /// the result is an error.
    fn wrap_err_lazy<T, M, F>(self, layer: F) -> Result<V, Cause>
    where
        E: Into<Cause>,
        T: Into<String>,
        M: Into<String>,
        F: FnOnce() -> (T, M);
}

impl<V, E> ResultExt<V, E> for Result<V, E> {
    #[inline]
    fn wrap_err(self, error_type: impl Into<String>, message: impl Into<String>) -> Result<V, Cause>
    where
        E: Into<Cause>,
    {
        self.wrap_err_with_context(error_type, message, Context::default())
    }

    #[inline]
    fn wrap_err_with_context<I, K, V2>(
        self,
        error_type: impl Into<String>,
        message: impl Into<String>,
        context: I,
    ) -> Result<V, Cause>
    where
        E: Into<Cause>,
        I: IntoIterator<Item = (K, V2)>,
        K: Into<String>,
        V2: Into<ContextValue>,
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => {
                let mut cause: Cause = e.into();
                cause.wrap_with_context(error_type, message, context);
                Err(cause)
            }
        }
    }

    #[inline]
    fn wrap_err_lazy<T, M, F>(self, layer: F) -> Result<V, Cause>
    where
        E: Into<Cause>,
        T: Into<String>,
        M: Into<String>,
        F: FnOnce() -> (T, M),
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => {
                let (error_type, message) = layer();
                let mut cause: Cause = e.into();
                cause.wrap(error_type, message);
                Err(cause)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use core::cell::Cell;

    use super::*;
    use crate::{Error, is};

    #[test]
    fn test_wrap_err_ok_passes_through() {
        let result: Result<u8, Cause> = Ok(3);
        assert_eq!(result.wrap_err("T", "m").unwrap(), 3);
    }

    #[test]
    fn test_wrap_err_layers_accumulate() {
        let sentinel = Cause::msg("root");
        let result: Result<(), Cause> = Err(sentinel.clone());

        let err = result
            .wrap_err("Repository", "GetByID")
            .wrap_err("Usecase", "GetUser")
            .unwrap_err();

        assert_eq!(err.to_string(), "[Usecase - Repository] GetUser - GetByID: root");
        assert!(is(&err, &sentinel));
    }

    #[test]
    fn test_wrap_err_on_annotated_error() {
        let result: Result<(), Error> = Err(Error::new("inner").with_type("Db"));
        let err = result.wrap_err_with_context("Repo", "load", [("id", 9)]).unwrap_err();

        let custom = err.as_error().unwrap();
        assert_eq!(custom.error_type(), "Repo - Db");
        assert_eq!(custom.message(), "load - inner");
        assert_eq!(custom.context()["id"].to_string(), "9");
        assert!(custom.inner_error().is_none());
    }

    #[test]
    fn test_wrap_err_lazy_only_on_error() {
        let called = Cell::new(false);
        let layer = || {
            called.set(true);
            ("T", "m".to_string())
        };

        let ok: Result<(), Cause> = Ok(());
        assert!(ok.wrap_err_lazy(layer).is_ok());
        assert!(!called.get());

        let err: Result<(), Cause> = Err(Cause::msg("x"));
        let err = err.wrap_err_lazy(layer).unwrap_err();
        assert!(called.get());
        assert_eq!(err.to_string(), "[T] m: x");
    }
}
