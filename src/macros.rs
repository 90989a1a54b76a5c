/// Creates an [`Error`](crate::Error) from a format string.
///
/// The arguments are interpreted the same way as by the [`format!()`] macro
/// and the result becomes the first message of the new error.
///
/// [`format!()`]: std::format
///
/// # Examples
///
/// ```
/// use errorx::errorx;
///
/// let id = 42;
/// let err = errorx!("user {id} not found");
/// assert_eq!(err.message(), "user 42 not found");
///
/// let err = errorx!("static message");
/// assert_eq!(err.to_string(), "static message");
/// ```
#[macro_export]
macro_rules! errorx {
    ($($arg:tt)+) => {
        $crate::__private::format_error(::core::format_args!($($arg)+))
    };
}

/// Returns early with an error.
///
/// Constructs a new [`Error`](crate::Error) using the same arguments as the
/// [`errorx!`] macro and returns it from the enclosing function wrapped in an
/// `Err`, converted with `Into`.
///
/// # Examples
///
/// ```
/// use errorx::{Cause, bail};
///
/// fn check(value: i32) -> Result<i32, Cause> {
///     if value < 0 {
///         bail!("value must be non-negative, got {}", value);
///     }
///     Ok(value)
/// }
///
/// assert!(check(1).is_ok());
/// assert_eq!(
///     check(-1).unwrap_err().to_string(),
///     "value must be non-negative, got -1"
/// );
/// ```
#[macro_export]
macro_rules! bail {
    ($($arg:tt)+) => {
        return $crate::__private::Err($crate::errorx!($($arg)+).into())
    };
}

/// Builds a [`Context`](crate::Context) map from `key => value` pairs.
///
/// Keys convert with `Into<String>` and values with
/// `Into<`[`ContextValue`](crate::ContextValue)`>`.
///
/// # Examples
///
/// ```
/// use errorx::{Error, context};
///
/// let mut err = Error::new("request failed");
/// err.set_context(context! {
///     "user_id" => 42,
///     "path" => "/users/42",
/// });
///
/// assert_eq!(err.context().len(), 2);
/// assert_eq!(err.context()["path"].as_text(), Some("/users/42"));
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::Context::default()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut context = $crate::Context::default();
        $(
            $crate::__private::context_insert(&mut context, $key, $value);
        )+
        context
    }};
}
