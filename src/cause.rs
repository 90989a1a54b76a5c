use alloc::{boxed::Box, string::String, sync::Arc};
use core::fmt;

use crate::{Error, JoinedError};

/// An error handle: the value that flows through `Result`s.
///
/// A [`Cause`] is exactly one of three things:
/// - a [`PlainError`], any foreign error this crate cannot look into,
/// - an annotated [`Error`],
/// - a [`JoinedError`] aggregate of several causes.
///
/// Every [`core::error::Error`] converts into a [`Cause`], so the `?`
/// operator lifts std errors automatically. Converting an [`Error`] or a
/// [`JoinedError`] picks the matching variant instead of treating it as a
/// foreign error.
///
/// # Examples
///
/// ```
/// use errorx::{Cause, Error};
///
/// fn read(path: &str) -> Result<String, Cause> {
///     Ok(std::fs::read_to_string(path)?)
/// }
///
/// let err = read("/definitely/not/here").unwrap_err();
/// assert!(err.as_plain().is_some());
///
/// let err = Cause::from(Error::new("annotated"));
/// assert!(err.as_error().is_some());
/// ```
#[derive(Clone, Debug)]
pub enum Cause {
    /// A foreign error.
    Plain(PlainError),
    /// An annotated error.
    Annotated(Box<Error>),
    /// Several causes joined into one.
    Joined(JoinedError),
}

/// A foreign error shared behind an [`Arc`].
///
/// Clones refer to the same error. Two plain errors are the same error
/// exactly when they share the allocation, which is how sentinel errors are
/// recognised anywhere in a chain.
#[derive(Clone)]
pub struct PlainError(Arc<dyn core::error::Error + Send + Sync + 'static>);

struct MessageError(String);

impl PlainError {
    /// Wraps a foreign error.
    pub fn new<E>(error: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// The wrapped error as a trait object.
    pub fn as_dyn(&self) -> &(dyn core::error::Error + Send + Sync + 'static) {
        &*self.0
    }

    /// Returns the wrapped error if it is of type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: core::error::Error + 'static,
    {
        self.0.downcast_ref()
    }

    pub(crate) fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for PlainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl fmt::Debug for PlainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl core::error::Error for PlainError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.0.source()
    }
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl core::error::Error for MessageError {}

impl Cause {
    /// Creates a plain error from a message.
    ///
    /// Every call creates a distinct error, even for equal messages.
    pub fn msg<M: fmt::Display>(message: M) -> Self {
        Self::Plain(PlainError::new(MessageError(alloc::format!("{message}"))))
    }

    /// Returns the annotated error if this handle is one.
    ///
    /// Unlike [`try_get`](crate::try_get) this does not look inside foreign
    /// errors or joined aggregates.
    pub fn as_error(&self) -> Option<&Error> {
        match self {
            Self::Annotated(error) => Some(error),
            _ => None,
        }
    }

    /// Mutable variant of [`Cause::as_error`].
    pub fn as_error_mut(&mut self) -> Option<&mut Error> {
        match self {
            Self::Annotated(error) => Some(error),
            _ => None,
        }
    }

    /// Returns the foreign error if this handle is one.
    pub fn as_plain(&self) -> Option<&PlainError> {
        match self {
            Self::Plain(plain) => Some(plain),
            _ => None,
        }
    }

    /// Returns the joined aggregate if this handle is one.
    pub fn as_joined(&self) -> Option<&JoinedError> {
        match self {
            Self::Joined(joined) => Some(joined),
            _ => None,
        }
    }

    /// The handle as a standard error trait object.
    pub fn as_dyn_error(&self) -> &(dyn core::error::Error + Send + Sync + 'static) {
        match self {
            Self::Plain(plain) => plain.as_dyn(),
            Self::Annotated(error) => &**error,
            Self::Joined(joined) => joined,
        }
    }

    /// Converts the handle into a boxed standard error.
    pub fn into_boxed_error(self) -> Box<dyn core::error::Error + Send + Sync + 'static> {
        match self {
            Self::Plain(plain) => Box::new(plain),
            Self::Annotated(error) => error,
            Self::Joined(joined) => Box::new(joined),
        }
    }

    /// Whether `target` is found in this error's chain.
    ///
    /// Shorthand for [`is(self, target)`](crate::is).
    pub fn is(&self, target: &Cause) -> bool {
        crate::is(self, target)
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(plain) => fmt::Display::fmt(plain, f),
            Self::Annotated(error) => fmt::Display::fmt(error, f),
            Self::Joined(joined) => fmt::Display::fmt(joined, f),
        }
    }
}

impl<E> From<E> for Cause
where
    E: core::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        let boxed: Box<dyn core::error::Error + Send + Sync + 'static> = Box::new(error);
        let boxed = match boxed.downcast::<Error>() {
            Ok(error) => return Self::Annotated(error),
            Err(boxed) => boxed,
        };
        let boxed = match boxed.downcast::<JoinedError>() {
            Ok(joined) => return Self::Joined(*joined),
            Err(boxed) => boxed,
        };
        match boxed.downcast::<PlainError>() {
            Ok(plain) => Self::Plain(*plain),
            Err(boxed) => Self::Plain(PlainError(Arc::from(boxed))),
        }
    }
}

impl From<Cause> for Box<dyn core::error::Error + Send + Sync + 'static> {
    fn from(cause: Cause) -> Self {
        cause.into_boxed_error()
    }
}
