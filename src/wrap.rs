use alloc::{boxed::Box, string::{String, ToString}};

use crate::{Cause, Context, ContextValue, Error, inspect::try_get};

/// Adds a layer to the error in `err`.
///
/// Does nothing when `err` is `None`. A foreign error is promoted once: it
/// becomes the cause of a new [`Error`] carrying `message` and `error_type`.
/// An error that already holds an annotated [`Error`] is not wrapped again;
/// the type and message are pushed onto the existing value instead, so a
/// failure that travels through many layers stays a single [`Error`].
///
/// # Examples
///
/// ```
/// use errorx::{Cause, try_get, wrap};
///
/// let mut err = Some(Cause::msg("connection refused"));
/// wrap("A", &mut err, "msg1");
/// wrap("B", &mut err, "msg2");
///
/// let custom = try_get(err.as_ref().unwrap()).unwrap();
/// assert_eq!(custom.error_type(), "B - A");
/// assert_eq!(custom.message(), "msg2 - msg1");
/// assert_eq!(custom.unwrap_causes().len(), 1);
///
/// let mut ok: Option<Cause> = None;
/// wrap("A", &mut ok, "never applied");
/// assert!(ok.is_none());
/// ```
pub fn wrap(error_type: impl Into<String>, err: &mut Option<Cause>, message: impl Into<String>) {
    if let Some(cause) = err {
        cause.wrap(error_type, message);
    }
}

/// Like [`wrap`], and merges `context` into the resulting [`Error`].
///
/// ```
/// use errorx::{Cause, context, try_get, wrap_with_context};
///
/// let mut err = Some(Cause::msg("timeout"));
/// wrap_with_context("Client", &mut err, "fetch", context! { "attempt" => 3 });
///
/// let custom = try_get(err.as_ref().unwrap()).unwrap();
/// assert_eq!(custom.context()["attempt"].downcast_ref::<i32>(), Some(&3));
/// ```
pub fn wrap_with_context<I, K, V>(
    error_type: impl Into<String>,
    err: &mut Option<Cause>,
    message: impl Into<String>,
    context: I,
) where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<ContextValue>,
{
    if let Some(cause) = err {
        cause.wrap_with_context(error_type, message, context);
    }
}

/// Creates a new [`Error`] from `err`, adding `causes` as further causes.
///
/// A foreign `err` yields an error whose message is `err`'s rendering and
/// whose cause is `causes`. An annotated `err` is copied with
/// [`Error::copy`]. `err` itself is never modified.
///
/// ```
/// use errorx::{Cause, Error, copy};
///
/// let plain = copy(&Cause::msg("disk full"), [Cause::msg("cleanup failed")]);
/// assert_eq!(plain.to_string(), "disk full: cleanup failed");
///
/// let annotated = Cause::from(Error::new("save").with_type("Storage"));
/// let copied = copy(&annotated, Vec::<Cause>::new());
/// assert_eq!(copied.to_string(), "[Storage] save");
/// ```
pub fn copy<I>(err: &Cause, causes: I) -> Error
where
    I: IntoIterator,
    I::Item: Into<Cause>,
{
    match try_get(err) {
        Some(custom) => custom.copy(causes),
        None => Error::new(err.to_string()).with_error(causes),
    }
}

impl Cause {
    /// Adds a layer to this error in place, see [`wrap`].
    pub fn wrap(&mut self, error_type: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.wrap_with_context(error_type, message, Context::default())
    }

    /// Adds a layer and merges context in place, see [`wrap_with_context`].
    pub fn wrap_with_context<I, K, V>(
        &mut self,
        error_type: impl Into<String>,
        message: impl Into<String>,
        context: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ContextValue>,
    {
        if let Self::Annotated(custom) = self {
            custom
                .set_type(error_type)
                .push_message(message)
                .set_context(context);
            return self;
        }

        let found = try_get(self).cloned();
        let custom = match found {
            Some(mut custom) => {
                custom
                    .set_type(error_type)
                    .push_message(message)
                    .set_context(context);
                custom
            }
            None => {
                let mut promoted = Error::new(message);
                promoted
                    .set_type(error_type)
                    .set_error([self.clone()])
                    .set_context(context);
                promoted
            }
        };

        *self = Self::Annotated(Box::new(custom));
        self
    }

    /// Creates a new [`Error`] from this one, see [`copy`].
    #[must_use]
    pub fn copy<I>(&self, causes: I) -> Error
    where
        I: IntoIterator,
        I::Item: Into<Cause>,
    {
        copy(self, causes)
    }
}
