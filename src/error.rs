use alloc::{
    string::{String, ToString},
    vec,
    vec::Vec,
};
use core::fmt;

use crate::{
    Cause, Context, ContextValue, JoinedError, TRACE_KEY,
    inspect::{chain_contains, try_get},
    util::join_layers,
};

/// An annotated error.
///
/// Holds a stack of messages, a stack of type labels, a context map and at
/// most one cause. Both stacks are stored oldest-first and rendered
/// most-recent-first, so each layer that wraps the error reads before the
/// layers below it.
///
/// All mutators take `&mut self` and return `&mut Self` for chaining. The
/// `with_*` variants consume and return the error, which is handier while
/// building a fresh value.
///
/// # Rendering
///
/// ```text
/// [<types>] <messages>: <cause>. Context: <key>=<value>;...
/// ```
///
/// Each section is omitted when empty. Context entries are emitted in key
/// order, and the [`TRACE_KEY`] entry is rendered as indented lines.
///
/// # Examples
///
/// ```
/// use errorx::{Cause, Error};
///
/// let err = Error::new("GetUser")
///     .with_type("User Usecase")
///     .with_error([Cause::msg("no rows")]);
///
/// assert_eq!(err.to_string(), "[User Usecase] GetUser: no rows");
/// ```
#[derive(Clone)]
pub struct Error {
    messages: Vec<String>,
    types: Vec<String>,
    context: Context,
    cause: Option<Cause>,
}

impl Error {
    /// Creates an error with a single message, no types, no context and no
    /// cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
            types: Vec::new(),
            context: Context::default(),
            cause: None,
        }
    }

    /// Pushes a type label.
    ///
    /// No validation is done; an empty label is allowed.
    pub fn set_type(&mut self, error_type: impl Into<String>) -> &mut Self {
        self.types.push(error_type.into());
        self
    }

    /// Consuming variant of [`Error::set_type`].
    #[must_use]
    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.set_type(error_type);
        self
    }

    /// Merges all entries into the context, overwriting existing keys.
    ///
    /// An empty line sequence under [`TRACE_KEY`] is skipped.
    pub fn set_context<I, K, V>(&mut self, context: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ContextValue>,
    {
        for (key, value) in context {
            self.insert_context(key.into(), value.into());
        }
        self
    }

    /// Consuming variant of [`Error::set_context`].
    #[must_use]
    pub fn with_context<I, K, V>(mut self, context: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ContextValue>,
    {
        self.set_context(context);
        self
    }

    /// Sets a single context entry.
    ///
    /// An empty line sequence under [`TRACE_KEY`] is skipped.
    pub fn add_context(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> &mut Self {
        self.insert_context(key.into(), value.into());
        self
    }

    /// Sets a single context entry if a value is present.
    ///
    /// `None` leaves the context untouched.
    pub fn add_optional_context<V>(&mut self, key: impl Into<String>, value: Option<V>) -> &mut Self
    where
        V: Into<ContextValue>,
    {
        if let Some(value) = value {
            self.insert_context(key.into(), value.into());
        }
        self
    }

    /// Removes a context entry. Empty or unknown keys are ignored.
    pub fn remove_context(&mut self, key: &str) -> &mut Self {
        if !key.is_empty() {
            self.context.remove(key);
        }
        self
    }

    /// The context map.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Sets the cause, replacing any previous one.
    ///
    /// No causes leaves the error untouched, a single cause is stored as is,
    /// and several causes are stored as one [`JoinedError`].
    pub fn set_error<I>(&mut self, causes: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Cause>,
    {
        let mut causes: Vec<Cause> = causes.into_iter().map(Into::into).collect();
        match causes.len() {
            0 => {}
            1 => self.cause = causes.pop(),
            _ => self.cause = Some(Cause::Joined(JoinedError::new(causes))),
        }
        self
    }

    /// Consuming variant of [`Error::set_error`].
    #[must_use]
    pub fn with_error<I>(mut self, causes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Cause>,
    {
        self.set_error(causes);
        self
    }

    /// The cause, if any.
    pub fn inner_error(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    pub(crate) fn push_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.messages.push(message.into());
        self
    }

    /// All messages, most recent first, joined by `" - "`.
    ///
    /// ```
    /// # use errorx::{Error, wrap};
    /// let mut err = Some(Error::new("QueryxContext").into());
    /// wrap("", &mut err, "GetByID");
    /// wrap("", &mut err, "GetUser");
    ///
    /// let err = errorx::try_get(err.as_ref().unwrap()).unwrap();
    /// assert_eq!(err.message(), "GetUser - GetByID - QueryxContext");
    /// ```
    pub fn message(&self) -> String {
        join_layers(&self.messages, None)
    }

    /// The `limit` most recent messages joined by `" - "`.
    ///
    /// A limit of zero yields an empty string; a limit beyond the number of
    /// messages yields all of them.
    pub fn message_first(&self, limit: usize) -> String {
        join_layers(&self.messages, Some(limit))
    }

    /// All type labels, most recent first, joined by `" - "`.
    pub fn error_type(&self) -> String {
        join_layers(&self.types, None)
    }

    /// The `limit` most recent type labels joined by `" - "`.
    ///
    /// Follows the same limiting rules as [`Error::message_first`].
    pub fn error_type_first(&self, limit: usize) -> String {
        join_layers(&self.types, Some(limit))
    }

    /// Whether at least one type label was pushed.
    pub fn has_type(&self) -> bool {
        !self.types.is_empty()
    }

    /// Compares this error with `target`.
    ///
    /// When `target` holds an annotated error, the two are compared
    /// structurally: same [`Error::error_type`] and same rendering. Otherwise
    /// the target is looked up along the cause chain, each layer once, where
    /// foreign errors match by identity.
    pub fn is(&self, target: &Cause) -> bool {
        match try_get(target) {
            Some(custom) => self == custom,
            None => self
                .cause
                .as_ref()
                .is_some_and(|inner| chain_contains(inner, target)),
        }
    }

    /// Flattens the cause chain.
    ///
    /// Returns the cause followed by the unwrapped causes of the annotated
    /// error inside it, if any, so every nested layer is exposed. Empty when
    /// there is no cause.
    pub fn unwrap_causes(&self) -> Vec<&Cause> {
        let Some(inner) = &self.cause else {
            return Vec::new();
        };

        let mut unwrapped = vec![inner];
        if let Some(custom) = try_get(inner) {
            unwrapped.extend(custom.unwrap_causes());
        }
        unwrapped
    }

    /// Creates an independent error with the same rendered message, type and
    /// context.
    ///
    /// The copy's cause is this error's cause together with `causes`, joined
    /// when there is more than one. This error is left untouched.
    ///
    /// ```
    /// # use errorx::{Cause, Error};
    /// let original = Error::new("load").with_type("Config");
    /// let copy = original.copy([Cause::msg("retry failed")]);
    ///
    /// assert_eq!(copy.to_string(), "[Config] load: retry failed");
    /// assert!(original.inner_error().is_none());
    /// ```
    #[must_use]
    pub fn copy<I>(&self, causes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Cause>,
    {
        let mut copy = Self::new(self.message());
        if self.has_type() {
            copy.set_type(self.error_type());
        }
        copy.set_context(self.context.clone()).set_error(
            self.cause
                .iter()
                .cloned()
                .chain(causes.into_iter().map(Into::into)),
        );
        copy
    }

    fn insert_context(&mut self, key: String, value: ContextValue) {
        if key == TRACE_KEY && value.is_empty_lines() {
            return;
        }
        self.context.insert(key, value);
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_type() {
            write!(f, "[{}] ", self.error_type())?;
        }

        f.write_str(&self.message())?;

        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }

        if !self.context.is_empty() {
            f.write_str(". Context: ")?;

            let mut entries: Vec<_> = self.context.iter().collect();
            entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

            for (key, value) in entries {
                if key == TRACE_KEY {
                    value.fmt_trace(f)?;
                } else {
                    write!(f, "{key}={value};")?;
                }
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("messages", &self.messages)
            .field("types", &self.types)
            .field("context", &self.context)
            .field("cause", &self.cause)
            .finish()
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.error_type() == other.error_type() && self.to_string() == other.to_string()
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_dyn_error() as &(dyn core::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, vec};

    use super::*;

    static_assertions::assert_impl_all!(Error: Send, Sync, Clone, core::error::Error);

    #[test]
    fn test_new_seeds_one_message() {
        let err = Error::new("m");
        assert_eq!(err.message(), "m");
        assert_eq!(err.error_type(), "");
        assert!(!err.has_type());
        assert!(err.context().is_empty());
        assert!(err.inner_error().is_none());
        assert_eq!(err.to_string(), "m");
    }

    #[test]
    fn test_type_prefix() {
        let mut err = Error::new("m");
        assert!(err.set_type("t").to_string().contains("[t] m"));
    }

    #[test]
    fn test_empty_type_still_renders_brackets() {
        let err = Error::new("m").with_type("");
        assert!(err.has_type());
        assert_eq!(err.to_string(), "[] m");
    }

    #[test]
    fn test_message_stack_order_and_limits() {
        let mut err = Error::new("first");
        err.push_message("second").push_message("third");

        assert_eq!(err.message(), "third - second - first");
        assert_eq!(err.message_first(0), "");
        assert_eq!(err.message_first(1), "third");
        assert_eq!(err.message_first(2), "third - second");
        assert_eq!(err.message_first(3), "third - second - first");
        assert_eq!(err.message_first(10), "third - second - first");
    }

    #[test]
    fn test_type_stack_order_and_limits() {
        let err = Error::new("m")
            .with_type("SQL")
            .with_type("User Repository")
            .with_type("User Usecase");

        assert_eq!(err.error_type(), "User Usecase - User Repository - SQL");
        assert_eq!(err.error_type_first(0), "");
        assert_eq!(err.error_type_first(2), "User Usecase - User Repository");
        assert_eq!(err.error_type_first(99), "User Usecase - User Repository - SQL");
    }

    #[test]
    fn test_context_merge_and_overwrite() {
        let mut err = Error::new("m");
        err.add_context("a", 1).set_context([("a", 2), ("b", 3)]);

        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context()["a"].downcast_ref::<i32>(), Some(&2));
        assert_eq!(err.context()["b"].downcast_ref::<i32>(), Some(&3));
    }

    #[test]
    fn test_empty_set_context_is_noop() {
        let mut err = Error::new("m");
        err.set_context(Context::default());
        assert!(err.context().is_empty());
        assert_eq!(err.to_string(), "m");
    }

    #[test]
    fn test_optional_context() {
        let mut err = Error::new("m");
        err.add_optional_context("missing", None::<i32>)
            .add_optional_context("present", Some("yes"));

        assert!(!err.context().contains_key("missing"));
        assert_eq!(err.context()["present"].as_text(), Some("yes"));
    }

    #[test]
    fn test_empty_trace_lines_are_dropped() {
        let mut err = Error::new("m");
        err.add_context(TRACE_KEY, Vec::<String>::new());
        assert!(!err.context().contains_key(TRACE_KEY));

        err.set_context([(TRACE_KEY, Vec::<String>::new())]);
        assert!(!err.context().contains_key(TRACE_KEY));

        // Other keys accept empty sequences.
        err.add_context("frames", Vec::<String>::new());
        assert!(err.context().contains_key("frames"));

        // Empty text is still stored under the trace key.
        err.add_context(TRACE_KEY, "");
        assert!(err.context().contains_key(TRACE_KEY));
    }

    #[test]
    fn test_remove_context() {
        let mut err = Error::new("m");
        err.add_context("a", "x").add_context("b", "y");

        err.remove_context("").remove_context("missing").remove_context("a");
        assert_eq!(err.context().len(), 1);
        assert!(err.context().contains_key("b"));
    }

    #[test]
    fn test_set_error_counts() {
        let mut err = Error::new("m");
        err.set_error(Vec::<Cause>::new());
        assert!(err.inner_error().is_none());

        err.set_error([Cause::msg("one")]);
        assert!(matches!(err.inner_error(), Some(Cause::Plain(_))));

        err.set_error([Cause::msg("two"), Cause::msg("three")]);
        let joined = err.inner_error().and_then(Cause::as_joined).unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(err.to_string(), "m: two\nthree");
    }

    #[test]
    fn test_rendering_full() {
        let err = Error::new("GetUser")
            .with_type("Repository")
            .with_error([Cause::msg("no rows")])
            .with_context([("id", 42)]);

        assert_eq!(err.to_string(), "[Repository] GetUser: no rows. Context: id=42;");
    }

    #[test]
    fn test_rendering_context_sorted_by_key() {
        let err = Error::new("m").with_context([("b", "2"), ("a", "1"), ("c", "3")]);
        assert_eq!(err.to_string(), "m. Context: a=1;b=2;c=3;");
    }

    #[test]
    fn test_rendering_trace_lines() {
        let mut err = Error::new("m");
        err.add_context(TRACE_KEY, vec!["main", "run"]);
        assert_eq!(err.to_string(), "m. Context: \n\tmain\n\trun");

        err.add_context(TRACE_KEY, "single");
        assert_eq!(err.to_string(), "m. Context: \n\tsingle");

        err.add_context(TRACE_KEY, 7);
        assert_eq!(err.to_string(), "m. Context: \n\t7");
    }

    #[test]
    fn test_unwrap_empty_without_cause() {
        assert!(Error::new("m").unwrap_causes().is_empty());
    }

    #[test]
    fn test_unwrap_flattens_nested_errors() {
        let root = Cause::msg("root");
        let inner = Error::new("inner").with_error([root.clone()]);
        let outer = Error::new("outer").with_error([inner]);

        let unwrapped = outer.unwrap_causes();
        assert_eq!(unwrapped.len(), 2);
        assert_eq!(unwrapped[0].to_string(), "inner: root");
        assert_eq!(unwrapped[1].to_string(), "root");
    }

    #[test]
    fn test_unwrap_joined() {
        let err = Error::new("m").with_error([Cause::msg("e1"), Cause::msg("e2")]);
        let unwrapped = err.unwrap_causes();

        assert_eq!(unwrapped.len(), 1);
        let rendered = unwrapped[0].to_string();
        assert!(rendered.contains("e1"));
        assert!(rendered.contains("e2"));
    }

    #[test]
    fn test_structural_equality() {
        let build = || {
            Error::new("m")
                .with_type("t")
                .with_context([("k", "v")])
                .with_error([Error::new("inner")])
        };

        let a = build();
        let b = build();
        assert_eq!(a, b);
        assert!(a.is(&Cause::from(b)));

        let c = build().with_type("other");
        assert_ne!(a, c);
    }

    #[test]
    fn test_is_finds_plain_target_in_chain() {
        let sentinel = Cause::msg("sentinel");
        let inner = Error::new("inner").with_error([sentinel.clone()]);
        let outer = Error::new("outer").with_error([inner]);

        assert!(outer.is(&sentinel));
        assert!(!outer.is(&Cause::msg("sentinel")));
    }

    #[test]
    fn test_source_exposes_cause() {
        use core::error::Error as _;

        let err = Error::new("outer").with_error([Cause::msg("inner")]);
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("inner"));
        assert!(Error::new("m").source().is_none());
    }

    #[test]
    fn test_copy_joins_prior_and_extra_causes() {
        let original = Error::new("m")
            .with_type("t")
            .with_error([Cause::msg("prior")]);
        let copy = original.copy([Cause::msg("extra")]);

        assert_eq!(copy.message(), "m");
        assert_eq!(copy.error_type(), "t");
        assert_eq!(copy.to_string(), "[t] m: prior\nextra");
        assert_eq!(original.to_string(), "[t] m: prior");
    }

    #[test]
    fn test_copy_flattens_layers() {
        let mut original = Error::new("first").with_type("A");
        original.push_message("second").set_type("B");

        let copy = original.copy(Vec::<Cause>::new());
        assert_eq!(copy.message(), original.message());
        assert_eq!(copy.error_type(), original.error_type());
        assert_eq!(copy.message_first(1), "second - first");
    }

    #[test]
    fn test_copy_of_untyped_stays_untyped() {
        let copy = Error::new("m").copy(Vec::<Cause>::new());
        assert!(!copy.has_type());
        assert_eq!(copy.to_string(), "m");
    }

    #[test]
    fn test_debug_lists_fields() {
        let rendered = format!("{:?}", Error::new("m").with_type("t"));
        assert!(rendered.starts_with("Error {"));
        assert!(rendered.contains("messages: [\"m\"]"));
        assert!(rendered.contains("types: [\"t\"]"));
    }
}
