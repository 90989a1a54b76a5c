//! Structured context attached to an [`Error`](crate::Error).
//!
//! Context is a map from string keys to [`ContextValue`]s. Values are either
//! text, a sequence of lines, or any shared object that can be displayed. The
//! key [`TRACE_KEY`] is reserved for stack traces and is rendered as indented
//! lines instead of a `key=value;` pair.
//!
//! ```
//! use errorx::{ContextValue, Error};
//!
//! #[derive(Debug)]
//! struct Tenant(u32);
//!
//! impl std::fmt::Display for Tenant {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "tenant-{}", self.0)
//!     }
//! }
//!
//! let mut err = Error::new("quota exceeded");
//! err.add_context("tenant", ContextValue::object(Tenant(7)));
//!
//! let tenant = err.context()["tenant"].downcast_ref::<Tenant>().unwrap();
//! assert_eq!(tenant.0, 7);
//! assert_eq!(err.to_string(), "quota exceeded. Context: tenant=tenant-7;");
//! ```

use alloc::{
    borrow::Cow,
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};
use core::{any::Any, fmt};

/// Context key reserved for stack traces.
///
/// Writing an empty line sequence under this key is ignored.
pub const TRACE_KEY: &str = "trace";

/// The context map of an [`Error`](crate::Error).
pub type Context = hashbrown::HashMap<String, ContextValue, rustc_hash::FxBuildHasher>;

/// Any value that can be stored as context.
///
/// Implemented for every `Display + Debug + Send + Sync + 'static` type.
pub trait ContextObject: fmt::Display + fmt::Debug + Any + Send + Sync {
    /// Returns `self` as [`Any`] so the concrete type can be recovered.
    fn as_any(&self) -> &dyn Any;
}

impl<T> ContextObject for T
where
    T: fmt::Display + fmt::Debug + Any + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A single context value.
#[derive(Clone, Debug)]
pub enum ContextValue {
    /// A piece of text.
    Text(String),
    /// A sequence of lines, such as a stack trace.
    Lines(Vec<String>),
    /// Any displayable object.
    Value(Arc<dyn ContextObject>),
}

impl ContextValue {
    /// Wraps an arbitrary displayable object.
    pub fn object<T: ContextObject>(value: T) -> Self {
        Self::Value(Arc::new(value))
    }

    /// Returns the text if this is a [`ContextValue::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the lines if this is a [`ContextValue::Lines`].
    pub fn as_lines(&self) -> Option<&[String]> {
        match self {
            Self::Lines(lines) => Some(lines),
            _ => None,
        }
    }

    /// Returns the stored object if it is of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Value(value) => {
                let object: &dyn ContextObject = &**value;
                object.as_any().downcast_ref()
            }
            _ => None,
        }
    }

    /// Whether this value holds no information worth storing under
    /// [`TRACE_KEY`].
    pub(crate) fn is_empty_lines(&self) -> bool {
        matches!(self, Self::Lines(lines) if lines.is_empty())
    }

    /// Writes the value the way it appears under [`TRACE_KEY`].
    pub(crate) fn fmt_trace(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lines(lines) => {
                for line in lines {
                    write!(f, "\n\t{line}")?;
                }
                Ok(())
            }
            other => write!(f, "\n\t{other}"),
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Lines(lines) => {
                f.write_str("[")?;
                for (index, line) in lines.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(line)?;
                }
                f.write_str("]")
            }
            Self::Value(value) => fmt::Display::fmt(value, f),
        }
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<&String> for ContextValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<Cow<'_, str>> for ContextValue {
    fn from(value: Cow<'_, str>) -> Self {
        Self::Text(value.into_owned())
    }
}

impl From<Vec<String>> for ContextValue {
    fn from(value: Vec<String>) -> Self {
        Self::Lines(value)
    }
}

impl From<Vec<&str>> for ContextValue {
    fn from(value: Vec<&str>) -> Self {
        Self::Lines(value.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for ContextValue {
    fn from(value: &[&str]) -> Self {
        Self::Lines(value.iter().copied().map(String::from).collect())
    }
}

impl<T: ContextObject> From<Arc<T>> for ContextValue {
    fn from(value: Arc<T>) -> Self {
        Self::Value(value)
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ContextValue {
                fn from(value: $ty) -> Self {
                    Self::object(value)
                }
            }
        )*
    };
}

impl_from_scalar!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);
