use alloc::{sync::Arc, vec::Vec};
use core::fmt;

use crate::Cause;

/// An aggregate of several causes stored in a single cause slot.
///
/// Produced by [`Error::set_error`](crate::Error::set_error) and
/// [`copy`](crate::copy) when more than one cause is supplied. It renders its
/// members one per line.
///
/// Clones share the same members, and two handles are the same error exactly
/// when they share them.
#[derive(Clone)]
pub struct JoinedError {
    errors: Arc<[Cause]>,
}

impl JoinedError {
    /// Joins the given causes.
    pub fn new<I>(causes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Cause>,
    {
        Self {
            errors: causes.into_iter().map(Into::into).collect::<Vec<_>>().into(),
        }
    }

    /// The joined causes, in the order they were supplied.
    pub fn errors(&self) -> &[Cause] {
        &self.errors
    }

    /// Iterates over the joined causes.
    pub fn iter(&self) -> core::slice::Iter<'_, Cause> {
        self.errors.iter()
    }

    /// Number of joined causes.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no causes were joined.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.errors, &other.errors)
    }
}

impl<'a> IntoIterator for &'a JoinedError {
    type Item = &'a Cause;
    type IntoIter = core::slice::Iter<'a, Cause>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for JoinedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            fmt::Display::fmt(error, f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for JoinedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.errors.iter()).finish()
    }
}

/// The source is the first member. The rest are reachable through
/// [`JoinedError::errors`].
impl core::error::Error for JoinedError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        let first: &(dyn core::error::Error + 'static) = self.errors.first()?.as_dyn_error();
        Some(first)
    }
}
