//! Read-only snapshots for copy-on-write index layers.

use core::fmt;
use core::ops::Deref;

/// An immutable copy of a table.
///
/// Only `Deref` is implemented, so every `&self` query of the wrapped table
/// is available and every `&mut self` mutation is rejected at compile time.
/// The copy is independent of the table it was taken from; the writer can
/// keep mutating the original.
pub struct ReadOnly<S>(S);

impl<S> ReadOnly<S> {
    pub(crate) fn new(inner: S) -> Self {
        ReadOnly(inner)
    }

    /// Gives the copy back as a writable table.
    pub fn into_inner(self) -> S {
        self.0
    }
}

impl<S> Deref for ReadOnly<S> {
    type Target = S;

    #[inline]
    fn deref(&self) -> &S {
        &self.0
    }
}

impl<S: Clone> Clone for ReadOnly<S> {
    fn clone(&self) -> Self {
        ReadOnly(self.0.clone())
    }
}

impl<S: fmt::Debug> fmt::Debug for ReadOnly<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnly").field(&self.0).finish()
    }
}
