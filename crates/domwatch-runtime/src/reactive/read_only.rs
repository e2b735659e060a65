#![forbid(unsafe_code)]

//! Accessor-only view over an [`Observable`].

use std::fmt;

use super::observable::{Observable, Subscription};

/// A read-only handle to a reactive cell.
///
/// Exposes reads and subscriptions; the writable [`Observable`] stays with
/// whoever created the view. Clones share the same cell.
pub struct ReadOnly<T> {
    cell: Observable<T>,
}

impl<T> Clone for ReadOnly<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnly<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnly").field(&self.cell).finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReadOnly<T> {
    pub(crate) fn new(cell: Observable<T>) -> Self {
        Self { cell }
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.cell.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.with(f)
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        self.cell.subscribe(listener)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.version()
    }
}
