#![forbid(unsafe_code)]

//! Inputs that may be fixed values, reactive cells, or getters.
//!
//! A [`Source`] is resolved through one accessor, [`Source::get`], so callers
//! never branch on the variant. Only [`Source::Cell`] can announce changes:
//! [`Source::watch`] returns `None` for the other two.

use std::fmt;
use std::rc::Rc;

use domwatch_core::Element;

use super::observable::{Observable, Subscription};

/// A value read at the point of use.
pub enum Source<T> {
    /// Captured once; never changes.
    Plain(T),
    /// A reactive cell; changes can be watched.
    Cell(Observable<T>),
    /// Re-evaluated on every read; changes cannot be watched.
    Getter(Rc<dyn Fn() -> T>),
}

impl<T: Clone> Clone for Source<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Plain(v) => Self::Plain(v.clone()),
            Self::Cell(cell) => Self::Cell(cell.clone()),
            Self::Getter(f) => Self::Getter(Rc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(v) => f.debug_tuple("Plain").field(v).finish(),
            Self::Cell(cell) => f.debug_tuple("Cell").field(cell).finish(),
            Self::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Source<T> {
    #[must_use]
    pub fn plain(value: T) -> Self {
        Self::Plain(value)
    }

    #[must_use]
    pub fn getter(f: impl Fn() -> T + 'static) -> Self {
        Self::Getter(Rc::new(f))
    }

    /// Current value, whatever the variant.
    #[must_use]
    pub fn get(&self) -> T {
        match self {
            Self::Plain(v) => v.clone(),
            Self::Cell(cell) => cell.get(),
            Self::Getter(f) => f(),
        }
    }

    /// Whether changes to this source can be observed.
    #[must_use]
    pub fn is_reactive(&self) -> bool {
        matches!(self, Self::Cell(_))
    }

    /// Subscribe to changes if the source is reactive.
    pub fn watch(&self, listener: impl Fn(&T) + 'static) -> Option<Subscription> {
        match self {
            Self::Cell(cell) => Some(cell.subscribe(listener)),
            Self::Plain(_) | Self::Getter(_) => None,
        }
    }
}

impl<T: Clone + PartialEq + 'static> From<Observable<T>> for Source<T> {
    fn from(cell: Observable<T>) -> Self {
        Self::Cell(cell)
    }
}

impl<T: Clone + PartialEq + 'static> From<&Observable<T>> for Source<T> {
    fn from(cell: &Observable<T>) -> Self {
        Self::Cell(cell.clone())
    }
}

impl From<&str> for Source<String> {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_string())
    }
}

impl From<String> for Source<String> {
    fn from(value: String) -> Self {
        Self::Plain(value)
    }
}

impl From<Element> for Source<Option<Element>> {
    fn from(element: Element) -> Self {
        Self::Plain(Some(element))
    }
}

impl From<&Element> for Source<Option<Element>> {
    fn from(element: &Element) -> Self {
        Self::Plain(Some(element.clone()))
    }
}

impl From<Option<Element>> for Source<Option<Element>> {
    fn from(element: Option<Element>) -> Self {
        Self::Plain(element)
    }
}
