#![forbid(unsafe_code)]

//! Shared reactive cell with change notification and version tracking.
//!
//! # Design
//!
//! [`Observable<T>`] keeps its value and subscriber list in
//! `Rc<RefCell<..>>`. A write that changes the value (by `PartialEq`) bumps
//! the version and calls every live subscriber, oldest first. Subscribers are
//! held weakly; the strong half lives in the [`Subscription`] guard returned
//! to the caller.
//!
//! # Failure Modes
//!
//! - **Borrow during write**: a subscriber may read the cell or write to it
//!   again (the borrow is released before callbacks run). Reading through
//!   [`Observable::with`] while a write is in progress on the same cell from
//!   inside the closure panics.
//! - **Forgotten guard**: a `Subscription` kept forever keeps its callback
//!   alive forever. Dead entries are only pruned during notification.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::ReadOnly;

type Listener<T> = Rc<dyn Fn(&T)>;

struct Slot<T> {
    value: T,
    version: u64,
    listeners: Vec<Weak<dyn Fn(&T)>>,
}

/// A shared, version-tracked value with change notification.
///
/// Clones are handles to the same cell.
///
/// # Invariants
///
/// 1. `version` grows by exactly 1 on each write that changes the value.
/// 2. Writing an equal value does nothing.
/// 3. Listeners run in subscription order.
pub struct Observable<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.borrow();
        f.debug_struct("Observable")
            .field("value", &slot.value)
            .field("version", &slot.version)
            .field("listeners", &slot.listeners.len())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a cell at version 0 with no listeners.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot {
                value,
                version: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.slot.borrow().value.clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.slot.borrow().value)
    }

    /// Replace the value, notifying listeners if it changed.
    pub fn set(&self, value: T) {
        {
            let mut slot = self.slot.borrow_mut();
            if slot.value == value {
                return;
            }
            slot.value = value;
            slot.version += 1;
        }
        self.notify();
    }

    /// Edit the value in place, notifying listeners if it changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let changed = {
            let mut slot = self.slot.borrow_mut();
            let before = slot.value.clone();
            f(&mut slot.value);
            let changed = slot.value != before;
            if changed {
                slot.version += 1;
            }
            changed
        };
        if changed {
            self.notify();
        }
    }

    /// Call `listener` with the new value after every change.
    ///
    /// Dropping the returned guard unsubscribes.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let strong: Listener<T> = Rc::new(listener);
        self.slot.borrow_mut().listeners.push(Rc::downgrade(&strong));
        Subscription {
            _keep_alive: Box::new(strong),
        }
    }

    /// Accessor-only view of this cell.
    #[must_use]
    pub fn read_only(&self) -> ReadOnly<T> {
        ReadOnly::new(self.clone())
    }

    /// Number of value-changing writes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.slot.borrow().version
    }

    /// Registered listeners, including dropped ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.slot.borrow().listeners.len()
    }

    fn notify(&self) {
        let (listeners, value) = {
            let mut slot = self.slot.borrow_mut();
            slot.listeners.retain(|w| w.strong_count() > 0);
            let live: Vec<Listener<T>> = slot.listeners.iter().filter_map(Weak::upgrade).collect();
            (live, slot.value.clone())
        };
        for listener in &listeners {
            listener(&value);
        }
    }
}

/// Guard that keeps a listener registered.
///
/// Holds the only strong reference to the listener; once dropped the weak
/// entry in the cell stops upgrading and is pruned on the next write.
pub struct Subscription {
    _keep_alive: Box<dyn std::any::Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
