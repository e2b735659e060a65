#![forbid(unsafe_code)]

//! Owner lifecycle: activation and deactivation hooks.
//!
//! Resources that must not outlive their owner (observers, subscriptions)
//! register one hook for each edge of the owner's active lifetime. The owner
//! is any type implementing [`LifecycleHooks`]; [`Scope`] is the bundled
//! implementation.
//!
//! # Integration contract
//!
//! A host framework embedding a [`Scope`] must call [`Scope::activate`] when
//! the owner enters its mounted/visible phase and [`Scope::deactivate`]
//! before it is torn down. Nothing here can detect a host that forgets.
//!
//! # Invariants
//!
//! 1. Each hook runs at most once.
//! 2. Hooks run in registration order.
//! 3. Phases only move forward: `Pending → Active → Deactivated`
//!    (`Pending → Deactivated` is allowed for owners that never mounted).
//! 4. Activation hooks registered while active run immediately; those
//!    registered after deactivation never run. Deactivation hooks registered
//!    after deactivation run immediately.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

/// A one-shot lifecycle callback.
pub type Hook = Box<dyn FnOnce()>;

/// Position in an owner's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Constructed, not yet active.
    #[default]
    Pending,
    /// Mounted and live.
    Active,
    /// Torn down. Terminal.
    Deactivated,
}

/// Registration surface an owner exposes to its resources.
pub trait LifecycleHooks {
    /// Run `hook` when the owner becomes active.
    fn on_activate(&self, hook: Hook);

    /// Run `hook` when the owner is deactivated.
    fn on_deactivate(&self, hook: Hook);
}

#[derive(Default)]
struct ScopeInner {
    phase: Phase,
    on_activate: Vec<Hook>,
    on_deactivate: Vec<Hook>,
}

/// A component scope that owns lifecycle hooks.
///
/// Clones share the same scope.
#[derive(Clone, Default)]
pub struct Scope {
    inner: Rc<RefCell<ScopeInner>>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scope")
            .field("phase", &inner.phase)
            .field("on_activate", &inner.on_activate.len())
            .field("on_deactivate", &inner.on_deactivate.len())
            .finish()
    }
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.borrow().phase
    }

    /// Enter the active phase, running activation hooks.
    ///
    /// Returns how many hooks ran; zero if the scope was not pending.
    pub fn activate(&self) -> usize {
        let hooks = {
            let mut inner = self.inner.borrow_mut();
            if inner.phase != Phase::Pending {
                return 0;
            }
            inner.phase = Phase::Active;
            std::mem::take(&mut inner.on_activate)
        };
        debug!(hooks = hooks.len(), "scope activated");
        run(hooks)
    }

    /// Enter the deactivated phase, running deactivation hooks.
    ///
    /// Pending activation hooks are discarded. Returns how many hooks ran;
    /// zero if already deactivated.
    pub fn deactivate(&self) -> usize {
        let hooks = {
            let mut inner = self.inner.borrow_mut();
            if inner.phase == Phase::Deactivated {
                return 0;
            }
            inner.phase = Phase::Deactivated;
            inner.on_activate.clear();
            std::mem::take(&mut inner.on_deactivate)
        };
        debug!(hooks = hooks.len(), "scope deactivated");
        run(hooks)
    }
}

fn run(hooks: Vec<Hook>) -> usize {
    let count = hooks.len();
    for hook in hooks {
        hook();
    }
    count
}

impl LifecycleHooks for Scope {
    fn on_activate(&self, hook: Hook) {
        let phase = self.phase();
        match phase {
            Phase::Pending => self.inner.borrow_mut().on_activate.push(hook),
            Phase::Active => hook(),
            Phase::Deactivated => trace!("activation hook registered after deactivation; dropped"),
        }
    }

    fn on_deactivate(&self, hook: Hook) {
        let phase = self.phase();
        match phase {
            Phase::Pending | Phase::Active => self.inner.borrow_mut().on_deactivate.push(hook),
            Phase::Deactivated => hook(),
        }
    }
}
