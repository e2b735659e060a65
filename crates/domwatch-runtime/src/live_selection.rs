#![forbid(unsafe_code)]

//! Live, read-only list of the elements matching a selector under a root.
//!
//! # Design
//!
//! A [`LiveSelection`] binds two inputs, a root (`Option<Element>`) and a
//! selector (`String`), each given as a [`Source`]. While its owner is
//! active it keeps one [`MutationObserver`] on the current root and
//! recomputes the snapshot from scratch whenever a batch of records arrives.
//!
//! ```text
//!            root/selector change            mutation batch
//!   Pending ───activate───► Active ◄──────────────┐ │
//!                            │ restart = stop + start
//!                            │                     │ ▼
//!                            │              update(): query root,
//!                            │              publish snapshot
//!                       deactivate
//!                            ▼
//!                       Deactivated (terminal, no binding)
//! ```
//!
//! Binding state is orthogonal to the phase: *Idle* (no observer) or
//! *Observing*. `restart` always passes through Idle.
//!
//! # Invariants
//!
//! 1. At most one observer exists per selection.
//! 2. With no root, the snapshot is empty, in every phase. After
//!    deactivation the root watcher stays only to clear the snapshot when the
//!    root goes away.
//! 3. After a batch is delivered, the snapshot equals the current query
//!    result, in document order.
//! 4. After `disconnect`/`stop`/`deactivate` returns, no mutation changes the
//!    snapshot until observation starts again.
//! 5. Nothing is observed before activation or after deactivation.
//!
//! # Inputs
//!
//! Only reactive cells ([`Source::Cell`]) trigger a restart when they change.
//! A plain selector is captured at construction and never watched; a getter
//! is re-read on every recompute but cannot announce its own changes.
//!
//! # Failure Modes
//!
//! | Failure | Direct call | Notification-driven recompute |
//! |---------|-------------|-------------------------------|
//! | Malformed selector | `Err(LiveSelectionError::Selector)` | logged at `error`, kept in `last_error`, snapshot unchanged |
//! | Observer options select nothing | `Err(LiveSelectionError::Observe)` | n/a |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use domwatch_core::{Element, MutationObserver, ObserveError, ObserverOptions, SelectorError};
use tracing::{debug, debug_span, error, trace, warn};

use crate::lifecycle::{LifecycleHooks, Phase};
use crate::reactive::{Observable, ReadOnly, Source, Subscription};

/// Errors surfaced by [`LiveSelection`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveSelectionError {
    /// The selector could not be parsed by the query engine.
    Selector(SelectorError),
    /// The observer rejected its options.
    Observe(ObserveError),
}

impl fmt::Display for LiveSelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(err) => write!(f, "selector error: {err}"),
            Self::Observe(err) => write!(f, "observe error: {err}"),
        }
    }
}

impl std::error::Error for LiveSelectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Selector(err) => Some(err),
            Self::Observe(err) => Some(err),
        }
    }
}

impl From<SelectorError> for LiveSelectionError {
    fn from(err: SelectorError) -> Self {
        Self::Selector(err)
    }
}

impl From<ObserveError> for LiveSelectionError {
    fn from(err: ObserveError) -> Self {
        Self::Observe(err)
    }
}

/// Configuration for a [`LiveSelection`].
#[derive(Debug, Clone)]
pub struct LiveSelectionConfig {
    /// What the observer watches on the root.
    pub observer_options: ObserverOptions,
    /// Emit a trace event per recompute.
    pub enable_logging: bool,
}

impl Default for LiveSelectionConfig {
    fn default() -> Self {
        Self {
            observer_options: ObserverOptions::structure(),
            enable_logging: true,
        }
    }
}

impl LiveSelectionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_observer_options(mut self, options: ObserverOptions) -> Self {
        self.observer_options = options;
        self
    }

    #[must_use]
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }
}

/// Whether an observer is currently bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Idle,
    Observing,
}

struct State {
    root: Source<Option<Element>>,
    selector: Source<String>,
    config: LiveSelectionConfig,
    phase: Phase,
    observer: Option<MutationObserver>,
    /// Identifies the current binding; bumped on every start.
    generation: u64,
    /// Input subscriptions; live as long as the selection.
    _watchers: Vec<Subscription>,
    last_error: Option<LiveSelectionError>,
    update_count: u64,
}

struct Shared {
    state: RefCell<State>,
    elements: Observable<Vec<Element>>,
}

impl Shared {
    fn update(&self) -> Result<(), LiveSelectionError> {
        let _span = debug_span!("live_selection.update").entered();
        let (root, selector, log) = {
            let state = self.state.borrow();
            (
                state.root.clone(),
                state.selector.clone(),
                state.config.enable_logging,
            )
        };
        let next = match root.get() {
            Some(root) => match root.query_selector_all(&selector.get()) {
                Ok(found) => found,
                Err(err) => {
                    let err = LiveSelectionError::from(err);
                    self.state.borrow_mut().last_error = Some(err.clone());
                    return Err(err);
                }
            },
            None => Vec::new(),
        };
        {
            let mut state = self.state.borrow_mut();
            state.update_count += 1;
            state.last_error = None;
        }
        if log {
            trace!(matched = next.len(), "live selection recomputed");
        }
        self.elements.set(next);
        Ok(())
    }

    fn start(self: &Rc<Self>) -> Result<(), LiveSelectionError> {
        let (root, options) = {
            let state = self.state.borrow();
            if state.observer.is_some() {
                trace!("start ignored; already observing");
                return Ok(());
            }
            if state.phase != Phase::Active {
                trace!(phase = ?state.phase, "start ignored; owner not active");
                return Ok(());
            }
            (state.root.clone(), state.config.observer_options.clone())
        };
        let Some(root) = root.get() else {
            debug!("no root; live selection stays idle");
            self.elements.set(Vec::new());
            return Ok(());
        };

        let generation = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.generation
        };
        let weak: Weak<Self> = Rc::downgrade(self);
        let observer = MutationObserver::new(root.document(), move |batch| {
            if let Some(shared) = weak.upgrade() {
                shared.on_mutations(generation, batch.len());
            }
        });
        observer.observe(&root, options)?;
        self.state.borrow_mut().observer = Some(observer);
        debug!(generation, root = ?root, "live selection observing");

        // Observers never replay existing nodes, so seed the snapshot now.
        self.update()
    }

    fn stop(&self) {
        let observer = self.state.borrow_mut().observer.take();
        if let Some(observer) = observer {
            observer.disconnect();
            debug!("live selection stopped");
        }
    }

    fn restart(self: &Rc<Self>) -> Result<(), LiveSelectionError> {
        self.stop();
        self.start()
    }

    fn on_mutations(&self, generation: u64, records: usize) {
        let current = {
            let state = self.state.borrow();
            state.observer.is_some() && state.generation == generation
        };
        if !current {
            trace!(generation, "batch for a stale binding ignored");
            return;
        }
        trace!(generation, records, "mutation batch received");
        if let Err(err) = self.update() {
            error!(%err, "live selection recompute failed");
        }
    }

    fn on_input_changed(self: &Rc<Self>, input: &'static str) {
        let (phase, root) = {
            let state = self.state.borrow();
            (state.phase, state.root.clone())
        };
        match phase {
            Phase::Active => {}
            Phase::Deactivated if root.get().is_none() => {
                trace!(input, "root gone after deactivation; clearing snapshot");
                self.elements.set(Vec::new());
                return;
            }
            Phase::Pending | Phase::Deactivated => {
                trace!(input, ?phase, "input changed outside the active phase");
                return;
            }
        }
        debug!(input, "input changed; restarting observation");
        if let Err(err) = self.restart() {
            error!(%err, input, "live selection restart failed");
        }
    }
}

/// A reactive, read-only list of the elements under a root that match a
/// selector.
///
/// Clones are handles to the same selection.
///
/// # Example
///
/// ```
/// use domwatch_core::Document;
/// use domwatch_runtime::LiveSelection;
/// use domwatch_runtime::reactive::Observable;
///
/// let doc = Document::new();
/// let list = doc.create_element("ul").unwrap();
/// let root = Observable::new(Some(list.clone()));
///
/// let items = LiveSelection::new(&root, "li");
/// items.activate().unwrap();
/// assert!(items.is_empty());
///
/// list.append_child(doc.create_element("li").unwrap()).unwrap();
/// doc.flush();
/// assert_eq!(items.len(), 1);
///
/// root.set(None);
/// assert!(items.is_empty());
/// ```
#[derive(Clone)]
pub struct LiveSelection {
    shared: Rc<Shared>,
}

impl fmt::Debug for LiveSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("LiveSelection")
            .field("phase", &state.phase)
            .field("observing", &state.observer.is_some())
            .field("generation", &state.generation)
            .field("matched", &self.shared.elements.with(Vec::len))
            .finish()
    }
}

impl LiveSelection {
    /// Create a selection with the default configuration.
    ///
    /// Nothing is observed until [`activate`](Self::activate).
    pub fn new(
        root: impl Into<Source<Option<Element>>>,
        selector: impl Into<Source<String>>,
    ) -> Self {
        Self::with_config(root, selector, LiveSelectionConfig::default())
    }

    /// Create a selection with an explicit configuration.
    pub fn with_config(
        root: impl Into<Source<Option<Element>>>,
        selector: impl Into<Source<String>>,
        config: LiveSelectionConfig,
    ) -> Self {
        let root = root.into();
        let selector = selector.into();
        let shared = Rc::new(Shared {
            state: RefCell::new(State {
                root: root.clone(),
                selector: selector.clone(),
                config,
                phase: Phase::Pending,
                observer: None,
                generation: 0,
                _watchers: Vec::new(),
                last_error: None,
                update_count: 0,
            }),
            elements: Observable::new(Vec::new()),
        });

        let mut watchers = Vec::new();
        let weak = Rc::downgrade(&shared);
        if let Some(sub) = selector.watch(move |_| {
            if let Some(shared) = weak.upgrade() {
                shared.on_input_changed("selector");
            }
        }) {
            watchers.push(sub);
        }
        let weak = Rc::downgrade(&shared);
        if let Some(sub) = root.watch(move |_| {
            if let Some(shared) = weak.upgrade() {
                shared.on_input_changed("root");
            }
        }) {
            watchers.push(sub);
        }
        shared.state.borrow_mut()._watchers = watchers;

        Self { shared }
    }

    /// Create a selection whose activation follows `owner`.
    pub fn in_scope(
        owner: &dyn LifecycleHooks,
        root: impl Into<Source<Option<Element>>>,
        selector: impl Into<Source<String>>,
    ) -> Self {
        let selection = Self::new(root, selector);
        selection.attach(owner);
        selection
    }

    /// Register one activation and one deactivation hook on `owner`.
    ///
    /// The hooks hold the selection weakly.
    pub fn attach(&self, owner: &dyn LifecycleHooks) {
        let weak = Rc::downgrade(&self.shared);
        owner.on_activate(Box::new(move || {
            if let Some(shared) = weak.upgrade()
                && let Err(err) = (LiveSelection { shared }).activate()
            {
                error!(%err, "live selection activation failed");
            }
        }));
        let weak = Rc::downgrade(&self.shared);
        owner.on_deactivate(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                LiveSelection { shared }.deactivate();
            }
        }));
    }

    /// Enter the active phase and start observing the current root.
    ///
    /// A no-op when already active; ignored (with a warning) after
    /// deactivation.
    pub fn activate(&self) -> Result<(), LiveSelectionError> {
        let phase = self.shared.state.borrow().phase;
        match phase {
            Phase::Pending => {
                self.shared.state.borrow_mut().phase = Phase::Active;
                debug!("live selection activated");
                self.shared.start()
            }
            Phase::Active => Ok(()),
            Phase::Deactivated => {
                warn!("activate called on a deactivated live selection; ignored");
                Ok(())
            }
        }
    }

    /// Stop observing for good.
    ///
    /// Runs even if [`disconnect`](Self::disconnect) was already called. The
    /// snapshot keeps its last value until the root becomes absent; input
    /// changes never restart observation.
    pub fn deactivate(&self) {
        self.shared.stop();
        let mut state = self.shared.state.borrow_mut();
        if state.phase != Phase::Deactivated {
            debug!("live selection deactivated");
        }
        state.phase = Phase::Deactivated;
    }

    /// Stop the current observer. Idempotent.
    ///
    /// Input watchers stay registered: a later root or reactive selector
    /// change while active starts observing again.
    pub fn disconnect(&self) {
        self.shared.stop();
    }

    /// Recompute the snapshot from the current root and selector.
    pub fn update(&self) -> Result<(), LiveSelectionError> {
        self.shared.update()
    }

    /// Bind an observer to the current root and recompute.
    ///
    /// Does nothing unless active, or when already observing.
    pub fn start(&self) -> Result<(), LiveSelectionError> {
        self.shared.start()
    }

    /// Same as [`disconnect`](Self::disconnect).
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Tear down the observer and bind a new one to the current root.
    pub fn restart(&self) -> Result<(), LiveSelectionError> {
        self.shared.restart()
    }

    /// Read-only reactive view of the snapshot.
    #[must_use]
    pub fn elements(&self) -> ReadOnly<Vec<Element>> {
        self.shared.elements.read_only()
    }

    /// Clone of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Element> {
        self.shared.elements.get()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.elements.with(Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn state(&self) -> BindingState {
        if self.is_observing() {
            BindingState::Observing
        } else {
            BindingState::Idle
        }
    }

    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.shared.state.borrow().observer.is_some()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.shared.state.borrow().phase
    }

    /// The most recent recompute failure, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<LiveSelectionError> {
        self.shared.state.borrow().last_error.clone()
    }

    /// Current value of the root input.
    #[must_use]
    pub fn root(&self) -> Option<Element> {
        let root = self.shared.state.borrow().root.clone();
        root.get()
    }

    /// Current value of the selector input.
    #[must_use]
    pub fn selector(&self) -> String {
        let selector = self.shared.state.borrow().selector.clone();
        selector.get()
    }

    /// Number of successful recomputes so far.
    #[must_use]
    pub fn update_count(&self) -> u64 {
        self.shared.state.borrow().update_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Scope;
    use domwatch_core::Document;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    struct Fixture {
        doc: Document,
        root: Element,
        px: Element,
    }

    /// `<div>` with `<p class="x">` and `<p>`, attached to the document.
    fn fixture() -> Fixture {
        let doc = Document::new();
        let root = doc.create_element("div").unwrap();
        doc.document_element().append_child(&root).unwrap();
        let px = doc.create_element("p").unwrap();
        px.set_attribute("class", "x").unwrap();
        root.append_child(&px).unwrap();
        root.append_child(doc.create_element("p").unwrap()).unwrap();
        Fixture { doc, root, px }
    }

    #[test]
    fn construction_is_lazy() {
        let f = fixture();
        let sel = LiveSelection::new(&f.root, "p.x");
        assert_eq!(sel.phase(), Phase::Pending);
        assert_eq!(sel.state(), BindingState::Idle);
        assert!(sel.is_empty());
        assert_eq!(sel.update_count(), 0);
    }

    #[test]
    fn activation_seeds_snapshot() {
        let f = fixture();
        let sel = LiveSelection::new(&f.root, "p.x");
        sel.activate().unwrap();
        assert_eq!(sel.snapshot(), vec![f.px.clone()]);
        assert_eq!(sel.state(), BindingState::Observing);
        assert_eq!(sel.update_count(), 1);
    }

    #[test]
    fn appended_match_shows_up_after_flush() {
        let f = fixture();
        let sel = LiveSelection::new(&f.root, "p.x");
        sel.activate().unwrap();

        let extra = f.doc.create_element("p").unwrap();
        extra.set_attribute("class", "x").unwrap();
        f.root.append_child(&extra).unwrap();
        assert_eq!(sel.len(), 1);

        f.doc.flush();
        assert_eq!(sel.snapshot(), vec![f.px.clone(), extra]);
    }

    #[test]
    fn attribute_change_updates_membership() {
        let f = fixture();
        let sel = LiveSelection::new(&f.root, "p.x");
        sel.activate().unwrap();
        f.px.remove_attribute("class");
        f.doc.flush();
        assert!(sel.is_empty());
    }

    #[test]
    fn burst_is_one_recompute() {
        let f = fixture();
        let sel = LiveSelection::new(&f.root, "p");
        sel.activate().unwrap();
        for _ in 0..5 {
            f.root.append_child(f.doc.create_element("p").unwrap()).unwrap();
        }
        f.doc.flush();
        assert_eq!(sel.len(), 7);
        assert_eq!(sel.update_count(), 2);
    }

    #[test]
    fn disconnect_is_idempotent_and_freezes_snapshot() {
        let f = fixture();
        let sel = LiveSelection::new(&f.root, "p");
        sel.activate().unwrap();
        sel.disconnect();
        sel.disconnect();
        assert_eq!(sel.state(), BindingState::Idle);

        f.root.append_child(f.doc.create_element("p").unwrap()).unwrap();
        f.doc.flush();
        assert_eq!(sel.len(), 2);
    }

    #[test]
    fn absent_root_gives_empty_snapshot() {
        let root = Observable::new(None::<Element>);
        let sel = LiveSelection::new(&root, "p");
        sel.activate().unwrap();
        assert!(sel.is_empty());
        assert_eq!(sel.state(), BindingState::Idle);
    }

    #[test]
    fn root_becoming_absent_clears_immediately() {
        let f = fixture();
        let root = Observable::new(Some(f.root.clone()));
        let sel = LiveSelection::new(&root, "p");
        sel.activate().unwrap();
        assert_eq!(sel.len(), 2);

        root.set(None);
        assert!(sel.is_empty());
        assert_eq!(sel.state(), BindingState::Idle);
    }

    #[test]
    fn root_swap_moves_observation() {
        let f = fixture();
        let other = f.doc.create_element("section").unwrap();
        other.append_child(f.doc.create_element("p").unwrap()).unwrap();
        let root = Observable::new(Some(f.root.clone()));
        let sel = LiveSelection::new(&root, "p");
        sel.activate().unwrap();

        root.set(Some(other.clone()));
        assert_eq!(sel.len(), 1);

        f.root.append_child(f.doc.create_element("p").unwrap()).unwrap();
        f.doc.flush();
        assert_eq!(sel.len(), 1);

        other.append_child(f.doc.create_element("p").unwrap()).unwrap();
        f.doc.flush();
        assert_eq!(sel.len(), 2);
    }

    #[test]
    fn reactive_selector_restarts() {
        let f = fixture();
        let span = f.doc.create_element("span").unwrap();
        f.root.append_child(&span).unwrap();
        let selector = Observable::new("span".to_string());
        let sel = LiveSelection::new(&f.root, &selector);
        sel.activate().unwrap();
        assert_eq!(sel.snapshot(), vec![span]);

        selector.set("p.x".to_string());
        assert_eq!(sel.snapshot(), vec![f.px.clone()]);
    }

    #[test]
    fn selector_switch_from_p_to_span() {
        let doc = Document::new();
        let root = doc.create_element("div").unwrap();
        let p = doc.create_element("p").unwrap();
        let span = doc.create_element("span").unwrap();
        root.append_child(&p).unwrap();
        root.append_child(&span).unwrap();
        let selector = Observable::new("p".to_string());
        let sel = LiveSelection::new(&root, &selector);
        sel.activate().unwrap();
        assert_eq!(sel.snapshot(), vec![p]);

        selector.set("span".to_string());
        assert_eq!(sel.snapshot(), vec![span]);
        assert_eq!(sel.state(), BindingState::Observing);
    }

    #[test]
    fn plain_selector_is_captured_once() {
        let f = fixture();
        let sel = LiveSelection::new(&f.root, String::from("p.x"));
        sel.activate().unwrap();
        assert_eq!(sel.selector(), "p.x");
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn getter_selector_is_reread_on_recompute() {
        let f = fixture();
        let wanted = Rc::new(RefCell::new("p.x".to_string()));
        let wanted_in = Rc::clone(&wanted);
        let sel = LiveSelection::new(&f.root, Source::getter(move || wanted_in.borrow().clone()));
        sel.activate().unwrap();
        assert_eq!(sel.len(), 1);

        *wanted.borrow_mut() = "p".to_string();
        assert_eq!(sel.len(), 1);
        sel.update().unwrap();
        assert_eq!(sel.len(), 2);
    }

    #[test]
    fn input_changes_before_activation_do_not_observe() {
        let f = fixture();
        let root = Observable::new(None::<Element>);
        let sel = LiveSelection::new(&root, "p");
        root.set(Some(f.root.clone()));
        assert_eq!(sel.state(), BindingState::Idle);
        assert!(sel.is_empty());

        sel.activate().unwrap();
        assert_eq!(sel.len(), 2);
    }

    #[test]
    fn deactivation_is_terminal() {
        let f = fixture();
        let root = Observable::new(Some(f.root.clone()));
        let sel = LiveSelection::new(&root, "p");
        sel.activate().unwrap();
        sel.deactivate();
        assert_eq!(sel.phase(), Phase::Deactivated);
        assert_eq!(sel.state(), BindingState::Idle);
        assert_eq!(sel.len(), 2);

        let other = f.doc.create_element("div").unwrap();
        root.set(Some(other.clone()));
        assert_eq!(sel.state(), BindingState::Idle);
        assert_eq!(sel.len(), 2);

        sel.activate().unwrap();
        sel.start().unwrap();
        assert_eq!(sel.state(), BindingState::Idle);
        other.append_child(f.doc.create_element("p").unwrap()).unwrap();
        assert_eq!(f.doc.flush(), 0);
    }

    #[test]
    fn absent_root_after_deactivation_empties_snapshot() {
        let f = fixture();
        let root = Observable::new(Some(f.root.clone()));
        let sel = LiveSelection::new(&root, "p");
        sel.activate().unwrap();
        sel.deactivate();
        assert_eq!(sel.len(), 2);

        root.set(None);
        assert!(sel.is_empty());
        assert_eq!(sel.state(), BindingState::Idle);
    }

    #[test]
    fn start_before_activation_does_not_bind() {
        let f = fixture();
        let root = Observable::new(Some(f.root.clone()));
        let sel = LiveSelection::new(&root, "p");
        sel.start().unwrap();
        assert_eq!(sel.state(), BindingState::Idle);
        assert!(sel.is_empty());
    }

    #[test]
    fn early_start_then_root_swap_binds_new_root_on_activation() {
        let f = fixture();
        let other = f.doc.create_element("section").unwrap();
        f.root.append_child(&other).unwrap();
        other.append_child(f.doc.create_element("p").unwrap()).unwrap();
        let fresh = f.doc.create_element("div").unwrap();
        fresh.append_child(f.doc.create_element("p").unwrap()).unwrap();
        fresh.append_child(f.doc.create_element("p").unwrap()).unwrap();

        let root = Observable::new(Some(other.clone()));
        let sel = LiveSelection::new(&root, "p");
        sel.start().unwrap();
        root.set(Some(fresh.clone()));
        sel.activate().unwrap();
        assert_eq!(sel.len(), 2);

        other.append_child(f.doc.create_element("p").unwrap()).unwrap();
        f.doc.flush();
        assert_eq!(sel.len(), 2);

        fresh.append_child(f.doc.create_element("p").unwrap()).unwrap();
        f.doc.flush();
        assert_eq!(sel.len(), 3);
    }

    #[test]
    fn move_between_observed_parents_is_tracked() {
        let doc = Document::new();
        let root = doc.create_element("div").unwrap();
        let p = doc.create_element("p").unwrap();
        let section = doc.create_element("section").unwrap();
        root.append_child(&p).unwrap();
        root.append_child(&section).unwrap();
        let sel = LiveSelection::new(&root, "section > p");
        sel.activate().unwrap();
        assert!(sel.is_empty());

        section.append_child(&p).unwrap();
        doc.flush();
        assert_eq!(sel.snapshot(), vec![p]);
    }

    #[test]
    fn disconnect_then_root_change_resumes() {
        let f = fixture();
        let root = Observable::new(Some(f.root.clone()));
        let sel = LiveSelection::new(&root, "p");
        sel.activate().unwrap();
        sel.disconnect();

        let other = f.doc.create_element("div").unwrap();
        root.set(Some(other));
        assert_eq!(sel.state(), BindingState::Observing);
        assert!(sel.is_empty());
    }

    #[test]
    fn malformed_selector_errors_on_direct_call() {
        let f = fixture();
        let sel = LiveSelection::new(&f.root, "p:first-child");
        let err = sel.activate().unwrap_err();
        assert!(matches!(err, LiveSelectionError::Selector(_)));
        assert_eq!(sel.last_error(), Some(err));
        assert_eq!(sel.state(), BindingState::Observing);
    }

    #[test]
    fn malformed_reactive_selector_is_recorded_not_raised() {
        let f = fixture();
        let selector = Observable::new("p".to_string());
        let sel = LiveSelection::new(&f.root, &selector);
        sel.activate().unwrap();
        selector.set("p[".to_string());
        assert!(sel.last_error().is_some());
        assert_eq!(sel.len(), 2);

        selector.set("p.x".to_string());
        assert_eq!(sel.last_error(), None);
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn empty_observer_options_are_rejected() {
        let f = fixture();
        let config = LiveSelectionConfig::new().with_observer_options(ObserverOptions::new());
        let sel = LiveSelection::with_config(&f.root, "p", config);
        assert_eq!(
            sel.activate(),
            Err(LiveSelectionError::Observe(ObserveError::NoMutationTypes))
        );
        assert_eq!(sel.state(), BindingState::Idle);
    }

    #[test]
    fn child_list_only_config_ignores_attributes() {
        let f = fixture();
        let config = LiveSelectionConfig::new()
            .with_observer_options(ObserverOptions::new().child_list().subtree())
            .with_logging(false);
        let sel = LiveSelection::with_config(&f.root, "p.x", config);
        sel.activate().unwrap();
        f.px.remove_attribute("class");
        f.doc.flush();
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn scope_drives_lifecycle() {
        let f = fixture();
        let scope = Scope::new();
        let sel = LiveSelection::in_scope(&scope, &f.root, "p");
        assert_eq!(sel.state(), BindingState::Idle);

        scope.activate();
        assert_eq!(sel.phase(), Phase::Active);
        assert_eq!(sel.len(), 2);

        scope.deactivate();
        assert_eq!(sel.phase(), Phase::Deactivated);
        f.root.append_child(f.doc.create_element("p").unwrap()).unwrap();
        f.doc.flush();
        assert_eq!(sel.len(), 2);
    }

    #[test]
    fn scope_deactivation_after_manual_disconnect() {
        let f = fixture();
        let scope = Scope::new();
        let sel = LiveSelection::in_scope(&scope, &f.root, "p");
        scope.activate();
        sel.disconnect();
        scope.deactivate();
        assert_eq!(sel.phase(), Phase::Deactivated);
    }

    #[test]
    fn dropped_selection_releases_hooks_and_observer() {
        let f = fixture();
        let scope = Scope::new();
        let sel = LiveSelection::in_scope(&scope, &f.root, "p");
        scope.activate();
        drop(sel);
        f.root.append_child(f.doc.create_element("p").unwrap()).unwrap();
        assert_eq!(f.doc.flush(), 0);
        assert_eq!(scope.deactivate(), 1);
    }

    #[test]
    fn consumers_are_notified_of_changes_only() {
        let f = fixture();
        let sel = LiveSelection::new(&f.root, "p");
        let hits = Rc::new(Cell::new(0));
        let hits_in = Rc::clone(&hits);
        let _sub = sel.elements().subscribe(move |_| hits_in.set(hits_in.get() + 1));
        sel.activate().unwrap();
        assert_eq!(hits.get(), 1);

        f.root.set_attribute("data-unrelated", "1").unwrap();
        f.doc.flush();
        assert_eq!(hits.get(), 1);
        assert_eq!(sel.update_count(), 2);
    }

    #[test]
    fn stale_generation_is_ignored() {
        let f = fixture();
        let sel = LiveSelection::new(&f.root, "p");
        sel.activate().unwrap();
        let generation = sel.shared.state.borrow().generation;
        sel.restart().unwrap();
        let before = sel.update_count();
        sel.shared.on_mutations(generation, 1);
        assert_eq!(sel.update_count(), before);
    }
}
