#![forbid(unsafe_code)]

//! Batched mutation observation.
//!
//! # Design
//!
//! A [`MutationObserver`] registers interest in one or more nodes of a
//! [`Document`]. Every tree change builds one [`MutationRecord`]; the document
//! offers it to each live observer, which queues a copy when any of its
//! registrations is interested (the target itself, or an inclusive ancestor
//! registered with `subtree`).
//!
//! Nothing is delivered synchronously. [`Document::flush`] is the checkpoint:
//! it hands each observer its queued batch, repeating until no observer has
//! records left, so mutations made by callbacks are delivered in the same
//! checkpoint.
//!
//! ```text
//!   set_attribute ─┐
//!   append_child ──┼─► queue(record) ─► observer.queue ─┐
//!   remove_child ──┘                                     │
//!                                       Document::flush ─┴─► callback(batch)
//! ```
//!
//! # Invariants
//!
//! 1. An observer queues at most one copy of each record.
//! 2. Batches preserve the order in which mutations happened.
//! 3. After [`MutationObserver::disconnect`] returns, the callback is never
//!    invoked again until the observer observes a node anew; queued records
//!    are discarded.
//! 4. Callbacks run with no document borrow held.
//!
//! # Failure Modes
//!
//! - **Callback feedback loop**: a callback that mutates its own observed
//!   subtree on every batch keeps the checkpoint running forever.
//! - **Dropped observer**: the registry holds observers weakly; dropping the
//!   last handle silently ends observation and discards queued records.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use tracing::{debug, debug_span, trace};

use crate::document::{Document, Node, NodeId};

bitflags! {
    /// Categories of mutation an observer can subscribe to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MutationKinds: u8 {
        /// Children added to or removed from the target.
        const CHILD_LIST = 1 << 0;
        /// Attribute set or removed on the target.
        const ATTRIBUTES = 1 << 1;
        /// Text node data replaced.
        const CHARACTER_DATA = 1 << 2;
    }
}

/// What an observer watches on a registered node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObserverOptions {
    pub kinds: MutationKinds,
    /// Also watch every descendant of the registered node.
    pub subtree: bool,
    /// Keep the previous value in attribute records.
    pub attribute_old_value: bool,
    /// Keep the previous data in character-data records.
    pub character_data_old_value: bool,
    /// Only report these attribute names (lowercased on registration).
    pub attribute_filter: Option<Vec<String>>,
}

impl ObserverOptions {
    /// Options with nothing selected. Must be extended before use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Child-list and attribute changes across the whole subtree.
    #[must_use]
    pub fn structure() -> Self {
        Self::new().child_list().attributes().subtree()
    }

    #[must_use]
    pub fn child_list(mut self) -> Self {
        self.kinds |= MutationKinds::CHILD_LIST;
        self
    }

    #[must_use]
    pub fn attributes(mut self) -> Self {
        self.kinds |= MutationKinds::ATTRIBUTES;
        self
    }

    #[must_use]
    pub fn character_data(mut self) -> Self {
        self.kinds |= MutationKinds::CHARACTER_DATA;
        self
    }

    #[must_use]
    pub fn subtree(mut self) -> Self {
        self.subtree = true;
        self
    }

    #[must_use]
    pub fn attribute_old_value(mut self) -> Self {
        self.attribute_old_value = true;
        self
    }

    #[must_use]
    pub fn character_data_old_value(mut self) -> Self {
        self.character_data_old_value = true;
        self
    }

    #[must_use]
    pub fn attribute_filter<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_filter = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Resolve implied kinds and reject options that watch nothing.
    ///
    /// Asking for old values or a filter implies the matching kind.
    fn normalized(mut self) -> Result<Self, ObserveError> {
        if self.attribute_old_value || self.attribute_filter.is_some() {
            self.kinds |= MutationKinds::ATTRIBUTES;
        }
        if self.character_data_old_value {
            self.kinds |= MutationKinds::CHARACTER_DATA;
        }
        if self.kinds.is_empty() {
            return Err(ObserveError::NoMutationTypes);
        }
        if let Some(filter) = &mut self.attribute_filter {
            for name in filter.iter_mut() {
                *name = name.to_ascii_lowercase();
            }
        }
        Ok(self)
    }
}

/// Errors from [`MutationObserver::observe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserveError {
    /// The options select no mutation kind at all.
    NoMutationTypes,
    /// The node belongs to a different document than the observer.
    WrongDocument,
}

impl fmt::Display for ObserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMutationTypes => {
                write!(f, "observer options must select at least one mutation kind")
            }
            Self::WrongDocument => write!(f, "node belongs to a different document"),
        }
    }
}

impl std::error::Error for ObserveError {}

/// The category of a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// One change to the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    /// The parent for child-list changes, otherwise the changed node.
    pub target: Node,
    pub added_nodes: Vec<Node>,
    pub removed_nodes: Vec<Node>,
    pub previous_sibling: Option<Node>,
    pub next_sibling: Option<Node>,
    pub attribute_name: Option<String>,
    /// Present only when the observer asked for old values.
    pub old_value: Option<String>,
}

type Callback = Rc<dyn Fn(Vec<MutationRecord>)>;

#[derive(Debug, Clone)]
struct Registration {
    node: NodeId,
    options: ObserverOptions,
}

pub(crate) struct ObserverShared {
    id: u64,
    document: Document,
    callback: Callback,
    registrations: RefCell<Vec<Registration>>,
    queue: RefCell<Vec<MutationRecord>>,
}

impl ObserverShared {
    /// Queue `record` if any registration wants it. `path` is the record
    /// target followed by its ancestors.
    fn offer(&self, path: &[NodeId], record: &MutationRecord) -> bool {
        let mut interested = false;
        let mut wants_old = false;
        for reg in self.registrations.borrow().iter() {
            let direct = path.first() == Some(&reg.node);
            if !direct && !(reg.options.subtree && path.contains(&reg.node)) {
                continue;
            }
            let opts = &reg.options;
            match record.kind {
                MutationKind::ChildList => {
                    if !opts.kinds.contains(MutationKinds::CHILD_LIST) {
                        continue;
                    }
                }
                MutationKind::Attributes => {
                    if !opts.kinds.contains(MutationKinds::ATTRIBUTES) {
                        continue;
                    }
                    if let (Some(filter), Some(name)) = (&opts.attribute_filter, &record.attribute_name)
                        && !filter.iter().any(|f| f == name)
                    {
                        continue;
                    }
                    wants_old |= opts.attribute_old_value;
                }
                MutationKind::CharacterData => {
                    if !opts.kinds.contains(MutationKinds::CHARACTER_DATA) {
                        continue;
                    }
                    wants_old |= opts.character_data_old_value;
                }
            }
            interested = true;
        }
        if interested {
            let mut queued = record.clone();
            if !wants_old {
                queued.old_value = None;
            }
            self.queue.borrow_mut().push(queued);
        }
        interested
    }
}

/// Weakly-held observers of one document, in creation order.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: Vec<Weak<ObserverShared>>,
    next_id: u64,
}

impl ObserverRegistry {
    pub(crate) fn enqueue(&mut self, path: &[NodeId], record: &MutationRecord) {
        self.observers.retain(|w| w.strong_count() > 0);
        for observer in self.observers.iter().filter_map(Weak::upgrade) {
            observer.offer(path, record);
        }
    }

    fn live(&mut self) -> Vec<Rc<ObserverShared>> {
        self.observers.retain(|w| w.strong_count() > 0);
        self.observers.iter().filter_map(Weak::upgrade).collect()
    }
}

impl Document {
    /// Deliver every queued mutation record.
    ///
    /// Returns the number of callback invocations. Records queued by callbacks
    /// are delivered before this returns.
    pub fn flush(&self) -> usize {
        let _span = debug_span!("mutation.flush").entered();
        let mut delivered = 0;
        loop {
            let observers = self.shared().observers.borrow_mut().live();
            let mut progressed = false;
            for observer in observers {
                let batch = std::mem::take(&mut *observer.queue.borrow_mut());
                if batch.is_empty() {
                    continue;
                }
                progressed = true;
                trace!(observer = observer.id, records = batch.len(), "deliver batch");
                let callback = Rc::clone(&observer.callback);
                callback(batch);
                delivered += 1;
            }
            if !progressed {
                break;
            }
        }
        delivered
    }

    /// Whether [`flush`](Self::flush) would invoke any callback.
    #[must_use]
    pub fn has_pending_mutations(&self) -> bool {
        self.shared()
            .observers
            .borrow_mut()
            .live()
            .iter()
            .any(|o| !o.queue.borrow().is_empty())
    }
}

/// Watches nodes of one document and receives batched records.
///
/// The document holds observers weakly: dropping the last handle ends
/// observation.
pub struct MutationObserver {
    shared: Rc<ObserverShared>,
}

impl fmt::Debug for MutationObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationObserver")
            .field("id", &self.shared.id)
            .field("registrations", &self.shared.registrations.borrow().len())
            .field("queued", &self.shared.queue.borrow().len())
            .finish()
    }
}

impl MutationObserver {
    /// Create an observer on `document`. It watches nothing until
    /// [`observe`](Self::observe) is called.
    pub fn new(document: &Document, callback: impl Fn(Vec<MutationRecord>) + 'static) -> Self {
        let mut registry = document.shared().observers.borrow_mut();
        registry.next_id += 1;
        let shared = Rc::new(ObserverShared {
            id: registry.next_id,
            document: document.clone(),
            callback: Rc::new(callback),
            registrations: RefCell::new(Vec::new()),
            queue: RefCell::new(Vec::new()),
        });
        registry.observers.push(Rc::downgrade(&shared));
        Self { shared }
    }

    /// Start watching `target`. Observing a node again replaces its options.
    pub fn observe(&self, target: &Node, options: ObserverOptions) -> Result<(), ObserveError> {
        if !self.shared.document.ptr_eq(target.document()) {
            return Err(ObserveError::WrongDocument);
        }
        let options = options.normalized()?;
        let node = target.node_id();
        let mut registrations = self.shared.registrations.borrow_mut();
        match registrations.iter_mut().find(|r| r.node == node) {
            Some(existing) => existing.options = options,
            None => registrations.push(Registration { node, options }),
        }
        debug!(
            observer = self.shared.id,
            node = ?node,
            registrations = registrations.len(),
            "observe"
        );
        Ok(())
    }

    /// Stop watching every node and drop queued records. Idempotent.
    pub fn disconnect(&self) {
        let had = !self.shared.registrations.borrow().is_empty();
        self.shared.registrations.borrow_mut().clear();
        self.shared.queue.borrow_mut().clear();
        if had {
            debug!(observer = self.shared.id, "disconnect");
        }
    }

    /// Take queued records without invoking the callback.
    pub fn take_records(&self) -> Vec<MutationRecord> {
        std::mem::take(&mut *self.shared.queue.borrow_mut())
    }

    /// Whether any node is currently registered.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        !self.shared.registrations.borrow().is_empty()
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.shared.document
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
