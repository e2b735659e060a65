#![forbid(unsafe_code)]

//! Arena-backed document tree with identity-comparable handles.
//!
//! # Design
//!
//! A [`Document`] owns every node it creates in a flat arena
//! (`Rc<RefCell<Tree>>`). Handles ([`Node`], [`Element`]) pair the document
//! with a [`NodeId`] and are cheap to clone. Two handles are equal when they
//! refer to the same node of the same document.
//!
//! Nodes are never freed while the document lives: a removed node becomes a
//! detached subtree that can be re-inserted later.
//!
//! # Invariants
//!
//! 1. Every parent is an element; text nodes have no children.
//! 2. A node appears in at most one parent's child list, and its `parent`
//!    field names that parent.
//! 3. No node is its own ancestor.
//! 4. Every structural or attribute change queues exactly one
//!    [`MutationRecord`] (moves queue a removal and an insertion).
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Cycle | Inserting a node into its own subtree | `DomError::HierarchyRequest` |
//! | Text parent | Inserting under a text node | `DomError::HierarchyRequest` |
//! | Stale reference | Reference child not under parent | `DomError::NotFound` |
//! | Foreign handle | Node from another document | `DomError::WrongDocument` |

use std::cell::{Ref, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

use tracing::trace;

use crate::mutation::{MutationKind, MutationRecord, ObserverRegistry};
use crate::selector::{Selector, SelectorError};

/// Index of a node inside its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single `name="value"` pair on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Errors from tree mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The insertion would break the tree shape.
    HierarchyRequest(&'static str),
    /// The given node is not a child of the parent it was used with.
    NotFound,
    /// The node belongs to a different document.
    WrongDocument,
    /// A tag or attribute name was empty or contained forbidden characters.
    InvalidName(String),
    /// Character data was set on a node that is not a text node.
    NotCharacterData,
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HierarchyRequest(reason) => write!(f, "hierarchy request error: {reason}"),
            Self::NotFound => write!(f, "node is not a child of this parent"),
            Self::WrongDocument => write!(f, "node belongs to a different document"),
            Self::InvalidName(name) => write!(f, "invalid name: {name:?}"),
            Self::NotCharacterData => write!(f, "node does not hold character data"),
        }
    }
}

impl std::error::Error for DomError {}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<Attribute>,
}

impl ElementData {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

pub(crate) enum NodeData {
    Element(ElementData),
    Text(String),
}

pub(crate) struct NodeSlot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The node arena. Borrowed by the selector engine while matching.
pub(crate) struct Tree {
    nodes: Vec<NodeSlot>,
    document_element: NodeId,
}

impl Tree {
    fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            document_element: NodeId(0),
        };
        tree.document_element = tree.alloc(NodeData::Element(ElementData {
            tag: "html".to_string(),
            attrs: Vec::new(),
        }));
        tree
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeSlot {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    #[inline]
    fn slot(&self, id: NodeId) -> &NodeSlot {
        &self.nodes[id.index()]
    }

    #[inline]
    fn slot_mut(&mut self, id: NodeId) -> &mut NodeSlot {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.slot(id).data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.slot_mut(id).data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).parent
    }

    pub(crate) fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = &self.slot(parent).children;
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .find(|&c| self.element(c).is_some())
    }

    fn sibling(&self, id: NodeId, offset: isize) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = &self.slot(parent).children;
        let pos = siblings.iter().position(|&c| c == id)?;
        let target = pos.checked_add_signed(offset)?;
        siblings.get(target).copied()
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.parent(id);
        }
        false
    }

    /// `id` followed by each of its ancestors, nearest first.
    pub(crate) fn inclusive_ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            path.push(p);
            cur = self.parent(p);
        }
        path
    }

    /// Pre-order descendants of `root`, excluding `root` itself.
    pub(crate) fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.slot(root).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.slot(id).children.iter().rev().copied());
        }
        out
    }

    fn text_content(&self, id: NodeId, out: &mut String) {
        match &self.slot(id).data {
            NodeData::Text(data) => out.push_str(data),
            NodeData::Element(_) => {
                for &child in &self.slot(id).children {
                    self.text_content(child, out);
                }
            }
        }
    }
}

fn validate_name(name: &str) -> Result<String, DomError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '<' | '>' | '/' | '=' | '"' | '\''));
    if valid {
        Ok(name.to_ascii_lowercase())
    } else {
        Err(DomError::InvalidName(name.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

pub(crate) struct DocumentShared {
    tree: RefCell<Tree>,
    pub(crate) observers: RefCell<ObserverRegistry>,
}

/// A document: the arena plus the observers registered against it.
///
/// Cloning a `Document` creates another handle to the **same** tree.
#[derive(Clone)]
pub struct Document {
    shared: Rc<DocumentShared>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.node_count())
            .field("pending_mutations", &self.has_pending_mutations())
            .finish()
    }
}

impl Document {
    /// Create a document holding only its `<html>` document element.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Rc::new(DocumentShared {
                tree: RefCell::new(Tree::new()),
                observers: RefCell::new(ObserverRegistry::default()),
            }),
        }
    }

    /// The root `<html>` element. Nodes reachable from it are connected.
    #[must_use]
    pub fn document_element(&self) -> Element {
        let id = self.tree().document_element;
        Element {
            node: self.node(id),
        }
    }

    /// Create a detached element. The tag name is lowercased.
    pub fn create_element(&self, tag: &str) -> Result<Element, DomError> {
        let tag = validate_name(tag)?;
        let id = self
            .shared
            .tree
            .borrow_mut()
            .alloc(NodeData::Element(ElementData {
                tag,
                attrs: Vec::new(),
            }));
        Ok(Element {
            node: self.node(id),
        })
    }

    /// Create a detached text node.
    pub fn create_text_node(&self, data: impl Into<String>) -> Node {
        let id = self.shared.tree.borrow_mut().alloc(NodeData::Text(data.into()));
        self.node(id)
    }

    /// Total nodes ever created in this document (detached ones included).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tree().nodes.len()
    }

    /// Whether two handles refer to the same document.
    #[must_use]
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    pub(crate) fn tree(&self) -> Ref<'_, Tree> {
        self.shared.tree.borrow()
    }

    pub(crate) fn shared(&self) -> &Rc<DocumentShared> {
        &self.shared
    }

    pub(crate) fn node(&self, id: NodeId) -> Node {
        Node {
            document: self.clone(),
            id,
        }
    }

    fn check_owner(&self, node: &Node) -> Result<(), DomError> {
        if self.ptr_eq(&node.document) {
            Ok(())
        } else {
            Err(DomError::WrongDocument)
        }
    }

    /// Queue `record` for every observer interested in its target.
    fn queue(&self, record: MutationRecord) {
        let path = self.tree().inclusive_ancestors(record.target.id);
        trace!(kind = ?record.kind, target = record.target.id.0, "queue mutation record");
        self.shared.observers.borrow_mut().enqueue(&path, &record);
    }

    fn child_list_record(
        &self,
        parent: NodeId,
        added: Option<NodeId>,
        removed: Option<NodeId>,
        previous: Option<NodeId>,
        next: Option<NodeId>,
    ) -> MutationRecord {
        MutationRecord {
            kind: MutationKind::ChildList,
            target: self.node(parent),
            added_nodes: added.map(|id| self.node(id)).into_iter().collect(),
            removed_nodes: removed.map(|id| self.node(id)).into_iter().collect(),
            previous_sibling: previous.map(|id| self.node(id)),
            next_sibling: next.map(|id| self.node(id)),
            attribute_name: None,
            old_value: None,
        }
    }

    /// Unlink `child` from `parent` and queue the removal record.
    fn detach(&self, parent: NodeId, child: NodeId) {
        let (previous, next) = {
            let mut tree = self.shared.tree.borrow_mut();
            let siblings = &mut tree.slot_mut(parent).children;
            let Some(pos) = siblings.iter().position(|&c| c == child) else {
                return;
            };
            siblings.remove(pos);
            let previous = pos.checked_sub(1).map(|i| siblings[i]);
            let next = siblings.get(pos).copied();
            tree.slot_mut(child).parent = None;
            (previous, next)
        };
        let record = self.child_list_record(parent, None, Some(child), previous, next);
        self.queue(record);
    }

    fn insert(&self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> Result<(), DomError> {
        let before = {
            let tree = self.tree();
            if tree.element(parent).is_none() {
                return Err(DomError::HierarchyRequest("text nodes cannot have children"));
            }
            if tree.is_inclusive_ancestor(child, parent) {
                return Err(DomError::HierarchyRequest(
                    "a node cannot be inserted into its own subtree",
                ));
            }
            if let Some(reference) = before
                && tree.parent(reference) != Some(parent)
            {
                return Err(DomError::NotFound);
            }
            // Inserting a node before itself means "before its next sibling".
            if before == Some(child) {
                tree.sibling(child, 1)
            } else {
                before
            }
        };

        // Bound first: `detach` needs the tree mutably.
        let old_parent = self.tree().parent(child);
        if let Some(old_parent) = old_parent {
            self.detach(old_parent, child);
        }

        let (previous, next) = {
            let mut tree = self.shared.tree.borrow_mut();
            let siblings = &mut tree.slot_mut(parent).children;
            let pos = match before {
                Some(reference) => siblings
                    .iter()
                    .position(|&c| c == reference)
                    .unwrap_or(siblings.len()),
                None => siblings.len(),
            };
            siblings.insert(pos, child);
            let previous = pos.checked_sub(1).map(|i| siblings[i]);
            let next = siblings.get(pos + 1).copied();
            tree.slot_mut(child).parent = Some(parent);
            (previous, next)
        };
        let record = self.child_list_record(parent, Some(child), None, previous, next);
        self.queue(record);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Handle to any node (element or text).
#[derive(Clone)]
pub struct Node {
    document: Document,
    id: NodeId,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.document.ptr_eq(&other.document)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.document.shared).hash(state);
        self.id.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_element() {
            Some(el) => fmt::Debug::fmt(&el, f),
            None => write!(f, "#text({:?})#{}", self.data().unwrap_or_default(), self.id.0),
        }
    }
}

impl AsRef<Node> for Node {
    fn as_ref(&self) -> &Node {
        self
    }
}

impl Node {
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    pub fn is_element(&self) -> bool {
        self.document.tree().element(self.id).is_some()
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        !self.is_element()
    }

    /// Narrow to an [`Element`] handle if this node is an element.
    #[must_use]
    pub fn as_element(&self) -> Option<Element> {
        self.is_element().then(|| Element { node: self.clone() })
    }

    #[must_use]
    pub fn parent_element(&self) -> Option<Element> {
        let parent = self.document.tree().parent(self.id)?;
        Some(Element {
            node: self.document.node(parent),
        })
    }

    #[must_use]
    pub fn child_nodes(&self) -> Vec<Node> {
        let tree = self.document.tree();
        tree.slot(self.id)
            .children
            .iter()
            .map(|&id| self.document.node(id))
            .collect()
    }

    #[must_use]
    pub fn previous_sibling(&self) -> Option<Node> {
        let id = self.document.tree().sibling(self.id, -1)?;
        Some(self.document.node(id))
    }

    #[must_use]
    pub fn next_sibling(&self) -> Option<Node> {
        let id = self.document.tree().sibling(self.id, 1)?;
        Some(self.document.node(id))
    }

    /// Whether the node is reachable from the document element.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let tree = self.document.tree();
        tree.is_inclusive_ancestor(tree.document_element, self.id)
    }

    /// Whether `other` is this node or one of its descendants.
    #[must_use]
    pub fn contains(&self, other: &Node) -> bool {
        self.document.ptr_eq(&other.document)
            && self.document.tree().is_inclusive_ancestor(self.id, other.id)
    }

    /// Concatenated data of all text nodes in this subtree.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.document.tree().text_content(self.id, &mut out);
        out
    }

    /// Character data of a text node, `None` for elements.
    #[must_use]
    pub fn data(&self) -> Option<String> {
        match &self.document.tree().slot(self.id).data {
            NodeData::Text(data) => Some(data.clone()),
            NodeData::Element(_) => None,
        }
    }

    /// Replace the character data of a text node.
    pub fn set_data(&self, data: impl Into<String>) -> Result<(), DomError> {
        let old = {
            let mut tree = self.document.shared.tree.borrow_mut();
            match &mut tree.slot_mut(self.id).data {
                NodeData::Text(current) => std::mem::replace(current, data.into()),
                NodeData::Element(_) => return Err(DomError::NotCharacterData),
            }
        };
        self.document.queue(MutationRecord {
            kind: MutationKind::CharacterData,
            target: self.clone(),
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            old_value: Some(old),
        });
        Ok(())
    }

    /// Detach this node from its parent. Returns `false` if already detached.
    pub fn remove(&self) -> bool {
        let Some(parent) = self.document.tree().parent(self.id) else {
            return false;
        };
        self.document.detach(parent, self.id);
        true
    }
}

/// Handle to an element node.
///
/// Dereferences to [`Node`] for the operations shared with text nodes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Element {
    node: Node,
}

impl Deref for Element {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl AsRef<Node> for Element {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        element.node
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.node.document.tree();
        let Some(el) = tree.element(self.node.id) else {
            return write!(f, "<?>#{}", self.node.id.0);
        };
        write!(f, "<{}", el.tag)?;
        for attr in &el.attrs {
            write!(f, " {}={:?}", attr.name, attr.value)?;
        }
        write!(f, ">#{}", self.node.id.0)
    }
}

impl Element {
    #[must_use]
    pub fn as_node(&self) -> &Node {
        &self.node
    }

    /// Lowercased tag name.
    #[must_use]
    pub fn tag_name(&self) -> String {
        self.with_data(|el| el.tag.clone())
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.with_data(|el| el.attr(&name).map(str::to_string))
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.with_data(|el| el.attr(&name).is_some())
    }

    /// Attributes in insertion order.
    #[must_use]
    pub fn attributes(&self) -> Vec<Attribute> {
        self.with_data(|el| el.attrs.clone())
    }

    /// Value of the `id` attribute.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.attribute("id")
    }

    #[must_use]
    pub fn class_list(&self) -> Vec<String> {
        self.attribute("class")
            .map(|c| c.split_ascii_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.with_data(|el| {
            el.attr("class")
                .is_some_and(|c| c.split_ascii_whitespace().any(|x| x == class))
        })
    }

    /// Set an attribute, queuing a record even when the value is unchanged.
    pub fn set_attribute(&self, name: &str, value: impl Into<String>) -> Result<(), DomError> {
        let name = validate_name(name)?;
        let value = value.into();
        let old = {
            let mut tree = self.node.document.shared.tree.borrow_mut();
            let Some(el) = tree.element_mut(self.node.id) else {
                return Err(DomError::NotFound);
            };
            match el.attrs.iter_mut().find(|a| a.name == name) {
                Some(attr) => Some(std::mem::replace(&mut attr.value, value)),
                None => {
                    el.attrs.push(Attribute {
                        name: name.clone(),
                        value,
                    });
                    None
                }
            }
        };
        self.queue_attribute(name, old);
        Ok(())
    }

    /// Remove an attribute. Returns whether it existed; a record is queued
    /// only in that case.
    pub fn remove_attribute(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        let old = {
            let mut tree = self.node.document.shared.tree.borrow_mut();
            let Some(el) = tree.element_mut(self.node.id) else {
                return false;
            };
            let Some(pos) = el.attrs.iter().position(|a| a.name == name) else {
                return false;
            };
            el.attrs.remove(pos).value
        };
        self.queue_attribute(name, Some(old));
        true
    }

    fn queue_attribute(&self, name: String, old: Option<String>) {
        self.node.document.queue(MutationRecord {
            kind: MutationKind::Attributes,
            target: self.node.clone(),
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: Some(name),
            old_value: old,
        });
    }

    /// Append `child`, moving it out of its current parent first.
    pub fn append_child(&self, child: impl AsRef<Node>) -> Result<(), DomError> {
        let child = child.as_ref();
        self.node.document.check_owner(child)?;
        self.node.document.insert(self.node.id, child.id, None)
    }

    /// Insert `child` before `reference`, or append when `reference` is `None`.
    pub fn insert_before(
        &self,
        child: impl AsRef<Node>,
        reference: Option<&Node>,
    ) -> Result<(), DomError> {
        let child = child.as_ref();
        self.node.document.check_owner(child)?;
        if let Some(reference) = reference {
            self.node.document.check_owner(reference)?;
        }
        self.node
            .document
            .insert(self.node.id, child.id, reference.map(|r| r.id))
    }

    /// Remove `child` from this element.
    pub fn remove_child(&self, child: impl AsRef<Node>) -> Result<Node, DomError> {
        let child = child.as_ref();
        self.node.document.check_owner(child)?;
        if self.node.document.tree().parent(child.id) != Some(self.node.id) {
            return Err(DomError::NotFound);
        }
        self.node.document.detach(self.node.id, child.id);
        Ok(child.clone())
    }

    /// Element children in order.
    #[must_use]
    pub fn children(&self) -> Vec<Element> {
        let tree = self.node.document.tree();
        tree.slot(self.node.id)
            .children
            .iter()
            .filter(|&&id| tree.element(id).is_some())
            .map(|&id| Element {
                node: self.node.document.node(id),
            })
            .collect()
    }

    /// All descendant elements matching `selector`, in document order.
    ///
    /// The element itself is never included, but its ancestors take part in
    /// matching combinators.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<Element>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.select_all(&selector))
    }

    /// First descendant element matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<Element>, SelectorError> {
        let selector = Selector::parse(selector)?;
        let tree = self.node.document.tree();
        let found = tree
            .descendants(self.node.id)
            .into_iter()
            .find(|&id| selector.matches(&tree, id));
        Ok(found.map(|id| Element {
            node: self.node.document.node(id),
        }))
    }

    /// Whether this element matches `selector`.
    pub fn matches(&self, selector: &str) -> Result<bool, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(selector.matches(&self.node.document.tree(), self.node.id))
    }

    /// Query with an already-parsed selector.
    #[must_use]
    pub fn select_all(&self, selector: &Selector) -> Vec<Element> {
        let ids: Vec<NodeId> = {
            let tree = self.node.document.tree();
            tree.descendants(self.node.id)
                .into_iter()
                .filter(|&id| selector.matches(&tree, id))
                .collect()
        };
        ids.into_iter()
            .map(|id| Element {
                node: self.node.document.node(id),
            })
            .collect()
    }

    fn with_data<R>(&self, f: impl FnOnce(&ElementData) -> R) -> R {
        let tree = self.node.document.tree();
        match tree.element(self.node.id) {
            Some(el) => f(el),
            // Element handles are only minted for element slots, and slots
            // never change kind.
            None => unreachable!("element handle points at a text node"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
