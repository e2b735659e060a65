#![forbid(unsafe_code)]

//! Core: the document model that live selections observe.
//!
//! # Role in domwatch
//! `domwatch-core` plays the part of the host environment. It owns the
//! document tree, the selector engine used to query it, and the mutation
//! observer that reports structural and attribute changes.
//!
//! # Primary responsibilities
//! - **Document**: arena-backed tree of elements and text nodes with cheap,
//!   identity-comparable handles ([`Node`], [`Element`]).
//! - **Selectors**: parsing and matching of the CSS selector subset used by
//!   [`Element::query_selector_all`].
//! - **Mutation observation**: [`MutationObserver`] records are queued as the
//!   tree changes and delivered in batches by [`Document::flush`].
//!
//! # How it fits in the system
//! The runtime (`domwatch-runtime`) binds reactive inputs to an observer on a
//! root element and recomputes its snapshot whenever a batch arrives. Nothing
//! in this crate knows about reactivity.

pub mod document;
pub mod mutation;
pub mod selector;

pub use document::{Attribute, Document, DomError, Element, Node, NodeId};
pub use mutation::{
    MutationKind, MutationKinds, MutationObserver, MutationRecord, ObserveError, ObserverOptions,
};
pub use selector::{Selector, SelectorError};
