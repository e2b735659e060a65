#![forbid(unsafe_code)]

//! Runtime: reactive live selections bound to an owner lifecycle.
//!
//! # Role in domwatch
//! `domwatch-runtime` turns the one-shot query of `domwatch-core` into a
//! value that stays current. A [`LiveSelection`] watches a root element and
//! republishes the list of matching elements after every mutation batch.
//!
//! # Primary responsibilities
//! - **Reactive cells**: [`reactive::Observable`], its read-only view, and
//!   [`reactive::Source`] for inputs that may or may not be reactive.
//! - **Lifecycle**: [`lifecycle::Scope`] and the [`lifecycle::LifecycleHooks`]
//!   seam a host framework implements.
//! - **Live selection**: observer binding, restarts on input change, and
//!   teardown.
//!
//! # How it fits in the system
//! Hosts mutate a `domwatch_core::Document` and call `Document::flush` at
//! their checkpoint; live selections update during that flush.

pub mod lifecycle;
pub mod live_selection;
pub mod reactive;

pub use lifecycle::{Hook, LifecycleHooks, Phase, Scope};
pub use live_selection::{BindingState, LiveSelection, LiveSelectionConfig, LiveSelectionError};
pub use reactive::{Observable, ReadOnly, Source, Subscription};
