#![forbid(unsafe_code)]

//! domwatch public facade crate.
//!
//! Live, reactive query results over an observable document tree. Most users
//! only need the [`prelude`].

pub use domwatch_core as core;
#[cfg(feature = "runtime")]
pub use domwatch_runtime as runtime;

pub mod prelude {
    pub use domwatch_core::{
        Document, DomError, Element, MutationObserver, MutationRecord, Node, ObserverOptions,
        Selector, SelectorError,
    };

    #[cfg(feature = "runtime")]
    pub use domwatch_runtime::{
        LifecycleHooks, LiveSelection, LiveSelectionConfig, LiveSelectionError, Observable, Phase,
        ReadOnly, Scope, Source,
    };
}
