#![forbid(unsafe_code)]

//! Reactive bindings for domwatch.
//!
//! - [`Observable`]: shared, version-tracked cell with change listeners.
//! - [`Subscription`]: RAII guard; dropping it unsubscribes.
//! - [`ReadOnly`]: accessor-only view handed to consumers.
//! - [`Source`]: a plain value, a cell, or a getter, read uniformly.
//!
//! # Architecture
//!
//! Everything is single-threaded (`Rc<RefCell<..>>`). There is no implicit
//! dependency tracking: a consumer that wants to react to a cell subscribes
//! to it explicitly and keeps the guard for as long as it cares.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per value-changing write.
//! 2. Listeners run in registration order.
//! 3. Writing an equal value is a no-op.
//! 4. A dropped [`Subscription`] is never called again.

pub mod observable;
pub mod read_only;
pub mod source;

pub use observable::{Observable, Subscription};
pub use read_only::ReadOnly;
pub use source::Source;
