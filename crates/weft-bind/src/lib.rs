#![forbid(unsafe_code)]

//! Typed, composable data bindings with live change propagation.
//!
//! # Role in Weft
//! `weft-bind` is the binding engine: it connects a property living inside
//! an arbitrary, possibly-changing object graph to consumers (widget
//! property setters, list column renderers, other bindings) and keeps them
//! informed when the value may have changed. Owners need no base class and
//! no mandatory notification interface; the engine works with whatever
//! capabilities an owner exposes and degrades gracefully when they are
//! absent.
//!
//! # Primary responsibilities
//! - **[`binding`]**: the factory surface (`binding::property`,
//!   `binding::delegate`, `binding::add_property_event`, ...) and the
//!   reusable [`IndirectBinding`] description.
//! - **[`property`]/[`delegate`]**: the two leaf binding kinds — named
//!   path access through the resolver, and caller-supplied accessors.
//! - **[`child`]**: composition of two bindings along a property path,
//!   re-hooking subscriptions when the intermediate object is replaced.
//! - **[`bridge`]**: the weak-subscription registry that normalizes owner
//!   change sources into one "value may have changed" stream.
//! - **[`object_binding`]/[`dual`]/[`scope`]**: scoping a binding to one
//!   owner, bidirectional synchronization, and grouped teardown.
//!
//! # Concurrency model
//! Single logical thread, no internal locking. Dispatch is synchronous and
//! in registration order; re-entrant mutation from inside a handler is
//! permitted and not deduplicated.

pub mod binding;
pub mod bridge;
pub mod child;
pub mod delegate;
pub mod dual;
pub mod object_binding;
pub mod property;
pub mod scope;

pub use binding::{ChangeHandler, ChangeToken, IndirectBinding, PropertyChange};
pub use delegate::DelegateBinding;
pub use dual::{DualBinding, UpdateMode};
pub use object_binding::ObjectBinding;
pub use property::PropertyBinding;
pub use scope::BindingScope;
