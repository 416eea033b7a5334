#![forbid(unsafe_code)]

//! Dynamic object model and property-path resolution for Weft.
//!
//! # Role in Weft
//! `weft-core` is the layer underneath the binding engine. It defines what an
//! "owner" is (any shape of object, exposed through a capability trait), what
//! a dynamically-typed property value looks like, how a dotted property path
//! is resolved against a live object graph, and how an owner reports "this
//! named property changed" to interested parties.
//!
//! # Primary responsibilities
//! - **Value**: the dynamic property value carried through the untyped half
//!   of the engine, with typed conversion edges via [`BindingValue`].
//! - **PropertyObject/ObjectHandle**: the owner contract and the shared
//!   single-threaded handle bindings operate on.
//! - **PropertyPath**: validated dotted paths and the two-tier per-segment
//!   resolver (structured descriptors first, member lookup second).
//! - **ChangeEmitter**: the structured change-notification contract.
//!
//! # How it fits in the system
//! `weft-bind` builds the binding hierarchy (property bindings, delegate
//! bindings, child composition, the notification bridge) on top of these
//! primitives. Nothing in this crate knows about widgets or rendering; the
//! only inputs are owner objects and callbacks.

pub mod notify;
pub mod object;
pub mod path;
pub mod value;

pub use notify::{ChangeEmitter, EmitterSubscription};
pub use object::{
    DynamicObject, ObjectHandle, ObjectId, PropertyDescriptor, PropertyObject, WeakObjectHandle,
};
pub use path::{PathError, PropertyPath};
pub use value::{BindingValue, Value};
