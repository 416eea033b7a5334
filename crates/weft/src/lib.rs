#![forbid(unsafe_code)]

//! Weft public facade and prelude.
//!
//! Weft connects properties of arbitrary object graphs to consumers with
//! live change propagation. The pieces:
//!
//! - [`binding`] — the factory surface: `binding::property`,
//!   `binding::delegate`, `binding::add_property_event`, ...
//! - [`IndirectBinding`] / [`ObjectBinding`] — reusable descriptions and
//!   owner-scoped bindings.
//! - [`DynamicObject`] / [`PropertyObject`] — the owner side.
//! - [`DualBinding`] / [`BindingScope`] — synchronization and teardown.
//!
//! # Quick start
//!
//! ```
//! use weft::prelude::*;
//!
//! let owner = DynamicObject::new().with("Width", 10i64).into_handle();
//! let width = binding::property::<i64>("Width").bind_to(&owner);
//! assert_eq!(width.value(), 10);
//! width.set_value(42);
//! assert_eq!(width.value(), 42);
//! ```

pub use weft_bind::binding;
pub use weft_bind::bridge;
pub use weft_bind::{
    BindingScope, ChangeHandler, ChangeToken, DelegateBinding, DualBinding, IndirectBinding,
    ObjectBinding, PropertyBinding, PropertyChange, UpdateMode,
};
pub use weft_core::{
    BindingValue, ChangeEmitter, DynamicObject, EmitterSubscription, ObjectHandle, ObjectId,
    PathError, PropertyDescriptor, PropertyObject, PropertyPath, Value, WeakObjectHandle,
};

// Macros are exported at the defining crate's root; surface them here too.
pub use weft_bind::{bind_path, property_path};

/// Commonly used items, importable in one line.
pub mod prelude {
    pub use weft_bind::binding;
    pub use weft_bind::{
        BindingScope, ChangeHandler, DualBinding, IndirectBinding, ObjectBinding, UpdateMode,
    };
    pub use weft_core::{BindingValue, DynamicObject, ObjectHandle, PropertyObject, Value};
}
