#![forbid(unsafe_code)]

//! Property bindings: named or dotted-path access through the resolver.
//!
//! A `PropertyBinding<T>` is keyed by its [`PropertyPath`], not by any
//! owner: the same binding reads `"Width"` off every owner it is applied
//! to, and two bindings with equal paths match the same change events.
//!
//! Change registration resolves the *leaf owner* (the object owning the
//! final path segment) once, at registration time, and registers there. It
//! does not follow intermediate objects as they are replaced — that is the
//! child-composition contract (see [`crate::child`]); compose
//! `property("A").child(&property("B"))` when re-hooking is wanted.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use weft_core::object::ObjectHandle;
use weft_core::path::{self, PathError, PropertyPath};
use weft_core::value::BindingValue;

use crate::binding::{BindingCore, ChangeHandler, ChangeToken, IndirectBinding};
use crate::bridge;

/// Binding to a property named by a [`PropertyPath`].
pub struct PropertyBinding<T: BindingValue> {
    path: PropertyPath,
    _value: PhantomData<T>,
}

impl<T: BindingValue> PropertyBinding<T> {
    /// Bind to an already-parsed path.
    #[must_use]
    pub fn new(path: PropertyPath) -> Self {
        Self {
            path,
            _value: PhantomData,
        }
    }

    /// Parse and bind a dotted path string.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        Ok(Self::new(PropertyPath::parse(path)?))
    }

    /// The path this binding resolves.
    #[must_use]
    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    /// Erase into the reusable binding description.
    #[must_use]
    pub fn into_binding(self) -> IndirectBinding<T> {
        IndirectBinding::from_core(Rc::new(self))
    }
}

impl<T: BindingValue> fmt::Debug for PropertyBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("path", &self.path)
            .finish()
    }
}

impl<T: BindingValue> BindingCore<T> for PropertyBinding<T> {
    fn load(&self, owner: &ObjectHandle) -> T {
        T::from_value(path::get_at(owner, &self.path)).unwrap_or_default()
    }

    fn store(&self, owner: &ObjectHandle, value: T) {
        path::set_at(owner, &self.path, value.into_value());
    }

    fn intermediate(&self, owner: &ObjectHandle) -> Option<ObjectHandle> {
        path::get_at(owner, &self.path).as_object()
    }

    fn watch(&self, owner: &ObjectHandle, handler: &ChangeHandler) -> ChangeToken {
        match path::leaf_owner(owner, &self.path) {
            Some(leaf) => bridge::add(&leaf, self.path.leaf(), handler),
            None => ChangeToken::dead(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::handler;
    use std::cell::Cell;
    use weft_core::object::DynamicObject;
    use weft_core::value::Value;

    #[test]
    fn typed_round_trip() {
        let owner = DynamicObject::new()
            .with("Flag", true)
            .with("Count", 3i64)
            .with("Label", "Test1")
            .into_handle();

        let flag = PropertyBinding::<bool>::parse("Flag").expect("valid").into_binding();
        let count = PropertyBinding::<i64>::parse("Count").expect("valid").into_binding();
        let label = PropertyBinding::<String>::parse("Label").expect("valid").into_binding();

        flag.set_value(&owner, false);
        count.set_value(&owner, 4);
        label.set_value(&owner, "Test2".to_owned());

        assert!(!flag.get_value(&owner));
        assert_eq!(count.get_value(&owner), 4);
        assert_eq!(label.get_value(&owner), "Test2");
    }

    #[test]
    fn type_mismatch_reads_default() {
        let owner = DynamicObject::new().with("Count", 3i64).into_handle();
        let as_string = PropertyBinding::<String>::parse("Count").expect("valid").into_binding();
        assert_eq!(as_string.get_value(&owner), String::new());
    }

    #[test]
    fn dotted_path_reaches_nested_owner() {
        let child = DynamicObject::new().with("Width", 5i64).into_handle();
        let owner = DynamicObject::new().with("Child", child.clone()).into_handle();
        let width = PropertyBinding::<i64>::parse("Child.Width").expect("valid").into_binding();
        assert_eq!(width.get_value(&owner), 5);
        width.set_value(&owner, 6);
        assert_eq!(
            PropertyBinding::<i64>::parse("Width").expect("valid").into_binding().get_value(&child),
            6
        );
    }

    #[test]
    fn watch_registers_on_leaf_owner() {
        let child = DynamicObject::new().with("Width", 5i64).into_handle();
        let owner = DynamicObject::new().with("Child", child.clone()).into_handle();
        let width = PropertyBinding::<i64>::parse("Child.Width").expect("valid").into_binding();

        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let h = handler(move |_| count_clone.set(count_clone.get() + 1));
        let token = width.add_value_changed(&owner, &h);

        // Mutating the leaf fires, whether through this binding or another.
        width.set_value(&owner, 6);
        PropertyBinding::<i64>::parse("Width").expect("valid").into_binding().set_value(&child, 7);
        assert_eq!(count.get(), 2);

        width.remove_value_changed(token);
        width.set_value(&owner, 8);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn watch_on_dead_path_is_inert() {
        let owner = DynamicObject::new().into_handle();
        let missing = PropertyBinding::<i64>::parse("Gone.Width").expect("valid").into_binding();
        let h = handler(|_| panic!("dead paths never fire"));
        let token = missing.add_value_changed(&owner, &h);
        assert!(token.is_dead());
    }

    #[test]
    fn intermediate_exposes_object_values() {
        let child = DynamicObject::new().into_handle();
        let owner = DynamicObject::new()
            .with("Child", child.clone())
            .with("Count", 1i64)
            .into_handle();

        let as_parent = PropertyBinding::<Value>::parse("Child").expect("valid");
        let hop = as_parent.intermediate(&owner).expect("object-valued");
        assert!(hop.ptr_eq(&child));

        let scalar = PropertyBinding::<Value>::parse("Count").expect("valid");
        assert!(scalar.intermediate(&owner).is_none());
    }
}
