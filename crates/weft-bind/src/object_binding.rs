#![forbid(unsafe_code)]

//! Direct bindings: an indirect description scoped to one owner.
//!
//! `ObjectBinding<T>` pairs an [`IndirectBinding<T>`] with exactly one
//! [`ObjectHandle`] and forwards every operation with that owner filled in.
//! This is the common case — read and write a property of a known instance —
//! while the indirect description stays reusable elsewhere.

use std::fmt;

use weft_core::object::ObjectHandle;
use weft_core::value::BindingValue;

use crate::binding::{ChangeHandler, ChangeToken, IndirectBinding};

/// A binding fixed to one owner instance.
pub struct ObjectBinding<T: BindingValue> {
    owner: ObjectHandle,
    binding: IndirectBinding<T>,
}

impl<T: BindingValue> Clone for ObjectBinding<T> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            binding: self.binding.clone(),
        }
    }
}

impl<T: BindingValue> ObjectBinding<T> {
    /// Scope `binding` to `owner`.
    #[must_use]
    pub fn new(owner: ObjectHandle, binding: IndirectBinding<T>) -> Self {
        Self { owner, binding }
    }

    /// The owner this binding is scoped to.
    #[must_use]
    pub fn owner(&self) -> &ObjectHandle {
        &self.owner
    }

    /// The underlying reusable description.
    #[must_use]
    pub fn binding(&self) -> &IndirectBinding<T> {
        &self.binding
    }

    /// Read the bound value. Dead bindings read as `T::default()`.
    #[must_use]
    pub fn value(&self) -> T {
        self.binding.get_value(&self.owner)
    }

    /// Write the bound value. Dead bindings swallow the write.
    pub fn set_value(&self, value: T) {
        self.binding.set_value(&self.owner, value);
    }

    /// Register `handler` for change signals on this owner.
    pub fn add_value_changed(&self, handler: &ChangeHandler) -> ChangeToken {
        self.binding.add_value_changed(&self.owner, handler)
    }

    /// Remove one registration. Consumes the token; no-op if already
    /// removed.
    pub fn remove_value_changed(&self, token: ChangeToken) {
        self.binding.remove_value_changed(token);
    }
}

impl<T: BindingValue> fmt::Debug for ObjectBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBinding")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::binding::{self, handler};
    use std::cell::Cell;
    use std::rc::Rc;
    use weft_core::object::DynamicObject;

    #[test]
    fn scoped_round_trip() {
        let owner = DynamicObject::new().with("Width", 3i64).into_handle();
        let width = binding::property::<i64>("Width").bind_to(&owner);
        assert_eq!(width.value(), 3);
        width.set_value(4);
        assert_eq!(width.value(), 4);
    }

    #[test]
    fn one_description_many_owners() {
        let description = binding::property::<i64>("Width");
        let a = DynamicObject::new().with("Width", 1i64).into_handle();
        let b = DynamicObject::new().with("Width", 2i64).into_handle();
        let bound_a = description.bind_to(&a);
        let bound_b = description.bind_to(&b);
        bound_a.set_value(10);
        assert_eq!(bound_a.value(), 10);
        assert_eq!(bound_b.value(), 2, "scoping does not couple owners");
    }

    #[test]
    fn change_subscription_is_owner_scoped() {
        let owner = DynamicObject::new().with("Width", 1i64).into_handle();
        let other = DynamicObject::new().with("Width", 1i64).into_handle();
        let width = binding::property::<i64>("Width");
        let bound = width.bind_to(&owner);

        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let h = handler(move |_| count_clone.set(count_clone.get() + 1));
        let token = bound.add_value_changed(&h);

        width.set_value(&other, 9);
        assert_eq!(count.get(), 0, "another owner's change is invisible");

        bound.set_value(2);
        assert_eq!(count.get(), 1);

        bound.remove_value_changed(token);
        bound.set_value(3);
        assert_eq!(count.get(), 1);
    }
}
