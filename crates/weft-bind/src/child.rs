#![forbid(unsafe_code)]

//! Child-binding composition: `A.child(B)`.
//!
//! Composition chains two bindings along a property path. Reads and writes
//! go through whatever object the parent binding *currently* yields; the
//! interesting part is subscription, because that intermediate object can
//! be replaced while the subscription lives.
//!
//! # Invariants
//!
//! 1. At most one child-level registration is active per composite token at
//!    any time. Switching intermediates always detaches the old
//!    intermediate's registration *before* attaching to the new one — no
//!    leak, no double-fire.
//! 2. When the parent's value changes, the handler fires once for the
//!    switch itself (the chain's effective value may have changed), after
//!    re-hooking.
//! 3. Removing the composite token detaches both the parent-level and the
//!    currently-active child-level registration. `Removed` is terminal:
//!    a late parent event already in flight neither re-hooks nor fires.
//! 4. Composition is associative; a parent or child may itself be a
//!    composition, and the same rules apply at every level.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[cfg(feature = "tracing")]
use tracing::trace;

use weft_core::object::ObjectHandle;
use weft_core::value::BindingValue;

use crate::binding::{BindingCore, ChangeHandler, ChangeToken};

/// Type-erased view of a parent binding: the two operations composition
/// needs, independent of the parent's value type.
pub(crate) trait ParentCore {
    /// The object the child binding should operate on, if the parent
    /// currently yields one.
    fn intermediate(&self, owner: &ObjectHandle) -> Option<ObjectHandle>;

    fn watch(&self, owner: &ObjectHandle, handler: &ChangeHandler) -> ChangeToken;
}

/// Adapter erasing a typed [`BindingCore`] into a [`ParentCore`].
pub(crate) struct ParentLink<P: BindingValue> {
    core: Rc<dyn BindingCore<P>>,
}

impl<P: BindingValue> ParentLink<P> {
    pub(crate) fn new(core: Rc<dyn BindingCore<P>>) -> Self {
        Self { core }
    }
}

impl<P: BindingValue> ParentCore for ParentLink<P> {
    fn intermediate(&self, owner: &ObjectHandle) -> Option<ObjectHandle> {
        self.core.intermediate(owner)
    }

    fn watch(&self, owner: &ObjectHandle, handler: &ChangeHandler) -> ChangeToken {
        self.core.watch(owner, handler)
    }
}

/// Per-subscription state of a composite registration.
///
/// Holds the parent-level token and whichever child-level token is
/// currently active; the re-hook closure swaps the latter as intermediates
/// come and go.
pub(crate) struct CompositeState {
    removed: Cell<bool>,
    parent_token: RefCell<Option<ChangeToken>>,
    child_token: RefCell<Option<ChangeToken>>,
}

impl CompositeState {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            removed: Cell::new(false),
            parent_token: RefCell::new(None),
            child_token: RefCell::new(None),
        })
    }

    /// Detach both levels. Idempotent; afterwards no signal is delivered
    /// through this subscription again.
    pub(crate) fn detach(&self) {
        if self.removed.replace(true) {
            return;
        }
        if let Some(token) = self.parent_token.borrow_mut().take() {
            token.detach();
        }
        if let Some(token) = self.child_token.borrow_mut().take() {
            token.detach();
        }
    }
}

/// The composed binding `parent.child`.
pub(crate) struct ChildCore<U: BindingValue> {
    parent: Rc<dyn ParentCore>,
    child: Rc<dyn BindingCore<U>>,
}

impl<U: BindingValue> ChildCore<U> {
    pub(crate) fn new(parent: Rc<dyn ParentCore>, child: Rc<dyn BindingCore<U>>) -> Self {
        Self { parent, child }
    }
}

impl<U: BindingValue> BindingCore<U> for ChildCore<U> {
    fn load(&self, owner: &ObjectHandle) -> U {
        match self.parent.intermediate(owner) {
            Some(intermediate) => self.child.load(&intermediate),
            None => U::default(),
        }
    }

    fn store(&self, owner: &ObjectHandle, value: U) {
        if let Some(intermediate) = self.parent.intermediate(owner) {
            self.child.store(&intermediate, value);
        }
    }

    fn watch(&self, owner: &ObjectHandle, handler: &ChangeHandler) -> ChangeToken {
        let state = CompositeState::new();

        if let Some(intermediate) = self.parent.intermediate(owner) {
            *state.child_token.borrow_mut() = Some(self.child.watch(&intermediate, handler));
        }

        let rehook = {
            let state = Rc::clone(&state);
            let parent = Rc::clone(&self.parent);
            let child = Rc::clone(&self.child);
            let user = Rc::clone(handler);
            // Weak: this closure lives in the owner's registry entry, and a
            // strong capture would keep the owner alive through it.
            let owner = owner.downgrade();
            crate::binding::handler(move |change| {
                if state.removed.get() {
                    return;
                }
                // Old intermediate first: never leave it subscribed, never
                // hold two child-level registrations at once.
                if let Some(token) = state.child_token.borrow_mut().take() {
                    token.detach();
                }
                if let Some(intermediate) = owner
                    .upgrade()
                    .and_then(|owner| parent.intermediate(&owner))
                {
                    #[cfg(feature = "tracing")]
                    trace!(intermediate = ?intermediate, "re-hooking child registration");
                    *state.child_token.borrow_mut() = Some(child.watch(&intermediate, &user));
                }
                // The chain's effective value may have changed.
                user(change);
            })
        };
        *state.parent_token.borrow_mut() = Some(self.parent.watch(owner, &rehook));

        ChangeToken::from_composite(state)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::binding::{self, IndirectBinding, handler};
    use std::cell::Cell;
    use std::rc::Rc;
    use weft_core::object::{DynamicObject, ObjectHandle};
    use weft_core::value::Value;

    fn child_with_width(width: i64) -> ObjectHandle {
        DynamicObject::new().with("Width", width).into_handle()
    }

    fn composed() -> IndirectBinding<i64> {
        binding::property::<Value>("Child").child(&binding::property::<i64>("Width"))
    }

    fn counting_handler() -> (Rc<Cell<u32>>, crate::binding::ChangeHandler) {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        (count, handler(move |_| count_clone.set(count_clone.get() + 1)))
    }

    #[test]
    fn get_and_set_through_intermediate() {
        let inner = child_with_width(5);
        let owner = DynamicObject::new().with("Child", inner.clone()).into_handle();
        let b = composed();
        assert_eq!(b.get_value(&owner), 5);
        b.set_value(&owner, 6);
        assert_eq!(binding::property::<i64>("Width").get_value(&inner), 6);
    }

    #[test]
    fn null_intermediate_is_dead() {
        let owner = DynamicObject::new().with("Child", Value::Null).into_handle();
        let b = composed();
        assert_eq!(b.get_value(&owner), 0);
        b.set_value(&owner, 6);
        assert_eq!(b.get_value(&owner), 0);
    }

    #[test]
    fn child_change_fires_handler() {
        let inner = child_with_width(5);
        let owner = DynamicObject::new().with("Child", inner.clone()).into_handle();
        let b = composed();
        let (count, h) = counting_handler();
        let _token = b.add_value_changed(&owner, &h);

        binding::property::<i64>("Width").set_value(&inner, 6);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn parent_switch_fires_once_and_rebinds() {
        let first = child_with_width(1);
        let second = child_with_width(2);
        let owner = DynamicObject::new().with("Child", first.clone()).into_handle();
        let b = composed();
        let (count, h) = counting_handler();
        let _token = b.add_value_changed(&owner, &h);

        // Replace the intermediate: one fire for the switch itself.
        binding::property::<Value>("Child").set_value(&owner, Value::Object(second.clone()));
        assert_eq!(count.get(), 1);

        // The old intermediate is fully detached...
        binding::property::<i64>("Width").set_value(&first, 10);
        assert_eq!(count.get(), 1);

        // ...and the new one is live, exactly once.
        binding::property::<i64>("Width").set_value(&second, 20);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn switch_to_null_detaches_child_level() {
        let first = child_with_width(1);
        let owner = DynamicObject::new().with("Child", first.clone()).into_handle();
        let b = composed();
        let (count, h) = counting_handler();
        let _token = b.add_value_changed(&owner, &h);

        binding::property::<Value>("Child").set_value(&owner, Value::Null);
        assert_eq!(count.get(), 1, "the switch fires");

        binding::property::<i64>("Width").set_value(&first, 10);
        assert_eq!(count.get(), 1, "orphaned intermediate no longer fires");
    }

    #[test]
    fn removal_detaches_both_levels() {
        let inner = child_with_width(1);
        let owner = DynamicObject::new().with("Child", inner.clone()).into_handle();
        let b = composed();
        let (count, h) = counting_handler();
        let token = b.add_value_changed(&owner, &h);

        b.remove_value_changed(token);
        binding::property::<i64>("Width").set_value(&inner, 10);
        binding::property::<Value>("Child").set_value(&owner, Value::Null);
        assert_eq!(count.get(), 0);
        assert_eq!(crate::bridge::owner_entry_count(), 0, "nothing dangles");
    }

    #[test]
    fn removal_detaches_current_intermediate_after_switches() {
        let first = child_with_width(1);
        let second = child_with_width(2);
        let owner = DynamicObject::new().with("Child", first).into_handle();
        let b = composed();
        let (count, h) = counting_handler();
        let token = b.add_value_changed(&owner, &h);

        binding::property::<Value>("Child").set_value(&owner, Value::Object(second.clone()));
        assert_eq!(count.get(), 1);

        b.remove_value_changed(token);
        binding::property::<i64>("Width").set_value(&second, 20);
        assert_eq!(count.get(), 1);
        assert_eq!(crate::bridge::owner_entry_count(), 0);
    }

    #[test]
    fn three_level_composition_rebinds_recursively() {
        let leaf = child_with_width(1);
        let middle = DynamicObject::new().with("Leaf", leaf.clone()).into_handle();
        let owner = DynamicObject::new().with("Middle", middle.clone()).into_handle();

        let b = binding::property::<Value>("Middle")
            .child(&binding::property::<Value>("Leaf"))
            .child(&binding::property::<i64>("Width"));
        assert_eq!(b.get_value(&owner), 1);

        let (count, h) = counting_handler();
        let _token = b.add_value_changed(&owner, &h);

        binding::property::<i64>("Width").set_value(&leaf, 2);
        assert_eq!(count.get(), 1);

        // Replace the middle object; the whole tail re-hooks.
        let new_leaf = child_with_width(7);
        let new_middle = DynamicObject::new().with("Leaf", new_leaf.clone()).into_handle();
        binding::property::<Value>("Middle").set_value(&owner, Value::Object(new_middle));
        assert_eq!(count.get(), 2);
        assert_eq!(b.get_value(&owner), 7);

        binding::property::<i64>("Width").set_value(&leaf, 3);
        assert_eq!(count.get(), 2, "old branch fully detached");

        binding::property::<i64>("Width").set_value(&new_leaf, 8);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn double_removal_is_a_no_op() {
        let inner = child_with_width(1);
        let owner = DynamicObject::new().with("Child", inner).into_handle();
        let b = composed();
        let (_count, h) = counting_handler();
        let token = b.add_value_changed(&owner, &h);
        token.detach();
        token.detach();
    }
}
