#![forbid(unsafe_code)]

//! Delegate bindings: caller-supplied accessors over a concrete owner type.
//!
//! A `DelegateBinding<S, T>` reads and writes through closures instead of a
//! reflective property, so it can bind values that no name-based lookup
//! reaches (computed values, fields of owners with no member table, lensed
//! sub-state). The owner is recovered from the handle by downcast; applying
//! the binding to an owner of a different type is simply dead.
//!
//! Because there is no property to key change events on, notification works
//! one of two ways:
//!
//! - With a **property-name hint** ([`with_property_hint`]), registrations
//!   join structured notification under that name, exactly as a property
//!   binding would.
//! - Without a hint, registrations land under a per-instance synthetic key
//!   that no structured event ever matches; they fire only when owner-side
//!   code calls [`notify_changed`].
//!
//! [`with_property_hint`]: DelegateBinding::with_property_hint
//! [`notify_changed`]: DelegateBinding::notify_changed

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use weft_core::object::ObjectHandle;
use weft_core::value::BindingValue;

use crate::binding::{BindingCore, ChangeHandler, ChangeToken, IndirectBinding};
use crate::bridge;

/// Source of per-instance synthetic event keys.
static NEXT_DELEGATE_ID: AtomicU64 = AtomicU64::new(0);

/// Binding through caller-supplied `get`/`set` closures.
///
/// Clones share the same accessors *and* the same event identity: a clone
/// kept by the owner can [`notify_changed`] registrations made through the
/// binding handed to a consumer.
///
/// [`notify_changed`]: DelegateBinding::notify_changed
pub struct DelegateBinding<S, T> {
    get: Rc<dyn Fn(&S) -> T>,
    set: Option<Rc<dyn Fn(&mut S, T)>>,
    hint: Option<String>,
    synthetic_key: Rc<str>,
}

impl<S, T> Clone for DelegateBinding<S, T> {
    fn clone(&self) -> Self {
        Self {
            get: Rc::clone(&self.get),
            set: self.set.clone(),
            hint: self.hint.clone(),
            synthetic_key: Rc::clone(&self.synthetic_key),
        }
    }
}

impl<S: 'static, T: BindingValue> DelegateBinding<S, T> {
    /// A read-only delegate binding.
    pub fn new(get: impl Fn(&S) -> T + 'static) -> Self {
        let id = NEXT_DELEGATE_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            get: Rc::new(get),
            set: None,
            hint: None,
            synthetic_key: format!("#delegate{id}").into(),
        }
    }

    /// Attach a write accessor.
    #[must_use]
    pub fn with_setter(mut self, set: impl Fn(&mut S, T) + 'static) -> Self {
        self.set = Some(Rc::new(set));
        self
    }

    /// Attach a property-name hint used to match structured-notification
    /// events to this binding.
    #[must_use]
    pub fn with_property_hint(mut self, name: impl Into<String>) -> Self {
        self.hint = Some(name.into());
        self
    }

    /// The name change registrations are keyed under.
    fn event_name(&self) -> &str {
        self.hint.as_deref().unwrap_or(&self.synthetic_key)
    }

    /// Explicitly fire change notification for this binding on `owner`.
    ///
    /// For hinted bindings this is equivalent to
    /// [`notify_property_changed`](crate::binding::notify_property_changed)
    /// with the hint name; for unhinted ones it is the *only* signal path.
    pub fn notify_changed(&self, owner: &ObjectHandle) {
        bridge::notify(owner, self.event_name());
    }

    /// Erase into the reusable binding description. The delegate itself
    /// stays usable (clone semantics), which is how owner-side code keeps a
    /// handle for [`notify_changed`].
    ///
    /// [`notify_changed`]: DelegateBinding::notify_changed
    #[must_use]
    pub fn binding(&self) -> IndirectBinding<T> {
        IndirectBinding::from_core(Rc::new(self.clone()))
    }
}

impl<S, T> fmt::Debug for DelegateBinding<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateBinding")
            .field("writable", &self.set.is_some())
            .field("hint", &self.hint)
            .finish()
    }
}

impl<S: 'static, T: BindingValue> BindingCore<T> for DelegateBinding<S, T> {
    fn load(&self, owner: &ObjectHandle) -> T {
        let object = owner.borrow();
        match object.as_any().downcast_ref::<S>() {
            Some(typed) => (self.get)(typed),
            None => T::default(),
        }
    }

    fn store(&self, owner: &ObjectHandle, value: T) {
        let Some(set) = &self.set else { return };
        let mut object = owner.borrow_mut();
        if let Some(typed) = object.as_any_mut().downcast_mut::<S>() {
            set(typed, value);
        }
    }

    fn watch(&self, owner: &ObjectHandle, handler: &ChangeHandler) -> ChangeToken {
        bridge::add(owner, self.event_name(), handler)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{self, handler};
    use std::any::Any;
    use std::cell::Cell;
    use weft_core::value::Value;

    /// An owner with no member table at all: only delegates can reach its
    /// state.
    struct Opaque {
        score: i64,
    }

    impl weft_core::object::PropertyObject for Opaque {
        fn member(&self, _: &str) -> Option<Value> {
            None
        }
        fn set_member(&mut self, _: &str, _: Value) -> bool {
            false
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn score_binding() -> DelegateBinding<Opaque, i64> {
        binding::delegate(|o: &Opaque| o.score).with_setter(|o: &mut Opaque, v| o.score = v)
    }

    #[test]
    fn closure_round_trip() {
        let owner = ObjectHandle::new(Opaque { score: 1 });
        let delegate = score_binding();
        let b = delegate.binding();
        assert_eq!(b.get_value(&owner), 1);
        b.set_value(&owner, 9);
        assert_eq!(b.get_value(&owner), 9);
    }

    #[test]
    fn read_only_delegate_swallows_writes() {
        let owner = ObjectHandle::new(Opaque { score: 1 });
        let b = binding::delegate(|o: &Opaque| o.score).binding();
        b.set_value(&owner, 9);
        assert_eq!(b.get_value(&owner), 1);
    }

    #[test]
    fn wrong_owner_type_is_dead() {
        let owner = weft_core::object::DynamicObject::new().into_handle();
        let b = score_binding().binding();
        assert_eq!(b.get_value(&owner), 0);
        b.set_value(&owner, 9);
        assert_eq!(b.get_value(&owner), 0);
    }

    #[test]
    fn unhinted_fires_only_on_explicit_notify() {
        let owner = ObjectHandle::new(Opaque { score: 1 });
        let delegate = score_binding();
        let b = delegate.binding();

        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let h = handler(move |_| count_clone.set(count_clone.get() + 1));
        let token = b.add_value_changed(&owner, &h);

        // Writes alone do not signal; the owner has no ambient source.
        b.set_value(&owner, 2);
        assert_eq!(count.get(), 0);

        delegate.notify_changed(&owner);
        assert_eq!(count.get(), 1);

        b.remove_value_changed(token);
        delegate.notify_changed(&owner);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn distinct_unhinted_delegates_do_not_cross_fire() {
        let owner = ObjectHandle::new(Opaque { score: 1 });
        let first = score_binding();
        let second = score_binding();

        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let h = handler(move |_| count_clone.set(count_clone.get() + 1));
        let _token = first.binding().add_value_changed(&owner, &h);

        second.notify_changed(&owner);
        assert_eq!(count.get(), 0);
        first.notify_changed(&owner);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn hinted_delegate_joins_structured_notification() {
        let owner = weft_core::object::DynamicObject::new()
            .with("Score", 1i64)
            .into_handle();
        let b = binding::delegate(|o: &weft_core::object::DynamicObject| {
            o.len() as i64 // arbitrary computed read
        })
        .with_property_hint("Score")
        .binding();

        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let h = handler(move |_| count_clone.set(count_clone.get() + 1));
        let _token = b.add_value_changed(&owner, &h);

        // A structured event for the hinted name reaches the delegate.
        binding::property::<i64>("Score").set_value(&owner, 2);
        assert_eq!(count.get(), 1);
    }
}
