#![forbid(unsafe_code)]

//! The abstract binding contract and the factory surface.
//!
//! A binding is a typed, reusable reference to "a value somewhere": it can
//! read the value relative to an owner, write it back, and register for
//! change notification — all without being tied to any particular owner
//! instance. [`IndirectBinding<T>`] is that description; scope it to one
//! owner with [`ObjectBinding`](crate::object_binding::ObjectBinding), or
//! reuse it across many (every row of a list column shares one).
//!
//! # Invariants
//!
//! 1. `get_value` on a structurally dead binding returns `T::default()`;
//!    `set_value` is a no-op. Neither ever fails.
//! 2. Each `add_value_changed` call creates an independent registration,
//!    even for the same handler; each is removable independently by its
//!    token.
//! 3. A [`ChangeToken`] is inert after removal; removing it twice is a
//!    no-op, and no signal is delivered through it after removal.
//!
//! # Factories
//!
//! The `binding::` free functions are the construction surface:
//! [`property`], [`try_property`], [`delegate`], [`add_property_event`],
//! [`remove_property_event`], [`remove_property_event_for`],
//! [`notify_property_changed`]. They are stateless; there is no engine
//! object to construct.

use std::fmt;
use std::rc::Rc;

use weft_core::object::ObjectHandle;
use weft_core::path::{PathError, PropertyPath};
use weft_core::value::BindingValue;

use crate::bridge;
use crate::child::{ChildCore, CompositeState, ParentLink};
use crate::delegate::DelegateBinding;
use crate::object_binding::ObjectBinding;
use crate::property::PropertyBinding;

/// Event payload delivered to change handlers.
pub struct PropertyChange {
    /// The object whose property changed (for composed chains, the object
    /// at the level that fired).
    pub owner: ObjectHandle,
    /// Name of the property that changed at that level.
    pub property: String,
}

impl fmt::Debug for PropertyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChange")
            .field("owner", &self.owner)
            .field("property", &self.property)
            .finish()
    }
}

/// A change handler. Handlers are compared by `Rc` identity: registering
/// one handler value twice creates two removable registrations of the
/// *same* handler, which is what the handler-only removal form keys on.
pub type ChangeHandler = Rc<dyn Fn(&PropertyChange)>;

/// Wrap a closure as a [`ChangeHandler`].
pub fn handler(f: impl Fn(&PropertyChange) + 'static) -> ChangeHandler {
    Rc::new(f)
}

/// Handler identity: data-pointer equality.
pub(crate) fn same_handler(a: &ChangeHandler, b: &ChangeHandler) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Object-safe core implemented by each binding kind.
///
/// `load`/`store` are the dead-safe accessors; `watch` registers a change
/// handler and returns a token that detaches it. `intermediate` is the
/// composition hook: the owner the next link in a chain operates on.
pub(crate) trait BindingCore<T: BindingValue> {
    fn load(&self, owner: &ObjectHandle) -> T;

    fn store(&self, owner: &ObjectHandle, value: T);

    fn intermediate(&self, owner: &ObjectHandle) -> Option<ObjectHandle> {
        self.load(owner).into_value().as_object()
    }

    fn watch(&self, owner: &ObjectHandle, handler: &ChangeHandler) -> ChangeToken;
}

/// Handle for one change registration.
///
/// Removal is explicit (`remove_value_changed` /
/// [`remove_property_event`]); dropping a token does *not* detach it, so a
/// token can be stored, moved, or forgotten without silently killing the
/// subscription. `Removed` is terminal: a removed token never delivers
/// another signal, even for upstream events already in flight.
pub struct ChangeToken {
    inner: TokenInner,
}

pub(crate) enum TokenInner {
    /// Registration against a dead path; never fires, removal is a no-op.
    Dead,
    Bridge(bridge::BridgeToken),
    Composite(Rc<CompositeState>),
}

impl ChangeToken {
    pub(crate) fn dead() -> Self {
        Self {
            inner: TokenInner::Dead,
        }
    }

    pub(crate) fn from_bridge(token: bridge::BridgeToken) -> Self {
        Self {
            inner: TokenInner::Bridge(token),
        }
    }

    pub(crate) fn from_composite(state: Rc<CompositeState>) -> Self {
        Self {
            inner: TokenInner::Composite(state),
        }
    }

    /// Whether this token was registered against a dead path and can never
    /// fire.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        matches!(self.inner, TokenInner::Dead)
    }

    /// Detach every registration this token covers. Idempotent.
    pub(crate) fn detach(&self) {
        match &self.inner {
            TokenInner::Dead => {}
            TokenInner::Bridge(token) => bridge::remove(token),
            TokenInner::Composite(state) => state.detach(),
        }
    }
}

impl fmt::Debug for ChangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.inner {
            TokenInner::Dead => "dead",
            TokenInner::Bridge(_) => "bridge",
            TokenInner::Composite(_) => "composite",
        };
        f.debug_struct("ChangeToken").field("kind", &kind).finish()
    }
}

/// A binding description not yet tied to an owner instance.
///
/// Cheap to clone (clones share the underlying description) and reusable
/// across any number of owners.
pub struct IndirectBinding<T: BindingValue> {
    pub(crate) core: Rc<dyn BindingCore<T>>,
}

impl<T: BindingValue> Clone for IndirectBinding<T> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T: BindingValue> fmt::Debug for IndirectBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndirectBinding").finish_non_exhaustive()
    }
}

impl<T: BindingValue> IndirectBinding<T> {
    pub(crate) fn from_core(core: Rc<dyn BindingCore<T>>) -> Self {
        Self { core }
    }

    /// Read the bound value relative to `owner`. Dead bindings read as
    /// `T::default()`.
    #[must_use]
    pub fn get_value(&self, owner: &ObjectHandle) -> T {
        self.core.load(owner)
    }

    /// Write the bound value relative to `owner`. Dead bindings swallow the
    /// write.
    pub fn set_value(&self, owner: &ObjectHandle, value: T) {
        self.core.store(owner, value);
    }

    /// Register `handler` for "the value may have changed" signals on
    /// `owner`.
    ///
    /// Each call creates an independent registration; registering the same
    /// handler twice yields two tokens, each removable on its own.
    pub fn add_value_changed(&self, owner: &ObjectHandle, handler: &ChangeHandler) -> ChangeToken {
        self.core.watch(owner, handler)
    }

    /// Remove one registration. Consumes the token; removing an
    /// already-removed or dead token is a no-op.
    pub fn remove_value_changed(&self, token: ChangeToken) {
        token.detach();
    }

    /// Compose with a binding scoped to this binding's value: the result
    /// reads `child` relative to whatever object this binding currently
    /// yields, and its subscriptions follow the intermediate as it is
    /// replaced.
    #[must_use]
    pub fn child<U: BindingValue>(&self, child: &IndirectBinding<U>) -> IndirectBinding<U> {
        IndirectBinding::from_core(Rc::new(ChildCore::new(
            Rc::new(ParentLink::new(Rc::clone(&self.core))),
            Rc::clone(&child.core),
        )))
    }

    /// Scope this description to one owner.
    #[must_use]
    pub fn bind_to(&self, owner: &ObjectHandle) -> ObjectBinding<T> {
        ObjectBinding::new(owner.clone(), self.clone())
    }
}

// ---------------------------------------------------------------------------
// Factory surface
// ---------------------------------------------------------------------------

/// Binding to a named or dotted property path.
///
/// # Panics
///
/// Panics on malformed path syntax (empty or whitespace segments) — that is
/// a programming mistake, caught at construction. Use [`try_property`] when
/// the path comes from data.
#[must_use]
pub fn property<T: BindingValue>(path: &str) -> IndirectBinding<T> {
    match try_property(path) {
        Ok(binding) => binding,
        Err(error) => panic!("invalid binding path {path:?}: {error}"),
    }
}

/// Fallible form of [`property`].
pub fn try_property<T: BindingValue>(path: &str) -> Result<IndirectBinding<T>, PathError> {
    Ok(PropertyBinding::new(PropertyPath::parse(path)?).into_binding())
}

/// Binding through caller-supplied accessors over a concrete owner type.
///
/// Returns the [`DelegateBinding`] builder; attach a setter or a
/// property-name hint, then call
/// [`binding()`](crate::delegate::DelegateBinding::binding).
pub fn delegate<S: 'static, T: BindingValue>(
    get: impl Fn(&S) -> T + 'static,
) -> DelegateBinding<S, T> {
    DelegateBinding::new(get)
}

/// Register `handler` for changes of `path` on `owner`, without building a
/// full binding. For a dotted path the registration lands on the object
/// owning the final segment, resolved now.
///
/// # Panics
///
/// Panics on malformed path syntax, like [`property`].
pub fn add_property_event(
    owner: &ObjectHandle,
    path: &str,
    handler: &ChangeHandler,
) -> ChangeToken {
    let parsed = match PropertyPath::parse(path) {
        Ok(parsed) => parsed,
        Err(error) => panic!("invalid binding path {path:?}: {error}"),
    };
    PropertyBinding::<weft_core::value::Value>::new(parsed).watch(owner, handler)
}

/// Remove one registration made by [`add_property_event`] (or any
/// `add_value_changed`). Consumes the token; no-op if already removed.
pub fn remove_property_event(token: ChangeToken) {
    token.detach();
}

/// Remove **every** registration of `handler` on `owner`, across all
/// property names.
///
/// This is deliberately imprecise: when one handler is registered for
/// several distinct properties of the same owner, this removes all of
/// them. The behavior is an artifact of multicast-event semantics in this
/// design's lineage and is kept intentionally — use the token returned at
/// registration for precise removal.
pub fn remove_property_event_for(owner: &ObjectHandle, handler: &ChangeHandler) {
    bridge::remove_handler(owner, handler);
}

/// Explicitly report that `property` changed on `owner`.
///
/// The trigger path for owners without structured notification; for owners
/// with a [`ChangeEmitter`](weft_core::notify::ChangeEmitter) this raises
/// the emitter so all of its subscribers (not only bindings) hear it.
pub fn notify_property_changed(owner: &ObjectHandle, property: &str) {
    bridge::notify(owner, property);
}

// ---------------------------------------------------------------------------
// Macros
// ---------------------------------------------------------------------------

/// Record a property access as a dotted path string at compile time.
///
/// `property_path!(Child.Width)` expands to `"Child.Width"`; by
/// construction the macro form and the hand-written string resolve to the
/// identical [`PropertyPath`].
#[macro_export]
macro_rules! property_path {
    ($first:ident $(. $rest:ident)*) => {
        concat!(stringify!($first) $(, ".", stringify!($rest))*)
    };
}

/// Build a property binding from a recorded property access.
///
/// `bind_path!(Child.Width)` is `binding::property(property_path!(Child.Width))`.
/// The value type is inferred from the use site:
///
/// ```ignore
/// let width: IndirectBinding<i64> = bind_path!(Child.Width);
/// ```
#[macro_export]
macro_rules! bind_path {
    ($first:ident $(. $rest:ident)*) => {
        $crate::binding::property($crate::property_path!($first $(. $rest)*))
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use weft_core::object::DynamicObject;
    use weft_core::value::Value;

    #[test]
    fn property_round_trip() {
        let owner = DynamicObject::new().with("Width", 10i64).into_handle();
        let width = property::<i64>("Width");
        assert_eq!(width.get_value(&owner), 10);
        width.set_value(&owner, 42);
        assert_eq!(width.get_value(&owner), 42);
    }

    #[test]
    fn indirect_binding_reusable_across_owners() {
        let a = DynamicObject::new().with("Width", 1i64).into_handle();
        let b = DynamicObject::new().with("Width", 2i64).into_handle();
        let width = property::<i64>("Width");
        assert_eq!(width.get_value(&a), 1);
        assert_eq!(width.get_value(&b), 2);
    }

    #[test]
    fn dead_binding_reads_default_and_swallows_writes() {
        let owner = DynamicObject::new().into_handle();
        let missing = property::<i64>("Missing");
        assert_eq!(missing.get_value(&owner), 0);
        missing.set_value(&owner, 5);
        assert_eq!(missing.get_value(&owner), 0);
    }

    #[test]
    fn try_property_reports_malformed_syntax() {
        assert!(try_property::<i64>("A..B").is_err());
        assert!(try_property::<i64>("").is_err());
        assert!(try_property::<i64>("A.B").is_ok());
    }

    #[test]
    #[should_panic(expected = "invalid binding path")]
    fn property_panics_on_malformed_syntax() {
        let _ = property::<i64>(".Width");
    }

    #[test]
    fn macro_path_matches_string_path() {
        assert_eq!(property_path!(Child.Width), "Child.Width");
        assert_eq!(property_path!(Width), "Width");

        let child = DynamicObject::new().with("Width", 7i64).into_handle();
        let owner = DynamicObject::new().with("Child", child).into_handle();
        let by_macro: IndirectBinding<i64> = bind_path!(Child.Width);
        let by_string = property::<i64>("Child.Width");
        assert_eq!(by_macro.get_value(&owner), by_string.get_value(&owner));
        assert_eq!(by_macro.get_value(&owner), 7);
    }

    #[test]
    fn add_property_event_fires_on_change() {
        let owner = DynamicObject::new().with("Width", 1i64).into_handle();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let h = handler(move |_| count_clone.set(count_clone.get() + 1));

        let token = add_property_event(&owner, "Width", &h);
        property::<i64>("Width").set_value(&owner, 2);
        assert_eq!(count.get(), 1);

        remove_property_event(token);
        property::<i64>("Width").set_value(&owner, 3);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn add_property_event_on_dead_path_is_inert() {
        let owner = DynamicObject::new().into_handle();
        let h = handler(|_| panic!("dead paths never fire"));
        let token = add_property_event(&owner, "Missing.Deep", &h);
        assert!(token.is_dead());
        remove_property_event(token);
    }

    #[test]
    fn change_event_payload_names_owner_and_property() {
        let owner = DynamicObject::new().with("Width", 1i64).into_handle();
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let owner_probe = owner.clone();
        let h = handler(move |change| {
            assert!(change.owner.ptr_eq(&owner_probe));
            seen_clone.borrow_mut().push(change.property.clone());
        });

        let _token = add_property_event(&owner, "Width", &h);
        property::<i64>("Width").set_value(&owner, 2);
        assert_eq!(*seen.borrow(), vec!["Width".to_owned()]);
    }

    #[test]
    fn notify_property_changed_without_emitter() {
        struct Plain;
        impl weft_core::object::PropertyObject for Plain {
            fn member(&self, _: &str) -> Option<Value> {
                Some(Value::Int(1))
            }
            fn set_member(&mut self, _: &str, _: Value) -> bool {
                false
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }
        }

        let owner = weft_core::object::ObjectHandle::new(Plain);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let h = handler(move |_| count_clone.set(count_clone.get() + 1));
        let _token = add_property_event(&owner, "Anything", &h);

        // No emitter, so only the explicit trigger fires.
        notify_property_changed(&owner, "Anything");
        assert_eq!(count.get(), 1);
        notify_property_changed(&owner, "Other");
        assert_eq!(count.get(), 1, "unrelated property does not fire");
    }
}
