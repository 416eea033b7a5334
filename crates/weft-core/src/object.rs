#![forbid(unsafe_code)]

//! The owner contract: what a bindable object looks like.
//!
//! # Design
//!
//! Bindings never require owners to derive from a base class or implement a
//! notification interface. The only contract is [`PropertyObject`], a
//! capability trait with two mandatory operations (member lookup by name,
//! member write by name) and two optional capabilities:
//!
//! - [`PropertyObject::descriptors`] — structured property metadata, for
//!   objects whose visible property set is computed at runtime rather than
//!   fixed in the type (a dynamic schema). The resolver consults this tier
//!   first.
//! - [`PropertyObject::emitter`] — structured change notification, an event
//!   source reporting changed property names. Owners without it can still be
//!   bound; their handlers just never receive ambient signals.
//!
//! Owners live behind [`ObjectHandle`], a shared single-threaded handle
//! (`Rc<RefCell<dyn PropertyObject>>`). Cloning a handle aliases the same
//! object; identity is pointer identity, exposed as [`ObjectId`].
//!
//! # Invariants
//!
//! 1. `ObjectHandle::id()` is stable for the lifetime of the object and
//!    unique among simultaneously-live objects. After the object is dropped
//!    the address may be reused; long-lived registries must therefore hold
//!    [`WeakObjectHandle`]s and revalidate on access.
//! 2. A missing member reads as `None`/write-returns-`false`; it is never an
//!    error. This is the dominant, expected case for optional bindings.
//! 3. `set_member` returns `true` only when a write happened and the stored
//!    value actually changed (writes of an equal value are no-ops).

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::notify::ChangeEmitter;
use crate::value::Value;

/// Accessor record for one named property in a structured schema.
///
/// The closures receive the owner type-erased as `Any`; a descriptor built
/// for one owner type simply fails to read (returns [`Value::Null`]) when
/// applied to another.
pub struct PropertyDescriptor {
    name: String,
    read: Rc<dyn Fn(&dyn Any) -> Value>,
    write: Option<Rc<dyn Fn(&mut dyn Any, Value) -> bool>>,
}

impl PropertyDescriptor {
    /// A read-only descriptor.
    pub fn new(name: impl Into<String>, read: impl Fn(&dyn Any) -> Value + 'static) -> Self {
        Self {
            name: name.into(),
            read: Rc::new(read),
            write: None,
        }
    }

    /// Attach a write accessor. The closure returns whether the stored value
    /// changed.
    #[must_use]
    pub fn with_write(mut self, write: impl Fn(&mut dyn Any, Value) -> bool + 'static) -> Self {
        self.write = Some(Rc::new(write));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.write.is_none()
    }

    /// Read the property from `target`.
    #[must_use]
    pub fn read(&self, target: &dyn Any) -> Value {
        (self.read)(target)
    }

    /// Write the property on `target`; returns whether the value changed.
    /// Read-only descriptors return `false`.
    pub fn write(&self, target: &mut dyn Any, value: Value) -> bool {
        match &self.write {
            Some(write) => write(target, value),
            None => false,
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

/// Capability trait implemented by bindable owners.
pub trait PropertyObject: Any {
    /// Look up a member by name. `None` for unknown members.
    fn member(&self, name: &str) -> Option<Value>;

    /// Write a member by name. Returns `true` only when the member exists,
    /// is writable, and the stored value changed. Unknown members are a
    /// silent no-op (`false`), never an error.
    fn set_member(&mut self, name: &str, value: Value) -> bool;

    /// Structured property metadata, when this object computes its property
    /// set at runtime. The resolver consults this before [`member`].
    ///
    /// [`member`]: PropertyObject::member
    fn descriptors(&self) -> Option<Vec<PropertyDescriptor>> {
        None
    }

    /// Structured change notification, when this object reports changed
    /// property names.
    fn emitter(&self) -> Option<&ChangeEmitter> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Pointer identity of a live object.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Shared handle to a bindable owner.
///
/// Cloning aliases the same object. All access is single-threaded and
/// borrow-checked at runtime; holding a borrow across a notification
/// dispatch is the caller's re-entrancy hazard to avoid.
pub struct ObjectHandle {
    inner: Rc<RefCell<dyn PropertyObject>>,
}

impl Clone for ObjectHandle {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl ObjectHandle {
    /// Wrap an owner in a shared handle.
    pub fn new(object: impl PropertyObject) -> Self {
        Self {
            inner: Rc::new(RefCell::new(object)),
        }
    }

    /// Immutably borrow the owner.
    ///
    /// # Panics
    ///
    /// Panics if the owner is currently mutably borrowed.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, dyn PropertyObject> {
        self.inner.borrow()
    }

    /// Mutably borrow the owner.
    ///
    /// # Panics
    ///
    /// Panics if the owner is currently borrowed.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, dyn PropertyObject> {
        self.inner.borrow_mut()
    }

    /// Pointer identity of the owner.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        ObjectId(Rc::as_ptr(&self.inner).cast::<()>() as usize)
    }

    /// Whether two handles alias the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// A non-owning handle; upgrading fails once the owner is dropped.
    #[must_use]
    pub fn downgrade(&self) -> WeakObjectHandle {
        WeakObjectHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle").field("id", &self.id()).finish()
    }
}

/// Non-owning counterpart of [`ObjectHandle`].
///
/// Registries key their per-owner state on [`ObjectId`] but store one of
/// these, so the registry never keeps an owner alive.
#[derive(Clone)]
pub struct WeakObjectHandle {
    inner: Weak<RefCell<dyn PropertyObject>>,
}

impl WeakObjectHandle {
    /// Upgrade to a strong handle, if the owner is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<ObjectHandle> {
        self.inner.upgrade().map(|inner| ObjectHandle { inner })
    }
}

impl fmt::Debug for WeakObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObjectHandle")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// DynamicObject — runtime-schema owner
// ---------------------------------------------------------------------------

/// A map-backed owner whose property set is computed at runtime.
///
/// `DynamicObject` publishes its properties through [`descriptors`], making
/// it the canonical structured-metadata resolution target, and carries a
/// [`ChangeEmitter`] so writes through the resolver produce structured
/// change notifications.
///
/// Properties are declared with [`insert`]; writes to undeclared names are
/// silent no-ops (a dead path is not an invitation to grow the schema).
///
/// [`descriptors`]: PropertyObject::descriptors
/// [`insert`]: DynamicObject::insert
#[derive(Default)]
pub struct DynamicObject {
    values: BTreeMap<String, Value>,
    emitter: ChangeEmitter,
}

impl DynamicObject {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property with an initial value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder form of [`insert`].
    ///
    /// [`insert`]: DynamicObject::insert
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Wrap into a shared handle.
    #[must_use]
    pub fn into_handle(self) -> ObjectHandle {
        ObjectHandle::new(self)
    }

    /// Number of declared properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for DynamicObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicObject")
            .field("properties", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PropertyObject for DynamicObject {
    fn member(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn set_member(&mut self, name: &str, value: Value) -> bool {
        match self.values.get_mut(name) {
            Some(slot) if *slot != value => {
                *slot = value;
                true
            }
            _ => false,
        }
    }

    fn descriptors(&self) -> Option<Vec<PropertyDescriptor>> {
        let descriptors = self
            .values
            .keys()
            .map(|key| {
                let read_key = key.clone();
                let write_key = key.clone();
                PropertyDescriptor::new(key.clone(), move |target: &dyn Any| {
                    target
                        .downcast_ref::<Self>()
                        .and_then(|object| object.values.get(&read_key).cloned())
                        .unwrap_or(Value::Null)
                })
                .with_write(move |target: &mut dyn Any, value| {
                    target
                        .downcast_mut::<Self>()
                        .is_some_and(|object| object.set_member(&write_key, value))
                })
            })
            .collect();
        Some(descriptors)
    }

    fn emitter(&self) -> Option<&ChangeEmitter> {
        Some(&self.emitter)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
