#![forbid(unsafe_code)]

//! The change-notification bridge.
//!
//! # Design
//!
//! The bridge turns arbitrary owners plus property names into one uniform
//! "value may have changed" stream. It keeps a thread-local registry keyed
//! by owner identity; each entry holds the owner *weakly*, a list of
//! `(property, seq, handler)` registrations in registration order, and — for
//! owners with structured notification — exactly one upstream subscription
//! to the owner's [`ChangeEmitter`], demultiplexed here by property name.
//! Adding or removing a handler is O(1) amortized: the upstream hookup
//! happens once per owner, not once per handler.
//!
//! Owners without an emitter get no ambient signal; their registrations
//! are retained and fire only through the explicit trigger
//! ([`binding::notify_property_changed`](crate::binding::notify_property_changed)).
//!
//! # Weak-ownership discipline
//!
//! The registry must never be the thing keeping an owner (or the widget
//! holding a binding) alive. Entries therefore store a
//! [`WeakObjectHandle`]; once the caller drops its last strong handle, the
//! entry is unreachable garbage and is pruned lazily on the next add,
//! remove, or dispatch that touches the registry. Explicit removal remains
//! the deterministic path. Because identities are addresses of live
//! allocations, an address can be reused after its owner dies; every
//! registration pass prunes dead entries first, so a recycled address
//! always starts from a fresh entry.
//!
//! # Dispatch semantics
//!
//! Dispatch is synchronous and in registration order. The handler list is
//! snapshotted before the first call (so handlers may re-enter the
//! registry freely), but each handler's registration is revalidated at
//! invoke time: a registration removed mid-dispatch — or a composite
//! subscription already torn down — does not fire, even for events already
//! in flight.
//!
//! [`ChangeEmitter`]: weft_core::notify::ChangeEmitter

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use tracing::trace;

use weft_core::notify::EmitterSubscription;
use weft_core::object::{ObjectHandle, ObjectId, WeakObjectHandle};

use crate::binding::{ChangeHandler, ChangeToken, PropertyChange, same_handler};

/// Identifies one registration: the owner's identity plus a registry-wide
/// sequence number.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BridgeToken {
    owner: ObjectId,
    seq: u64,
}

struct Registration {
    property: String,
    seq: u64,
    handler: ChangeHandler,
}

struct OwnerEntry {
    owner: WeakObjectHandle,
    registrations: SmallVec<[Registration; 2]>,
    /// Keeps the demux callback alive in the owner's emitter. `None` for
    /// owners without structured notification.
    _upstream: Option<EmitterSubscription>,
}

#[derive(Default)]
struct Registry {
    owners: FxHashMap<ObjectId, OwnerEntry>,
    next_seq: u64,
}

thread_local! {
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry::default());
}

/// Register `handler` for `property` on `owner`.
pub(crate) fn add(owner: &ObjectHandle, property: &str, handler: &ChangeHandler) -> ChangeToken {
    let id = owner.id();

    // First registration for this owner hooks its emitter (if any) exactly
    // once. Subscribing touches the owner, not the registry, so it happens
    // outside the registry borrow. Pruning first also retires any stale
    // entry left by a dead owner whose address this one now reuses.
    let needs_entry = REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        prune(&mut registry);
        !registry.owners.contains_key(&id)
    });

    let upstream = if needs_entry {
        let object = owner.borrow();
        object
            .emitter()
            .map(|emitter| emitter.subscribe(move |name: &str| dispatch(id, name)))
    } else {
        None
    };

    REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        registry.next_seq += 1;
        let seq = registry.next_seq;
        let entry = registry.owners.entry(id).or_insert_with(|| OwnerEntry {
            owner: owner.downgrade(),
            registrations: SmallVec::new(),
            _upstream: upstream,
        });
        entry.registrations.push(Registration {
            property: property.to_owned(),
            seq,
            handler: std::rc::Rc::clone(handler),
        });

        #[cfg(feature = "tracing")]
        trace!(owner = ?id, property, seq, "change handler registered");

        ChangeToken::from_bridge(BridgeToken { owner: id, seq })
    })
}

/// Remove the single registration named by `token`.
pub(crate) fn remove(token: &BridgeToken) {
    REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        if let Some(entry) = registry.owners.get_mut(&token.owner) {
            entry.registrations.retain(|r| r.seq != token.seq);
            if entry.registrations.is_empty() {
                // Dropping the entry releases the upstream subscription too.
                registry.owners.remove(&token.owner);
            }
        }
        prune(&mut registry);

        #[cfg(feature = "tracing")]
        trace!(owner = ?token.owner, seq = token.seq, "change handler removed");
    });
}

/// Remove every registration of `handler` on `owner`, across all property
/// names. The intentionally imprecise form; see
/// [`binding::remove_property_event_for`](crate::binding::remove_property_event_for).
pub(crate) fn remove_handler(owner: &ObjectHandle, handler: &ChangeHandler) {
    let id = owner.id();
    REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        if let Some(entry) = registry.owners.get_mut(&id) {
            entry.registrations.retain(|r| !same_handler(&r.handler, handler));
            if entry.registrations.is_empty() {
                registry.owners.remove(&id);
            }
        }
        prune(&mut registry);
    });
}

/// Explicitly report a property change.
///
/// For owners with a [`ChangeEmitter`](weft_core::notify::ChangeEmitter)
/// this raises the emitter (so every emitter subscriber hears it, including
/// this bridge); otherwise it dispatches directly to registrations here.
pub(crate) fn notify(owner: &ObjectHandle, property: &str) {
    let callbacks = {
        let object = owner.borrow();
        object.emitter().map(|emitter| emitter.callbacks())
    };
    match callbacks {
        Some(callbacks) => {
            for callback in callbacks {
                callback(property);
            }
        }
        None => dispatch(owner.id(), property),
    }
}

/// Number of live owner entries, after pruning dead ones.
///
/// Diagnostic; lifetime tests use it to show that dropping an owner's last
/// strong handle leaves nothing behind.
#[must_use]
pub fn owner_entry_count() -> usize {
    REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        prune(&mut registry);
        registry.owners.len()
    })
}

/// Deliver `property` to the matching registrations of owner `id`.
fn dispatch(id: ObjectId, property: &str) {
    // Snapshot outside the borrow so handlers may re-enter the registry.
    let Some((owner, pending)) = REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        let entry = registry.owners.get(&id)?;
        let Some(owner) = entry.owner.upgrade() else {
            registry.owners.remove(&id);
            return None;
        };
        let pending: Vec<(u64, ChangeHandler)> = entry
            .registrations
            .iter()
            .filter(|r| r.property == property)
            .map(|r| (r.seq, std::rc::Rc::clone(&r.handler)))
            .collect();
        Some((owner, pending))
    }) else {
        return;
    };

    #[cfg(feature = "tracing")]
    trace!(owner = ?id, property, handlers = pending.len(), "dispatching change");

    for (seq, handler) in pending {
        // Revalidate: a registration removed mid-dispatch must not fire.
        let still_registered = REGISTRY.with(|registry| {
            registry
                .borrow()
                .owners
                .get(&id)
                .is_some_and(|entry| entry.registrations.iter().any(|r| r.seq == seq))
        });
        if !still_registered {
            continue;
        }
        handler(&PropertyChange {
            owner: owner.clone(),
            property: property.to_owned(),
        });
    }
}

/// Drop entries whose owner is gone.
fn prune(registry: &mut Registry) {
    registry.owners.retain(|_, entry| entry.owner.upgrade().is_some());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
