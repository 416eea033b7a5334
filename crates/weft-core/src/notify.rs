#![forbid(unsafe_code)]

//! Structured change notification: "this named property changed."
//!
//! # Design
//!
//! [`ChangeEmitter`] is the owner-side half of the notification contract. An
//! owner that carries one (and returns it from
//! [`PropertyObject::emitter`](crate::object::PropertyObject::emitter)) is
//! *structured-notification-capable*: whenever one of its properties
//! changes, the emitter reports the property name to every live subscriber,
//! in registration order.
//!
//! Subscribers are held as `Weak` callbacks; the strong side lives in the
//! [`EmitterSubscription`] guard handed back from [`subscribe`]. Dropping
//! the guard unsubscribes, and dead entries are pruned lazily on the next
//! [`raise`].
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. No interior borrow is held while a callback runs; callbacks may freely
//!    subscribe, unsubscribe, or raise again (re-entrant raises are
//!    delivered, not deduplicated).
//! 3. A dropped [`EmitterSubscription`] never fires again.
//!
//! # Failure Modes
//!
//! - **Raise under `borrow_mut`**: an owner that calls [`raise`] while its
//!   own `RefCell` is mutably borrowed will panic as soon as a callback
//!   reads the owner back. Mutation entry points should release the borrow
//!   first, or use [`callbacks`] to snapshot and invoke afterwards.
//!
//! [`subscribe`]: ChangeEmitter::subscribe
//! [`raise`]: ChangeEmitter::raise
//! [`callbacks`]: ChangeEmitter::callbacks

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A subscriber callback stored as a strong `Rc` in the guard, handed to
/// the emitter as `Weak`.
type NotifyRc = Rc<dyn Fn(&str)>;
type NotifyWeak = Weak<dyn Fn(&str)>;

/// Owner-side event source reporting changed property names.
#[derive(Default)]
pub struct ChangeEmitter {
    subscribers: RefCell<Vec<NotifyWeak>>,
}

impl ChangeEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to property-change reports.
    ///
    /// The callback receives the changed property's name. Dropping the
    /// returned guard unsubscribes it.
    pub fn subscribe(&self, callback: impl Fn(&str) + 'static) -> EmitterSubscription {
        let strong: NotifyRc = Rc::new(callback);
        self.subscribers.borrow_mut().push(Rc::downgrade(&strong));
        EmitterSubscription { _guard: strong }
    }

    /// Report that `property` changed, invoking all live subscribers.
    pub fn raise(&self, property: &str) {
        for callback in self.callbacks() {
            callback(property);
        }
    }

    /// Snapshot the live callbacks, pruning dead ones.
    ///
    /// Mutation entry points use this to collect subscribers while the owner
    /// is still borrowed, then invoke them after the borrow is released.
    #[must_use]
    pub fn callbacks(&self) -> Vec<NotifyRc> {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|weak| weak.strong_count() > 0);
        subscribers.iter().filter_map(Weak::upgrade).collect()
    }

    /// Number of registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl fmt::Debug for ChangeEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeEmitter")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// RAII guard for an emitter subscription.
///
/// Holds the only strong reference to the callback; dropping it makes the
/// emitter's `Weak` entry fail to upgrade, so the callback never fires
/// again (the entry itself is pruned on the next raise).
pub struct EmitterSubscription {
    _guard: NotifyRc,
}

impl fmt::Debug for EmitterSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterSubscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
