#![forbid(unsafe_code)]

//! Bidirectional synchronization of two direct bindings.
//!
//! A [`DualBinding`] keeps two owner-scoped bindings in step: on creation
//! the target takes the source's value, and afterwards a change on either
//! side is written through to the other (subject to [`UpdateMode`]). A
//! re-entrancy guard breaks the echo: the write-through performed by one
//! direction never triggers the opposite direction in the same dispatch.
//!
//! Detach with [`detach`] or by dropping the `DualBinding`; both remove the
//! underlying registrations, and detaching twice is a no-op.
//!
//! [`detach`]: DualBinding::detach

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use weft_core::value::BindingValue;

use crate::binding::{ChangeToken, handler};
use crate::object_binding::ObjectBinding;

/// Which directions a [`DualBinding`] propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Source and target follow each other.
    #[default]
    TwoWay,
    /// Only source-side changes propagate to the target.
    OneWay,
    /// The target takes the source's value once, at creation; no
    /// registrations are made.
    OneTime,
}

/// Keeps two direct bindings synchronized.
pub struct DualBinding<T: BindingValue> {
    source: ObjectBinding<T>,
    target: ObjectBinding<T>,
    forward: Option<ChangeToken>,
    backward: Option<ChangeToken>,
}

impl<T: BindingValue> DualBinding<T> {
    /// Connect `source` and `target`, syncing the target to the source's
    /// current value.
    #[must_use]
    pub fn new(source: ObjectBinding<T>, target: ObjectBinding<T>, mode: UpdateMode) -> Self {
        target.set_value(source.value());

        let syncing = Rc::new(Cell::new(false));

        let forward = match mode {
            UpdateMode::OneTime => None,
            UpdateMode::OneWay | UpdateMode::TwoWay => {
                let source_side = source.clone();
                let target_side = target.clone();
                let guard = Rc::clone(&syncing);
                Some(source.add_value_changed(&handler(move |_| {
                    if !guard.get() {
                        guard.set(true);
                        target_side.set_value(source_side.value());
                        guard.set(false);
                    }
                })))
            }
        };

        let backward = match mode {
            UpdateMode::OneTime | UpdateMode::OneWay => None,
            UpdateMode::TwoWay => {
                let source_side = source.clone();
                let target_side = target.clone();
                let guard = Rc::clone(&syncing);
                Some(target.add_value_changed(&handler(move |_| {
                    if !guard.get() {
                        guard.set(true);
                        source_side.set_value(target_side.value());
                        guard.set(false);
                    }
                })))
            }
        };

        Self {
            source,
            target,
            forward,
            backward,
        }
    }

    /// Connect in [`UpdateMode::TwoWay`].
    #[must_use]
    pub fn two_way(source: ObjectBinding<T>, target: ObjectBinding<T>) -> Self {
        Self::new(source, target, UpdateMode::TwoWay)
    }

    #[must_use]
    pub fn source(&self) -> &ObjectBinding<T> {
        &self.source
    }

    #[must_use]
    pub fn target(&self) -> &ObjectBinding<T> {
        &self.target
    }

    /// Remove both registrations. Idempotent; also runs on drop.
    pub fn detach(&mut self) {
        if let Some(token) = self.forward.take() {
            self.source.remove_value_changed(token);
        }
        if let Some(token) = self.backward.take() {
            self.target.remove_value_changed(token);
        }
    }
}

impl<T: BindingValue> Drop for DualBinding<T> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<T: BindingValue> fmt::Debug for DualBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DualBinding")
            .field("attached", &(self.forward.is_some() || self.backward.is_some()))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
