#![forbid(unsafe_code)]

//! Property paths and resolution against a live object graph.
//!
//! A [`PropertyPath`] is an ordered sequence of property-name segments,
//! parsed from a dotted string (`"Child.Width"`). Parsing validates syntax:
//! empty or whitespace-only segments are programmer mistakes and are
//! rejected at construction time with a [`PathError`]. Resolution, in
//! contrast, never fails: a path that does not resolve against a given
//! owner is *dead*, and dead paths read as [`Value::Null`] and swallow
//! writes.
//!
//! Per-segment lookup is layered:
//!
//! 1. Structured metadata — if the owner publishes
//!    [`descriptors`](crate::object::PropertyObject::descriptors), the
//!    segment is looked up there first.
//! 2. Member lookup — otherwise the owner's own
//!    [`member`](crate::object::PropertyObject::member) /
//!    [`set_member`](crate::object::PropertyObject::set_member) decide.
//!
//! Multi-segment paths resolve left to right; any intermediate that is
//! absent, `Null`, or not an object makes the remainder dead for that
//! access.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown segment | No descriptor, no member | Dead: `Null` read, inert write |
//! | Null intermediate | Optional link unset | Remainder dead for this access |
//! | Non-object intermediate | Path descends into a scalar | Remainder dead |
//! | Empty/whitespace segment | Malformed input string | [`PathError`] at parse time |

use std::fmt;

#[cfg(feature = "tracing")]
use tracing::trace;

use crate::object::{ObjectHandle, PropertyObject};
use crate::value::Value;

/// Errors from parsing a dotted path string.
///
/// These are construction-time programmer errors; resolution itself never
/// produces an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The whole path was empty or whitespace.
    Empty,
    /// A segment between dots was empty or whitespace.
    EmptySegment {
        /// Zero-based segment position.
        index: usize,
    },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "binding path is empty"),
            Self::EmptySegment { index } => {
                write!(f, "binding path has an empty segment at position {index}")
            }
        }
    }
}

impl std::error::Error for PathError {}

/// A validated, ordered sequence of property-name segments.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    /// Parse a dotted path string.
    ///
    /// Segments are taken verbatim (no trimming); an empty or
    /// whitespace-only segment is a syntax error.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.trim().is_empty() {
            return Err(PathError::Empty);
        }
        let segments: Vec<String> = path.split('.').map(str::to_owned).collect();
        for (index, segment) in segments.iter().enumerate() {
            if segment.trim().is_empty() {
                return Err(PathError::EmptySegment { index });
            }
        }
        Ok(Self { segments })
    }

    /// The path's segments, in order. Never empty.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments. At least 1.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// The final segment: the property the path ultimately names.
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.segments.last().expect("paths have at least one segment")
    }

    /// All segments but the last.
    #[must_use]
    pub fn parent_segments(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl fmt::Debug for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyPath({self})")
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Two-tier single-segment read.
fn segment_get(owner: &ObjectHandle, name: &str) -> Option<Value> {
    let object = owner.borrow();
    if let Some(descriptors) = object.descriptors()
        && let Some(descriptor) = descriptors.iter().find(|d| d.name() == name)
    {
        return Some(descriptor.read(object.as_any()));
    }
    object.member(name)
}

/// Two-tier single-segment write. Returns whether the stored value changed.
fn segment_set(owner: &ObjectHandle, name: &str, value: Value) -> bool {
    let mut object = owner.borrow_mut();
    if let Some(descriptors) = object.descriptors()
        && let Some(descriptor) = descriptors.iter().find(|d| d.name() == name)
    {
        return descriptor.write(object.as_any_mut(), value);
    }
    object.set_member(name, value)
}

/// Resolve the owner of the path's leaf segment: the object reached by
/// walking every segment but the last. `None` when any hop is dead.
///
/// For a single-segment path this is the starting owner itself.
#[must_use]
pub fn leaf_owner(owner: &ObjectHandle, path: &PropertyPath) -> Option<ObjectHandle> {
    let mut current = owner.clone();
    for segment in path.parent_segments() {
        let next = segment_get(&current, segment)?.as_object()?;
        current = next;
    }
    Some(current)
}

/// Read the value at `path` relative to `owner`.
///
/// Dead paths read as [`Value::Null`]; this never fails.
#[must_use]
pub fn get_at(owner: &ObjectHandle, path: &PropertyPath) -> Value {
    match leaf_owner(owner, path) {
        Some(leaf) => segment_get(&leaf, path.leaf()).unwrap_or(Value::Null),
        None => Value::Null,
    }
}

/// Write `value` at `path` relative to `owner`.
///
/// Returns whether a write happened and the stored value changed. Dead
/// paths are a silent no-op. When the leaf owner carries a
/// [`ChangeEmitter`](crate::notify::ChangeEmitter), a changing write raises
/// structured notification for the leaf property after the owner borrow is
/// released, so subscribers may freely read the owner back.
pub fn set_at(owner: &ObjectHandle, path: &PropertyPath, value: Value) -> bool {
    let Some(leaf) = leaf_owner(owner, path) else {
        #[cfg(feature = "tracing")]
        trace!(path = %path, "write to dead path dropped");
        return false;
    };
    let changed = segment_set(&leaf, path.leaf(), value);
    if changed {
        // Snapshot subscribers under the borrow, invoke after releasing it.
        let callbacks = {
            let object = leaf.borrow();
            object.emitter().map(|emitter| emitter.callbacks()).unwrap_or_default()
        };
        for callback in callbacks {
            callback(path.leaf());
        }
    }
    changed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
