#![forbid(unsafe_code)]

//! Dynamically-typed property values.
//!
//! [`Value`] is what flows through the untyped half of the binding engine:
//! property reads produce a `Value`, property writes consume one. The typed
//! binding surface converts at the edges via [`BindingValue`], so a dead
//! path (which reads as [`Value::Null`]) collapses to `T::default()` instead
//! of an error.
//!
//! Typing is strict per variant: a `Bool` never reads as an `Int`, a `Str`
//! never parses into a number. The only cross-variant conversion is the
//! documented numeric widening in the `BindingValue` impls (`Int` widens to
//! `f64`).

use std::fmt;

use crate::object::ObjectHandle;

/// A dynamically-typed property value.
///
/// `Object` values compare by handle identity, not by structural equality;
/// two distinct objects with identical contents are not equal.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Absent value; also what a dead path reads as.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Object(ObjectHandle),
}

impl Value {
    /// Whether this is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The object handle, when this value holds one.
    ///
    /// This is the hook child-binding composition uses to descend into an
    /// intermediate object; every other variant (including `Null`) yields
    /// `None`, which downstream code treats as a dead remainder.
    #[must_use]
    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Self::Object(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Object(_) => "object",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Object(handle) => write!(f, "object@{:?}", handle.id()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<ObjectHandle> for Value {
    fn from(v: ObjectHandle) -> Self {
        Self::Object(v)
    }
}

/// Conversion edge between the typed binding surface and [`Value`].
///
/// `from_value` returns `None` on a type mismatch; callers in the binding
/// layer fall back to `T::default()`, which is how dead paths read as the
/// type's default without ever raising an error.
pub trait BindingValue: Clone + Default + 'static {
    /// Convert into the dynamic representation.
    fn into_value(self) -> Value;
    /// Convert from the dynamic representation; `None` on type mismatch.
    fn from_value(value: Value) -> Option<Self>;
}

impl BindingValue for Value {
    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl BindingValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl BindingValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_int()
    }
}

impl BindingValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_int().and_then(|i| Self::try_from(i).ok())
    }
}

impl BindingValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }

    // Int widens to f64; this is the one cross-variant read.
    fn from_value(value: Value) -> Option<Self> {
        value.as_float()
    }
}

impl BindingValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl BindingValue for Option<ObjectHandle> {
    fn into_value(self) -> Value {
        match self {
            Some(handle) => Value::Object(handle),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(handle) => Some(Some(handle)),
            Value::Null => Some(None),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
