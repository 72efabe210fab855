//! Boundary value representation.
//!
//! [`ScriptValue`] is the tagged representation of every value that crosses
//! the native/script divide. Raw arguments arrive as `ScriptValue`s, casting
//! normalizes them, and native implementations produce them as results.
//!
//! Two variants deal with shared objects: [`ScriptValue::Object`] carries the
//! script-side handle as the runtime hands it over, and
//! [`ScriptValue::Shared`] carries the resolved native reference that only
//! the casting layer produces. Equality on `Shared` is pointer identity.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::shared_object::{SharedObject, SharedObjectHandle};

/// A resolved native shared object reference.
///
/// Produced by the shared-object cast; wraps the registered `Arc` so
/// identity is preserved end to end. Two `SharedRef`s are equal iff they
/// point at the same object.
#[derive(Clone)]
pub struct SharedRef(pub Arc<dyn SharedObject>);

impl SharedRef {
    /// Downcast to the concrete shared object type.
    pub fn downcast_ref<T: SharedObject>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for SharedRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedRef({})", self.0.type_name())
    }
}

/// A value crossing the native/script boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptValue {
    /// No value (a function that returns nothing returns this)
    Undefined,
    /// Explicit null
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Number(f64),
    /// String value (owned)
    String(String),
    /// Ordered list of values
    Array(Vec<ScriptValue>),
    /// String-keyed record
    Map(FxHashMap<String, ScriptValue>),
    /// Script-side reference to a registered shared object
    Object(SharedObjectHandle),
    /// Resolved native shared object (produced by casting, never by script)
    Shared(SharedRef),
}

impl ScriptValue {
    /// Get a human-readable name for this value's kind, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Undefined => "undefined",
            ScriptValue::Null => "null",
            ScriptValue::Bool(_) => "bool",
            ScriptValue::Int(_) => "int",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Array(_) => "array",
            ScriptValue::Map(_) => "map",
            ScriptValue::Object(_) => "object",
            ScriptValue::Shared(_) => "shared",
        }
    }

    /// Check if this value is `Undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, ScriptValue::Undefined)
    }

    /// Check if this value is `Null` or `Undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, ScriptValue::Null | ScriptValue::Undefined)
    }

    /// Downcast a `Shared` value to the concrete shared object type.
    pub fn as_shared<T: SharedObject>(&self) -> Option<&T> {
        match self {
            ScriptValue::Shared(shared) => shared.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Bool(value)
    }
}

impl From<i64> for ScriptValue {
    fn from(value: i64) -> Self {
        ScriptValue::Int(value)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        ScriptValue::Number(value)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::String(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        ScriptValue::String(value)
    }
}
