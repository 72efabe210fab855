//! Argument types: per-type casting capabilities for boundary values.
//!
//! An [`ArgumentType`] describes how to validate and convert one raw
//! boundary value into one native value. It is a closed set of tagged
//! variants behind common operations. Dispatch is by variant tag, never by
//! runtime type introspection, so casting stays decidable and testable in
//! isolation.
//!
//! The contract per variant:
//!
//! - `wraps::<T>()`: declaration-time check that the variant is specialized
//!   for native type `T`, used to validate a function signature.
//! - `matches(&other)`: structural equality for signature comparison.
//!   Implemented over domain-separated identity hashes, so a shared-object
//!   type never matches a primitive even with coincidental names.
//! - `cast(&value, &registry)`: convert or fail with a [`CastError`].
//! - `description()`: human-readable, diagnostics only.

use std::any::TypeId;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::CastError;
use crate::shared_object::{SharedObject, SharedObjectRegistry};
use crate::type_hash::TypeHash;
use crate::value::{ScriptValue, SharedRef};

/// The primitive boundary types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// Boolean
    Bool,
    /// 64-bit integer (also accepts integral numbers)
    Int,
    /// Double-precision float (also accepts integers)
    Double,
    /// Owned string
    Str,
}

impl PrimitiveKind {
    /// Script-visible name of this primitive.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "Bool",
            PrimitiveKind::Int => "Int",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Str => "String",
        }
    }

    fn native_type_id(self) -> TypeId {
        match self {
            PrimitiveKind::Bool => TypeId::of::<bool>(),
            PrimitiveKind::Int => TypeId::of::<i64>(),
            PrimitiveKind::Double => TypeId::of::<f64>(),
            PrimitiveKind::Str => TypeId::of::<String>(),
        }
    }
}

/// An argument type wrapping one native shared object type.
#[derive(Clone, Debug)]
pub struct SharedObjectType {
    type_name: &'static str,
    native: TypeId,
}

impl SharedObjectType {
    /// Create a shared-object argument type for native type `T`.
    pub fn of<T: SharedObject>(type_name: &'static str) -> Self {
        Self {
            type_name,
            native: TypeId::of::<T>(),
        }
    }

    /// The script-visible name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// An argument type describing a named record cast field-by-field from a
/// `Map` value.
#[derive(Clone, Debug)]
pub struct StructuredType {
    name: String,
    fields: Vec<(String, ArgumentType)>,
    native: TypeId,
}

impl StructuredType {
    /// Create a structured argument type for native record type `T` with
    /// the given ordered field list.
    pub fn of<T: 'static>(name: impl Into<String>, fields: Vec<(String, ArgumentType)>) -> Self {
        Self {
            name: name.into(),
            fields,
            native: TypeId::of::<T>(),
        }
    }

    /// The record name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared fields, in order.
    pub fn fields(&self) -> &[(String, ArgumentType)] {
        &self.fields
    }
}

/// A capability describing how to validate and convert one boundary value
/// into one native type.
#[derive(Clone, Debug)]
pub enum ArgumentType {
    /// A primitive boundary type
    Primitive(PrimitiveKind),
    /// A named record cast field-by-field
    Structured(StructuredType),
    /// A native shared object resolved through the registry
    SharedObject(SharedObjectType),
    /// Accepts `Null`/`Undefined`, otherwise delegates to the inner type
    Nullable(Box<ArgumentType>),
    /// Passthrough: accepts any boundary value unchanged
    AnyValue,
}

impl ArgumentType {
    /// Boolean argument type.
    pub fn bool() -> Self {
        ArgumentType::Primitive(PrimitiveKind::Bool)
    }

    /// Integer argument type.
    pub fn int() -> Self {
        ArgumentType::Primitive(PrimitiveKind::Int)
    }

    /// Double argument type.
    pub fn double() -> Self {
        ArgumentType::Primitive(PrimitiveKind::Double)
    }

    /// String argument type.
    pub fn string() -> Self {
        ArgumentType::Primitive(PrimitiveKind::Str)
    }

    /// Shared-object argument type for native type `T`.
    pub fn shared_object<T: SharedObject>(type_name: &'static str) -> Self {
        ArgumentType::SharedObject(SharedObjectType::of::<T>(type_name))
    }

    /// Structured argument type for native record type `T`.
    pub fn structured<T: 'static>(
        name: impl Into<String>,
        fields: Vec<(String, ArgumentType)>,
    ) -> Self {
        ArgumentType::Structured(StructuredType::of::<T>(name, fields))
    }

    /// Nullable wrapper around `inner`.
    pub fn nullable(inner: ArgumentType) -> Self {
        ArgumentType::Nullable(Box::new(inner))
    }

    /// Passthrough argument type.
    pub fn any() -> Self {
        ArgumentType::AnyValue
    }

    /// Structural identity of this argument type.
    ///
    /// Computed with domain-separated hashing, so identities from different
    /// variants occupy disjoint spaces.
    pub fn identity(&self) -> TypeHash {
        match self {
            ArgumentType::Primitive(kind) => TypeHash::for_primitive(kind.name()),
            ArgumentType::Structured(record) => TypeHash::for_structured(
                &record.name,
                record
                    .fields
                    .iter()
                    .map(|(name, field)| (name.as_str(), field.identity())),
            ),
            ArgumentType::SharedObject(shared) => TypeHash::for_shared_object(shared.type_name),
            ArgumentType::Nullable(inner) => TypeHash::for_nullable(inner.identity()),
            ArgumentType::AnyValue => TypeHash::ANY,
        }
    }

    /// Check whether this argument type is specialized for native type `T`.
    ///
    /// Used at declaration time to validate a function signature against its
    /// native implementation's parameter types.
    pub fn wraps<T: 'static>(&self) -> bool {
        match self {
            ArgumentType::Primitive(kind) => kind.native_type_id() == TypeId::of::<T>(),
            ArgumentType::Structured(record) => record.native == TypeId::of::<T>(),
            ArgumentType::SharedObject(shared) => shared.native == TypeId::of::<T>(),
            ArgumentType::Nullable(inner) => inner.wraps::<T>(),
            ArgumentType::AnyValue => TypeId::of::<ScriptValue>() == TypeId::of::<T>(),
        }
    }

    /// Structural equality with another argument type.
    pub fn matches(&self, other: &ArgumentType) -> bool {
        self.identity() == other.identity()
    }

    /// Convert a raw boundary value to its native representation.
    ///
    /// The shared-object variant resolves the value's handle through
    /// `shared_objects`; the result carries the registered object itself,
    /// not a copy.
    pub fn cast(
        &self,
        value: &ScriptValue,
        shared_objects: &SharedObjectRegistry,
    ) -> Result<ScriptValue, CastError> {
        match self {
            ArgumentType::Primitive(kind) => cast_primitive(*kind, value),
            ArgumentType::Structured(record) => cast_structured(record, value, shared_objects),
            ArgumentType::SharedObject(_) => cast_shared_object(self, value, shared_objects),
            ArgumentType::Nullable(inner) => {
                if value.is_nullish() {
                    Ok(ScriptValue::Null)
                } else {
                    inner.cast(value, shared_objects)
                }
            }
            ArgumentType::AnyValue => Ok(value.clone()),
        }
    }

    /// Human-readable description, diagnostics only.
    pub fn description(&self) -> String {
        match self {
            ArgumentType::Primitive(kind) => kind.name().to_string(),
            ArgumentType::Structured(record) => format!("Structured<{}>", record.name),
            ArgumentType::SharedObject(shared) => format!("SharedObject<{}>", shared.type_name),
            ArgumentType::Nullable(inner) => format!("Nullable<{}>", inner.description()),
            ArgumentType::AnyValue => "Any".to_string(),
        }
    }

    fn invalid_kind(&self, value: &ScriptValue) -> CastError {
        CastError::InvalidArgumentKind {
            expected: self.description(),
            found: value.type_name(),
        }
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

fn cast_primitive(kind: PrimitiveKind, value: &ScriptValue) -> Result<ScriptValue, CastError> {
    let invalid = || CastError::InvalidArgumentKind {
        expected: kind.name().to_string(),
        found: value.type_name(),
    };
    match (kind, value) {
        (PrimitiveKind::Bool, ScriptValue::Bool(b)) => Ok(ScriptValue::Bool(*b)),
        (PrimitiveKind::Int, ScriptValue::Int(i)) => Ok(ScriptValue::Int(*i)),
        // Script runtimes hand over integral numbers as doubles. The value
        // must sit inside i64 range or the cast would saturate; the upper
        // bound is exclusive because `i64::MAX as f64` rounds up to 2^63.
        (PrimitiveKind::Int, ScriptValue::Number(n))
            if n.is_finite()
                && n.fract() == 0.0
                && *n >= i64::MIN as f64
                && *n < i64::MAX as f64 =>
        {
            Ok(ScriptValue::Int(*n as i64))
        }
        (PrimitiveKind::Double, ScriptValue::Number(n)) => Ok(ScriptValue::Number(*n)),
        (PrimitiveKind::Double, ScriptValue::Int(i)) => Ok(ScriptValue::Number(*i as f64)),
        (PrimitiveKind::Str, ScriptValue::String(s)) => Ok(ScriptValue::String(s.clone())),
        _ => Err(invalid()),
    }
}

fn cast_structured(
    record: &StructuredType,
    value: &ScriptValue,
    shared_objects: &SharedObjectRegistry,
) -> Result<ScriptValue, CastError> {
    let map = match value {
        ScriptValue::Map(map) => map,
        _ => {
            return Err(CastError::InvalidArgumentKind {
                expected: format!("Structured<{}>", record.name),
                found: value.type_name(),
            });
        }
    };

    let mut result = FxHashMap::default();
    for (field_name, field_type) in &record.fields {
        let raw = map.get(field_name).ok_or_else(|| CastError::MissingField {
            field: field_name.clone(),
        })?;
        let casted =
            field_type
                .cast(raw, shared_objects)
                .map_err(|source| CastError::StructuredField {
                    field: field_name.clone(),
                    source: Box::new(source),
                })?;
        result.insert(field_name.clone(), casted);
    }
    // Undeclared fields are dropped rather than passed through.
    Ok(ScriptValue::Map(result))
}

fn cast_shared_object(
    argument_type: &ArgumentType,
    value: &ScriptValue,
    shared_objects: &SharedObjectRegistry,
) -> Result<ScriptValue, CastError> {
    let handle = match value {
        ScriptValue::Object(handle) => *handle,
        _ => return Err(argument_type.invalid_kind(value)),
    };
    let object = shared_objects
        .resolve(handle)
        .ok_or(CastError::SharedObjectNotFound)?;
    Ok(ScriptValue::Shared(SharedRef(object)))
}
