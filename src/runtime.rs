//! Scripting runtime interface and the script-visible façade object.
//!
//! The runtime itself is an external collaborator; this crate only needs it
//! to create objects. The [`ScriptObject`] returned here is the façade a
//! module presents to script: constants as static properties, functions as
//! callable entry points.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::function::FunctionKind;
use crate::value::ScriptValue;

/// External collaborator: the scripting runtime's object factory.
///
/// Availability is not guaranteed: an app context may have no runtime (for
/// example while remote debugging), and façade creation treats that as a
/// normal absent state, not an error.
pub trait ScriptRuntime: Send + Sync {
    /// Create a fresh, empty script object.
    fn create_object(&self) -> ScriptObject;
}

/// A callable entry point on a façade object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionEntry {
    /// The function name as script sees it
    pub name: String,
    /// Sync or async dispatch
    pub kind: FunctionKind,
    /// Declared arity
    pub arity: usize,
}

/// The script-visible object representing a native module.
///
/// Prefilled with the module's merged constants and one entry per declared
/// function. Script reaches the module through this object by name.
#[derive(Clone, Debug, Default)]
pub struct ScriptObject {
    properties: FxHashMap<String, ScriptValue>,
    functions: Vec<FunctionEntry>,
}

impl ScriptObject {
    /// Create an empty script object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a static property.
    pub fn set_property(&mut self, name: impl Into<String>, value: ScriptValue) {
        self.properties.insert(name.into(), value);
    }

    /// Get a static property by name.
    pub fn property(&self, name: &str) -> Option<&ScriptValue> {
        self.properties.get(name)
    }

    /// Number of static properties.
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Register a callable entry point.
    pub fn register_function(&mut self, entry: FunctionEntry) {
        self.functions.push(entry);
    }

    /// Look up a callable entry point by name.
    pub fn function(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.iter().find(|entry| entry.name == name)
    }

    /// Check if the object exposes a function with the given name.
    pub fn has_function(&self, name: &str) -> bool {
        self.function(name).is_some()
    }

    /// All registered entry points, in registration order.
    pub fn functions(&self) -> &[FunctionEntry] {
        &self.functions
    }
}

impl fmt::Display for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ScriptObject({} properties, {} functions)",
            self.properties.len(),
            self.functions.len()
        )
    }
}
