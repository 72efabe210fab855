//! Module definitions: the immutable description of one native module.
//!
//! A [`ModuleDefinition`] holds everything the bridge needs to expose a
//! module to script: functions keyed by name, constants blocks (merged on
//! read), event listeners in declaration order, and optional view-manager
//! metadata carried through opaquely. It is built once per module instance
//! by the reflection/registration layer and consumed read-only afterwards.
//!
//! # Example
//!
//! ```
//! use nativemod::argument::ArgumentType;
//! use nativemod::definition::ModuleDefinition;
//! use nativemod::value::ScriptValue;
//!
//! let definition = ModuleDefinition::builder("Calculator")
//!     .constant("PI", ScriptValue::Number(std::f64::consts::PI))
//!     .sync_function("add", vec![ArgumentType::int(), ArgumentType::int()], |args| {
//!         match (&args[0], &args[1]) {
//!             (ScriptValue::Int(a), ScriptValue::Int(b)) => Ok(ScriptValue::Int(a + b)),
//!             _ => Err("bad arguments".into()),
//!         }
//!     })
//!     .build();
//!
//! assert!(definition.has_function("add"));
//! ```

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::argument::ArgumentType;
use crate::error::NativeError;
use crate::function::FunctionComponent;
use crate::runtime::{FunctionEntry, ScriptObject, ScriptRuntime};
use crate::value::ScriptValue;

/// Name of an internal lifecycle or custom event.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Posted right after a module holder derives its definition
    ModuleCreate,
    /// Posted when a module holder is released
    ModuleDestroy,
    /// Embedder-defined event
    Custom(String),
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventName::ModuleCreate => write!(f, "moduleCreate"),
            EventName::ModuleDestroy => write!(f, "moduleDestroy"),
            EventName::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Handler invoked when a matching event is posted. Receives the payload,
/// if any.
pub type ListenerFn = Arc<dyn Fn(Option<&ScriptValue>) -> Result<(), NativeError> + Send + Sync>;

/// An `(event name, callback)` pair stored in the definition.
#[derive(Clone)]
pub struct EventListener {
    event: EventName,
    handler: ListenerFn,
}

impl EventListener {
    /// Create a listener for the given event.
    pub fn new<F>(event: EventName, handler: F) -> Self
    where
        F: Fn(Option<&ScriptValue>) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        Self {
            event,
            handler: Arc::new(handler),
        }
    }

    /// The event this listener is registered for.
    pub fn event(&self) -> &EventName {
        &self.event
    }

    /// Invoke the listener with an optional payload.
    pub fn call(&self, payload: Option<&ScriptValue>) -> Result<(), NativeError> {
        (self.handler)(payload)
    }
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

/// Opaque view-manager metadata. The bridge carries it read-only; view
/// wiring lives in a higher layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewManagerDefinition {
    /// The view name as script sees it
    pub view_name: String,
    /// Declared prop names
    pub prop_names: Vec<String>,
}

/// Immutable description of one native module.
pub struct ModuleDefinition {
    name: String,
    functions: FxHashMap<String, FunctionComponent>,
    constants: Vec<FxHashMap<String, ScriptValue>>,
    event_listeners: Vec<EventListener>,
    view_manager: Option<ViewManagerDefinition>,
}

impl ModuleDefinition {
    /// Start building a definition for the named module.
    pub fn builder(name: impl Into<String>) -> ModuleDefinitionBuilder {
        ModuleDefinitionBuilder {
            name: name.into(),
            functions: FxHashMap::default(),
            constants: Vec::new(),
            event_listeners: Vec::new(),
            view_manager: None,
        }
    }

    /// The module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a function component by name.
    pub fn function(&self, name: &str) -> Option<&FunctionComponent> {
        self.functions.get(name)
    }

    /// Check if the module declares the named function.
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Number of declared functions.
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Merge all constants blocks into one snapshot. Later blocks override
    /// earlier ones on key collisions. Pure; safe to call repeatedly.
    pub fn get_constants(&self) -> FxHashMap<String, ScriptValue> {
        let mut merged = FxHashMap::default();
        for block in &self.constants {
            for (key, value) in block {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }

    /// All event listeners, in declaration order.
    pub fn event_listeners(&self) -> &[EventListener] {
        &self.event_listeners
    }

    /// Listeners registered for the given event, preserving declaration
    /// order.
    pub fn listeners_for<'a>(
        &'a self,
        event: &'a EventName,
    ) -> impl Iterator<Item = &'a EventListener> {
        self.event_listeners
            .iter()
            .filter(move |listener| listener.event() == event)
    }

    /// The view-manager metadata, if any.
    pub fn view_manager(&self) -> Option<&ViewManagerDefinition> {
        self.view_manager.as_ref()
    }

    /// Build the script façade through the runtime, prefilled with the
    /// merged constants and one entry per declared function.
    pub fn build_script_object(&self, runtime: &dyn ScriptRuntime) -> ScriptObject {
        let mut object = runtime.create_object();
        for (name, value) in self.get_constants() {
            object.set_property(name, value);
        }
        for (name, component) in &self.functions {
            object.register_function(FunctionEntry {
                name: name.clone(),
                kind: component.kind(),
                arity: component.arity(),
            });
        }
        object
    }
}

impl fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("name", &self.name)
            .field("functions", &self.functions.len())
            .field("constants_blocks", &self.constants.len())
            .field("event_listeners", &self.event_listeners.len())
            .finish()
    }
}

/// Fluent builder for [`ModuleDefinition`].
pub struct ModuleDefinitionBuilder {
    name: String,
    functions: FxHashMap<String, FunctionComponent>,
    constants: Vec<FxHashMap<String, ScriptValue>>,
    event_listeners: Vec<EventListener>,
    view_manager: Option<ViewManagerDefinition>,
}

impl ModuleDefinitionBuilder {
    /// Add a constants block. Blocks merge on read; later blocks win.
    pub fn constants(mut self, block: FxHashMap<String, ScriptValue>) -> Self {
        self.constants.push(block);
        self
    }

    /// Add a single constant as its own block.
    pub fn constant(mut self, key: impl Into<String>, value: ScriptValue) -> Self {
        let mut block = FxHashMap::default();
        block.insert(key.into(), value);
        self.constants.push(block);
        self
    }

    /// Add a prebuilt function component, keyed by its name. A later
    /// component with the same name replaces the earlier one.
    pub fn function(mut self, component: FunctionComponent) -> Self {
        self.functions.insert(component.name().to_string(), component);
        self
    }

    /// Add a synchronous function.
    pub fn sync_function<F>(
        self,
        name: impl Into<String>,
        argument_types: Vec<ArgumentType>,
        f: F,
    ) -> Self
    where
        F: Fn(&[ScriptValue]) -> Result<ScriptValue, NativeError> + Send + Sync + 'static,
    {
        self.function(FunctionComponent::sync(name, argument_types, f))
    }

    /// Add an async-only function.
    pub fn async_function<F>(
        self,
        name: impl Into<String>,
        argument_types: Vec<ArgumentType>,
        f: F,
    ) -> Self
    where
        F: Fn(&[ScriptValue]) -> Result<ScriptValue, NativeError> + Send + Sync + 'static,
    {
        self.function(FunctionComponent::asynchronous(name, argument_types, f))
    }

    /// Register an event listener. Declaration order is preserved for
    /// fan-out.
    pub fn event_listener<F>(mut self, event: EventName, handler: F) -> Self
    where
        F: Fn(Option<&ScriptValue>) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        self.event_listeners.push(EventListener::new(event, handler));
        self
    }

    /// Attach view-manager metadata.
    pub fn view_manager(mut self, view_manager: ViewManagerDefinition) -> Self {
        self.view_manager = Some(view_manager);
        self
    }

    /// Finish building the definition.
    pub fn build(self) -> ModuleDefinition {
        ModuleDefinition {
            name: self.name,
            functions: self.functions,
            constants: self.constants,
            event_listeners: self.event_listeners,
            view_manager: self.view_manager,
        }
    }
}
