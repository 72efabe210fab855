//! The application context shared by all module holders.

use std::fmt;
use std::sync::Arc;

use crate::runtime::ScriptRuntime;
use crate::shared_object::SharedObjectRegistry;

/// Shared services a module holder reaches through a weak reference.
///
/// The runtime slot may be empty (for example while remote debugging, or
/// before the runtime has been installed). Holders treat an absent runtime
/// as a normal state and degrade gracefully rather than erroring.
pub struct AppContext {
    runtime: Option<Arc<dyn ScriptRuntime>>,
    shared_objects: Arc<SharedObjectRegistry>,
}

impl AppContext {
    /// Create a context with a runtime installed.
    pub fn new(runtime: Arc<dyn ScriptRuntime>) -> Self {
        Self {
            runtime: Some(runtime),
            shared_objects: Arc::new(SharedObjectRegistry::new()),
        }
    }

    /// Create a context without a runtime.
    pub fn without_runtime() -> Self {
        Self {
            runtime: None,
            shared_objects: Arc::new(SharedObjectRegistry::new()),
        }
    }

    /// The installed runtime, if any.
    pub fn runtime(&self) -> Option<&Arc<dyn ScriptRuntime>> {
        self.runtime.as_ref()
    }

    /// Whether a runtime is currently installed.
    pub fn has_runtime(&self) -> bool {
        self.runtime.is_some()
    }

    /// The context-wide shared object registry.
    pub fn shared_objects(&self) -> &Arc<SharedObjectRegistry> {
        &self.shared_objects
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("has_runtime", &self.runtime.is_some())
            .field("shared_objects", &self.shared_objects.len())
            .finish()
    }
}
