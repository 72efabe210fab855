//! The trait every native module implements.

use crate::definition::ModuleDefinition;

/// A native module that can describe itself to the bridge.
///
/// The holder derives the definition exactly once per instance and caches
/// it; implementations should build a fresh definition on every call and
/// keep their own state behind the function closures.
pub trait AnyModule: Send + Sync {
    /// Produce the full description of this module.
    fn definition(&self) -> ModuleDefinition;
}
