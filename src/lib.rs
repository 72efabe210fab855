//! In-process bridge between native modules and a scripting runtime.
//!
//! Native modules describe themselves through a [`module::AnyModule`]
//! definition: named functions with typed signatures, constants, event
//! listeners, and optional view-manager metadata. A
//! [`holder::ModuleHolder`] owns one module instance and mediates every
//! script interaction with it. Arguments cross the boundary as
//! [`value::ScriptValue`]s and are cast through declared
//! [`argument::ArgumentType`]s before native code runs; stateful native
//! objects travel by reference through the
//! [`shared_object::SharedObjectRegistry`] instead of being copied.

pub mod argument;
pub mod context;
pub mod definition;
pub mod error;
pub mod function;
pub mod holder;
pub mod module;
pub mod runtime;
pub mod shared_object;
pub mod type_hash;
pub mod value;

// Re-export main types
pub mod prelude {
    pub use crate::argument::*;
    pub use crate::context::AppContext;
    pub use crate::definition::*;
    pub use crate::error::{CallError, CastError, FunctionCallResult, NativeError};
    pub use crate::function::*;
    pub use crate::holder::*;
    pub use crate::module::AnyModule;
    pub use crate::runtime::*;
    pub use crate::shared_object::*;
    pub use crate::type_hash::TypeHash;
    pub use crate::value::*;
}
