//! Function components: the invokable units of a module.
//!
//! A [`FunctionComponent`] is immutable after construction: a name, a kind
//! (sync or async), an ordered list of declared [`ArgumentType`]s (fixed
//! arity), and a type-erased native implementation. Casting is positional
//! and short-circuits on the first failure; native code never runs on a
//! failed cast.
//!
//! The async path reports exactly once through its completion, which may run
//! synchronously on the dispatching context. The sync path returns errors as
//! values, never panics across the boundary.

use std::fmt;
use std::sync::Arc;

use crate::argument::ArgumentType;
use crate::error::{CallError, FunctionCallResult, NativeError};
use crate::shared_object::SharedObjectRegistry;
use crate::value::ScriptValue;

/// Type-erased native implementation of a function.
///
/// Receives the casted arguments in declaration order and produces a result
/// value or an opaque native error.
pub type NativeFn = Arc<dyn Fn(&[ScriptValue]) -> Result<ScriptValue, NativeError> + Send + Sync>;

/// Whether a function may be called synchronously.
///
/// Synchronous calls are reserved for fast, non-blocking native operations
/// by contract; everything else dispatches through the async path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    /// Callable through both the sync and async paths
    Sync,
    /// Callable through the async path only
    Async,
}

/// An invokable unit: declared argument types plus a native implementation.
pub struct FunctionComponent {
    name: String,
    kind: FunctionKind,
    argument_types: Vec<ArgumentType>,
    implementation: NativeFn,
}

impl FunctionComponent {
    /// Create a synchronous function component.
    pub fn sync<F>(name: impl Into<String>, argument_types: Vec<ArgumentType>, f: F) -> Self
    where
        F: Fn(&[ScriptValue]) -> Result<ScriptValue, NativeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: FunctionKind::Sync,
            argument_types,
            implementation: Arc::new(f),
        }
    }

    /// Create an async-only function component.
    pub fn asynchronous<F>(name: impl Into<String>, argument_types: Vec<ArgumentType>, f: F) -> Self
    where
        F: Fn(&[ScriptValue]) -> Result<ScriptValue, NativeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: FunctionKind::Async,
            argument_types,
            implementation: Arc::new(f),
        }
    }

    /// The function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The function kind.
    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    /// Check if this component supports synchronous calls.
    pub fn is_sync(&self) -> bool {
        self.kind == FunctionKind::Sync
    }

    /// Declared arity.
    pub fn arity(&self) -> usize {
        self.argument_types.len()
    }

    /// The declared argument types, in positional order.
    pub fn argument_types(&self) -> &[ArgumentType] {
        &self.argument_types
    }

    /// Compare this component's signature against another declared type
    /// list, positionally, using structural equality.
    pub fn signature_matches(&self, types: &[ArgumentType]) -> bool {
        self.argument_types.len() == types.len()
            && self
                .argument_types
                .iter()
                .zip(types)
                .all(|(a, b)| a.matches(b))
    }

    /// Cast raw arguments through the declared types, in order.
    ///
    /// Arity is checked before any cast runs; the first cast failure
    /// short-circuits with positional context.
    pub fn cast_arguments(
        &self,
        args: &[ScriptValue],
        shared_objects: &SharedObjectRegistry,
    ) -> Result<Vec<ScriptValue>, CallError> {
        if args.len() != self.argument_types.len() {
            return Err(CallError::ArgumentCountMismatch {
                function: self.name.clone(),
                expected: self.argument_types.len(),
                got: args.len(),
            });
        }
        let mut casted = Vec::with_capacity(args.len());
        for (index, (argument_type, raw)) in self.argument_types.iter().zip(args).enumerate() {
            let value =
                argument_type
                    .cast(raw, shared_objects)
                    .map_err(|source| CallError::ArgumentCast {
                        function: self.name.clone(),
                        index,
                        source,
                    })?;
            casted.push(value);
        }
        Ok(casted)
    }

    /// Asynchronous call path.
    ///
    /// Casts the arguments, invokes the implementation, and reports the
    /// outcome to `completion` exactly once. On cast failure the completion
    /// receives the error and native code is not invoked. The completion may
    /// run synchronously on the calling context.
    pub fn call(
        &self,
        args: &[ScriptValue],
        shared_objects: &SharedObjectRegistry,
        completion: impl FnOnce(FunctionCallResult),
    ) {
        match self.cast_arguments(args, shared_objects) {
            Ok(casted) => {
                completion((self.implementation)(&casted).map_err(CallError::Native));
            }
            Err(err) => completion(Err(err)),
        }
    }

    /// Synchronous call path, only valid for [`FunctionKind::Sync`].
    ///
    /// Returns errors as values: cast failures, `SyncCallUnsupported` for
    /// async-only components (without casting or invoking anything), and
    /// native failures all come back through the same `Result` channel.
    pub fn call_sync(
        &self,
        args: &[ScriptValue],
        shared_objects: &SharedObjectRegistry,
    ) -> FunctionCallResult {
        if !self.is_sync() {
            return Err(CallError::SyncCallUnsupported {
                function: self.name.clone(),
            });
        }
        let casted = self.cast_arguments(args, shared_objects)?;
        (self.implementation)(&casted).map_err(CallError::Native)
    }
}

impl fmt::Debug for FunctionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionComponent")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}
