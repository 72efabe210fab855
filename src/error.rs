//! Error types for the module bridge.
//!
//! Two phase-specific enums cover the boundary:
//!
//! ```text
//! CastError  - a raw argument could not be converted to its declared type
//! CallError  - dispatch-level failures (lookup, arity, casting context,
//!              native implementation errors passed through opaquely)
//! ```
//!
//! Cast failures are resolved locally into a [`CallError`] before native
//! code would run; native code is never invoked on a failed cast. Script
//! callers always receive a determinate outcome: async dispatch reports
//! exactly once through its completion, sync dispatch returns errors as
//! values.

use thiserror::Error;

/// Opaque error raised by a native implementation. Passed through the
/// boundary unchanged.
pub type NativeError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that occur while casting one boundary value to a declared
/// argument type.
#[derive(Debug, Error)]
pub enum CastError {
    /// The raw value could not even be interpreted as the expected boundary
    /// representation.
    #[error("expected {expected}, got {found}")]
    InvalidArgumentKind {
        /// Description of the declared argument type.
        expected: String,
        /// Kind of the value that was actually supplied.
        found: &'static str,
    },

    /// A shared-object argument's handle is not registered (or went stale).
    #[error("unable to find the native shared object associated with the given script object")]
    SharedObjectNotFound,

    /// A field of a structured argument failed to cast.
    #[error("field '{field}': {source}")]
    StructuredField {
        /// The field name within the record.
        field: String,
        /// The underlying cast failure.
        #[source]
        source: Box<CastError>,
    },

    /// A structured argument is missing a declared field.
    #[error("missing field '{field}'")]
    MissingField {
        /// The missing field name.
        field: String,
    },
}

/// Errors that occur while dispatching a call into a module.
#[derive(Debug, Error)]
pub enum CallError {
    /// The call targets a function the module does not declare.
    #[error("function '{function}' not found in module '{module}'")]
    FunctionNotFound {
        /// The requested function name.
        function: String,
        /// The module name.
        module: String,
    },

    /// Arity mismatch between the declared signature and supplied arguments.
    #[error("function '{function}' expects {expected} argument(s), got {got}")]
    ArgumentCountMismatch {
        /// The function name.
        function: String,
        /// Declared arity.
        expected: usize,
        /// Number of arguments supplied.
        got: usize,
    },

    /// A positional argument failed to cast to its declared type.
    #[error("argument {index} of '{function}': {source}")]
    ArgumentCast {
        /// The function name.
        function: String,
        /// Zero-based argument position.
        index: usize,
        /// The underlying cast failure.
        #[source]
        source: CastError,
    },

    /// A synchronous call was attempted against an async-only function.
    #[error("function '{function}' does not support synchronous calls")]
    SyncCallUnsupported {
        /// The function name.
        function: String,
    },

    /// The native implementation failed; the error is opaque to the core.
    #[error("native error: {0}")]
    Native(#[source] NativeError),
}

impl CallError {
    /// Check if this is a cast-level failure (arity or argument cast).
    pub fn is_cast_failure(&self) -> bool {
        matches!(
            self,
            CallError::ArgumentCountMismatch { .. } | CallError::ArgumentCast { .. }
        )
    }
}

/// Outcome of one function call, reported to script as a value or a
/// structured error, never a hang or a silently dropped call.
pub type FunctionCallResult = Result<crate::value::ScriptValue, CallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_error_display() {
        let err = CastError::InvalidArgumentKind {
            expected: "Int".to_string(),
            found: "string",
        };
        assert_eq!(format!("{err}"), "expected Int, got string");
    }

    #[test]
    fn structured_field_error_display() {
        let err = CastError::StructuredField {
            field: "x".to_string(),
            source: Box::new(CastError::InvalidArgumentKind {
                expected: "Double".to_string(),
                found: "bool",
            }),
        };
        assert_eq!(format!("{err}"), "field 'x': expected Double, got bool");
    }

    #[test]
    fn function_not_found_display() {
        let err = CallError::FunctionNotFound {
            function: "reverse".to_string(),
            module: "StringUtils".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "function 'reverse' not found in module 'StringUtils'"
        );
    }

    #[test]
    fn argument_count_mismatch_display() {
        let err = CallError::ArgumentCountMismatch {
            function: "add".to_string(),
            expected: 2,
            got: 3,
        };
        assert_eq!(format!("{err}"), "function 'add' expects 2 argument(s), got 3");
    }

    #[test]
    fn argument_cast_carries_position() {
        let err = CallError::ArgumentCast {
            function: "add".to_string(),
            index: 1,
            source: CastError::SharedObjectNotFound,
        };
        let msg = format!("{err}");
        assert!(msg.contains("argument 1"));
        assert!(msg.contains("add"));
    }

    #[test]
    fn is_cast_failure() {
        assert!(
            CallError::ArgumentCountMismatch {
                function: "f".into(),
                expected: 0,
                got: 1
            }
            .is_cast_failure()
        );
        assert!(
            CallError::ArgumentCast {
                function: "f".into(),
                index: 0,
                source: CastError::SharedObjectNotFound
            }
            .is_cast_failure()
        );
        assert!(
            !CallError::SyncCallUnsupported {
                function: "f".into()
            }
            .is_cast_failure()
        );
    }

    #[test]
    fn native_error_passthrough_display() {
        let native: NativeError = "disk on fire".into();
        let err = CallError::Native(native);
        assert_eq!(format!("{err}"), "native error: disk on fire");
    }
}
