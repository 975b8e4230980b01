//! Runtime errors for the brisk VM.
//!
//! [`RuntimeError`] is what a failing operation reports; the thread turns
//! it into a [`VmError`] at the host boundary, after reconstructing the
//! stack trace from the live frames.

use brisk_common::ValueError;
use std::fmt;
use thiserror::Error;

/// Coarse classification of a [`RuntimeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TypeError,
    DivisionByZero,
    ArityMismatch,
    UndefinedFunction,
    IndexOutOfBounds,
    UndefinedKey,
    InterruptedNative,
    InternalFault,
    UninitializedLocal,
    StackOverflow,
    NativeFailure,
}

/// A failed operation. Every variant except `InternalFault` crashes only
/// the thread that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Operand types not accepted by an operator.
    #[error("type error: {message}")]
    TypeError { message: String },

    #[error("division by zero")]
    DivisionByZero,

    /// Argument count outside the callee's `[min, max]`.
    #[error("{function} expects {min}..={max} arguments, got {argc}")]
    ArityMismatch {
        function: String,
        min: u8,
        max: u8,
        argc: usize,
    },

    /// Function index or name that does not resolve, or a native with no
    /// host binding.
    #[error("undefined function {name}")]
    UndefinedFunction { name: String },

    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    /// Strict map access or `GetConst` with a missing key.
    #[error("undefined key {key}")]
    UndefinedKey { key: String },

    /// A blocking native was interrupted.
    #[error("{function} interrupted")]
    InterruptedNative { function: String },

    /// Defect in the compiler or VM. Never recoverable.
    #[error("internal fault: {detail}")]
    InternalFault { detail: String },

    /// Read of a local slot that was never written.
    #[error("local slot {slot} read before assignment")]
    UninitializedLocal { slot: u16 },

    /// Call depth or slot use beyond the configured limits.
    #[error("stack overflow at depth {depth}")]
    StackOverflow { depth: usize },

    /// Free-form failure reported by a native function.
    #[error("{function}: {message}")]
    NativeFailure { function: String, message: String },
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::TypeError { .. } => ErrorKind::TypeError,
            RuntimeError::DivisionByZero => ErrorKind::DivisionByZero,
            RuntimeError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            RuntimeError::UndefinedFunction { .. } => ErrorKind::UndefinedFunction,
            RuntimeError::IndexOutOfBounds { .. } => ErrorKind::IndexOutOfBounds,
            RuntimeError::UndefinedKey { .. } => ErrorKind::UndefinedKey,
            RuntimeError::InterruptedNative { .. } => ErrorKind::InterruptedNative,
            RuntimeError::InternalFault { .. } => ErrorKind::InternalFault,
            RuntimeError::UninitializedLocal { .. } => ErrorKind::UninitializedLocal,
            RuntimeError::StackOverflow { .. } => ErrorKind::StackOverflow,
            RuntimeError::NativeFailure { .. } => ErrorKind::NativeFailure,
        }
    }

    pub(crate) fn fault(detail: impl Into<String>) -> Self {
        RuntimeError::InternalFault {
            detail: detail.into(),
        }
    }
}

impl From<ValueError> for RuntimeError {
    fn from(err: ValueError) -> Self {
        match err {
            ValueError::TypeMismatch { .. } | ValueError::UnaryTypeMismatch { .. } => {
                RuntimeError::TypeError {
                    message: err.to_string(),
                }
            }
            ValueError::DivisionByZero => RuntimeError::DivisionByZero,
            ValueError::IndexOutOfBounds { index, len } => {
                RuntimeError::IndexOutOfBounds { index, len }
            }
            ValueError::UndefinedKey { key } => RuntimeError::UndefinedKey { key },
        }
    }
}

/// One stack-trace line: a frame's function and its current source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub function: String,
    pub module: String,
    pub line: Option<u32>,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.function)?;
        match self.line {
            Some(line) => write!(f, ":{line}"),
            None => Ok(()),
        }
    }
}

fn format_trace(trace: &[TraceEntry]) -> String {
    trace.iter().map(|entry| format!("\n    at {entry}")).collect()
}

/// Error surfaced to the embedding host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// The thread crashed. `trace` runs innermost frame first.
    #[error("{error}{}", format_trace(.trace))]
    Crashed {
        error: RuntimeError,
        trace: Vec<TraceEntry>,
    },

    /// The thread hit an internal fault and is poisoned.
    #[error("internal fault in {function} at instruction {cp}: {detail}")]
    InternalFault {
        function: String,
        cp: usize,
        detail: String,
    },
}

impl VmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VmError::Crashed { error, .. } => error.kind(),
            VmError::InternalFault { .. } => ErrorKind::InternalFault,
        }
    }

    /// The crash trace; empty for internal faults.
    pub fn trace(&self) -> &[TraceEntry] {
        match self {
            VmError::Crashed { trace, .. } => trace,
            VmError::InternalFault { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brisk_common::TypeTag;

    #[test]
    fn value_errors_map_onto_the_taxonomy() {
        let err: RuntimeError = ValueError::TypeMismatch {
            op: "+",
            left: TypeTag::Bool,
            right: TypeTag::List,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::TypeError);
        assert_eq!(
            err.to_string(),
            "type error: unsupported operand types for +: boolean and list"
        );
        assert_eq!(
            RuntimeError::from(ValueError::DivisionByZero),
            RuntimeError::DivisionByZero
        );
    }

    #[test]
    fn crashed_display_includes_trace() {
        let err = VmError::Crashed {
            error: RuntimeError::DivisionByZero,
            trace: vec![
                TraceEntry {
                    function: "inner".into(),
                    module: "app".into(),
                    line: Some(4),
                },
                TraceEntry {
                    function: "main".into(),
                    module: "app".into(),
                    line: None,
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "division by zero\n    at app.inner:4\n    at app.main"
        );
        assert_eq!(err.kind(), ErrorKind::DivisionByZero);
    }

    #[test]
    fn arity_display() {
        let err = RuntimeError::ArityMismatch {
            function: "app.f".into(),
            min: 1,
            max: 3,
            argc: 4,
        };
        assert_eq!(err.to_string(), "app.f expects 1..=3 arguments, got 4");
    }
}
