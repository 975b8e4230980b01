//! Errors for value operations and module decoding.

use crate::type_tag::TypeTag;
use thiserror::Error;

/// Failures produced by the pure operations on [`Value`](crate::Value).
///
/// These never carry location information; the VM attaches the frame
/// context when it turns them into a crash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Operand types not accepted by the operation.
    #[error("unsupported operand types for {op}: {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: TypeTag,
        right: TypeTag,
    },

    /// Unary operation on an unsupported type.
    #[error("unsupported operand type for {op}: {operand}")]
    UnaryTypeMismatch { op: &'static str, operand: TypeTag },

    /// Division or remainder by a numeric zero.
    #[error("division by zero")]
    DivisionByZero,

    /// List or string index outside `0..len`.
    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    /// Strict map access with a key that is not present.
    #[error("undefined key {key}")]
    UndefinedKey { key: String },
}

/// Errors that occur while decoding an encoded module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input does not start with the module magic.
    #[error("not a brisk module (bad magic)")]
    BadMagic,

    /// The format version is not one this build understands.
    #[error("unsupported module format version {0}")]
    UnsupportedVersion(u16),

    /// The payload digest does not match the header.
    #[error("module checksum mismatch")]
    ChecksumMismatch,

    /// Input ended in the middle of a field.
    #[error("unexpected end of input at byte {offset}")]
    UnexpectedEof { offset: usize },

    /// Header payload length disagrees with the actual input.
    #[error("invalid payload length: header says {declared}, found {actual}")]
    InvalidLength { declared: usize, actual: usize },

    /// Opcode 0x00 is illegal and always rejected.
    #[error("illegal opcode 0x00")]
    IllegalOpcode,

    /// Opcode byte is not assigned.
    #[error("reserved opcode: {0:#04x}")]
    ReservedOpcode(u8),

    /// Value tag byte is not assigned.
    #[error("invalid value tag: {0:#04x}")]
    InvalidValueTag(u8),

    /// Function kind byte is not assigned.
    #[error("invalid function kind: {0:#04x}")]
    InvalidFunctionKind(u8),

    /// A string field is not valid UTF-8.
    #[error("invalid UTF-8 in string at byte {offset}")]
    InvalidUtf8 { offset: usize },

    /// A list or map value was used as a map key.
    #[error("invalid map key at byte {offset}")]
    InvalidMapKey { offset: usize },

    /// Constant values nest deeper than the decoder accepts.
    #[error("constant nesting too deep at byte {offset}")]
    NestingTooDeep { offset: usize },

    /// Bytes remain after the last declared field.
    #[error("{0} trailing bytes after module payload")]
    TrailingBytes(usize),
}
