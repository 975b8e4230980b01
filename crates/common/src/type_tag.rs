//! Type tags for runtime values.
//!
//! The tag is also the first byte of every encoded constant.

use crate::error::DecodeError;
use std::fmt;

/// Identifies which variant of [`Value`](crate::Value) is live.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    /// Slot not yet initialized. Never observable by program logic.
    Undefined = 0x00,
    /// The null value.
    Null = 0x01,
    /// Signed 64-bit integer.
    Int = 0x02,
    /// IEEE 754 64-bit float.
    Float = 0x03,
    /// Boolean.
    Bool = 0x04,
    /// Mutable string buffer (heap).
    Str = 0x05,
    /// Ordered list (heap).
    List = 0x06,
    /// Key-ordered map (heap).
    Map = 0x07,
}

/// All type tags, in definition order.
pub const ALL_TYPE_TAGS: [TypeTag; 8] = [
    TypeTag::Undefined,
    TypeTag::Null,
    TypeTag::Int,
    TypeTag::Float,
    TypeTag::Bool,
    TypeTag::Str,
    TypeTag::List,
    TypeTag::Map,
];

impl TryFrom<u8> for TypeTag {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(TypeTag::Undefined),
            0x01 => Ok(TypeTag::Null),
            0x02 => Ok(TypeTag::Int),
            0x03 => Ok(TypeTag::Float),
            0x04 => Ok(TypeTag::Bool),
            0x05 => Ok(TypeTag::Str),
            0x06 => Ok(TypeTag::List),
            0x07 => Ok(TypeTag::Map),
            _ => Err(DecodeError::InvalidValueTag(value)),
        }
    }
}

impl TypeTag {
    /// Script-facing name of the type.
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Undefined => "undefined",
            TypeTag::Null => "null",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Bool => "boolean",
            TypeTag::Str => "string",
            TypeTag::List => "list",
            TypeTag::Map => "map",
        }
    }

    /// Returns true for `int` and `float`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeTag::Int | TypeTag::Float)
    }

    /// Returns true for the heap-backed kinds (`string`, `list`, `map`).
    pub fn is_container(&self) -> bool {
        matches!(self, TypeTag::Str | TypeTag::List | TypeTag::Map)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
