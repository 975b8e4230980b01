//! Runtime value representation.
//!
//! Scalars are stored inline; strings, lists and maps hold a shared handle
//! to a heap container. The tag alone decides which payload is live.

use crate::heap::{List, Map, MapKey, StrBuf};
use crate::type_tag::TypeTag;
use std::collections::HashMap;
use std::fmt;

/// A tagged runtime value.
///
/// `Clone` is the language's assignment: containers are shared, not
/// copied. Use [`Value::deep_clone`] for the explicit deep copy.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Uninitialized slot.
    #[default]
    Undefined,
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(StrBuf),
    List(List),
    Map(Map),
}

impl Value {
    /// New string value with its own buffer.
    pub fn string(text: impl Into<String>) -> Value {
        Value::Str(StrBuf::new(text))
    }

    /// New list value with its own storage.
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(List::new(items))
    }

    /// New map value with its own storage.
    pub fn map(entries: impl IntoIterator<Item = (MapKey, Value)>) -> Value {
        Value::Map(Map::from_entries(entries))
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Undefined => TypeTag::Undefined,
            Value::Null => TypeTag::Null,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Bool(_) => TypeTag::Bool,
            Value::Str(_) => TypeTag::Str,
            Value::List(_) => TypeTag::List,
            Value::Map(_) => TypeTag::Map,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Scalars for switch dispatch and map keys: everything but lists,
    /// maps and `undefined`.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::List(_) | Value::Map(_) | Value::Undefined)
    }

    /// Recursive copy. Scalars copy trivially; every container reachable
    /// from `self` gets fresh storage. Shared and cyclic structure is
    /// reproduced in the copy rather than unrolled.
    pub fn deep_clone(&self) -> Value {
        self.deep_clone_in(&mut HashMap::new())
    }

    /// `copies` maps each container already copied to its copy.
    fn deep_clone_in(&self, copies: &mut HashMap<usize, Value>) -> Value {
        match self {
            Value::Str(s) => Value::string(s.snapshot()),
            Value::List(l) => {
                if let Some(copy) = copies.get(&l.id()) {
                    return copy.clone();
                }
                let copy = List::new(Vec::new());
                copies.insert(l.id(), Value::List(copy.clone()));
                for item in l.snapshot() {
                    copy.push(item.deep_clone_in(copies));
                }
                Value::List(copy)
            }
            Value::Map(m) => {
                if let Some(copy) = copies.get(&m.id()) {
                    return copy.clone();
                }
                let copy = Map::new();
                copies.insert(m.id(), Value::Map(copy.clone()));
                for (key, value) in m.entries() {
                    copy.insert(key, value.deep_clone_in(copies));
                }
                Value::Map(copy)
            }
            scalar => scalar.clone(),
        }
    }

    /// Copy used when a literal is materialized into a frame: containers
    /// are deep-copied so scripts never mutate the shared literal.
    pub fn materialize(&self) -> Value {
        if self.type_tag().is_container() {
            self.deep_clone()
        } else {
            self.clone()
        }
    }

    /// Structural equality: same tag and equal contents. Never fails.
    pub fn equals(&self, other: &Value) -> bool {
        self.equals_in(other, &mut Vec::new())
    }

    /// `active` holds the container pairs under comparison further up.
    /// Meeting one again closes a cycle and counts as equal.
    fn equals_in(&self, other: &Value, active: &mut Vec<(usize, usize)>) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a.content_eq(b),
            (Value::List(a), Value::List(b)) => {
                let pair = (a.id(), b.id());
                if a.ptr_eq(b) || active.contains(&pair) {
                    return true;
                }
                active.push(pair);
                let equal = a.with(|xs| {
                    b.with(|ys| {
                        xs.len() == ys.len()
                            && xs.iter().zip(ys).all(|(x, y)| x.equals_in(y, active))
                    })
                });
                active.pop();
                equal
            }
            (Value::Map(a), Value::Map(b)) => {
                let pair = (a.id(), b.id());
                if a.ptr_eq(b) || active.contains(&pair) {
                    return true;
                }
                active.push(pair);
                let equal = a.with(|xs| {
                    b.with(|ys| {
                        xs.len() == ys.len()
                            && xs
                                .iter()
                                .zip(ys)
                                .all(|((kx, vx), (ky, vy))| kx == ky && vx.equals_in(vy, active))
                    })
                });
                active.pop();
                equal
            }
            _ => false,
        }
    }

    /// Truthiness for conditional jumps and logical not.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
        }
    }

    /// Render `self`. Strings inside containers are quoted; a container
    /// already being rendered further up (`open`) prints as `[...]` or
    /// `{...}`.
    fn write_to(
        &self,
        f: &mut fmt::Formatter<'_>,
        open: &mut Vec<usize>,
        nested: bool,
    ) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) if nested => s.with(|text| write!(f, "{text:?}")),
            Value::Str(s) => s.with(|text| f.write_str(text)),
            Value::List(l) => {
                if open.contains(&l.id()) {
                    return f.write_str("[...]");
                }
                open.push(l.id());
                let result = l.with(|items| {
                    f.write_str("[")?;
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        item.write_to(f, open, true)?;
                    }
                    f.write_str("]")
                });
                open.pop();
                result
            }
            Value::Map(m) => {
                if open.contains(&m.id()) {
                    return f.write_str("{...}");
                }
                open.push(m.id());
                let result = m.with(|entries| {
                    f.write_str("{")?;
                    for (i, (k, v)) in entries.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{k}: ")?;
                        v.write_to(f, open, true)?;
                    }
                    f.write_str("}")
                });
                open.pop();
                result
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

/// Canonical textual form of a float.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, &mut Vec::new(), false)
    }
}
