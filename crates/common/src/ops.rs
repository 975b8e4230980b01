//! Operators over tagged values.
//!
//! Every operation is a pure function of its operands that either produces
//! a result or a [`ValueError`]. Coercion rules:
//!
//! - `(int, int)` stays `int` with 64-bit wraparound, except `/` which
//!   promotes to `float` unless the division is exact.
//! - Any arithmetic pair involving `float` promotes both sides to `float`.
//! - `+` with a `string` on either side concatenates the stringified operands.
//! - `+` of two maps is their union; the right operand wins on collisions.
//! - Division and remainder by a numeric zero fail with `DivisionByZero`.

use crate::error::ValueError;
use crate::heap::{Map, MapKey};
use crate::value::Value;
use std::cmp::Ordering;

fn mismatch(op: &'static str, left: &Value, right: &Value) -> ValueError {
    ValueError::TypeMismatch {
        op,
        left: left.type_tag(),
        right: right.type_tag(),
    }
}

fn unary_mismatch(op: &'static str, operand: &Value) -> ValueError {
    ValueError::UnaryTypeMismatch {
        op,
        operand: operand.type_tag(),
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Int(i) => *i == 0,
        Value::Float(f) => *f == 0.0,
        _ => false,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

impl Value {
    /// Numeric binary operation with the int/float promotion rule.
    fn arith(
        &self,
        rhs: &Value,
        op: &'static str,
        int_op: fn(i64, i64) -> i64,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Value, ValueError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
            _ => match (as_float(self), as_float(rhs)) {
                (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
                _ => Err(mismatch(op, self, rhs)),
            },
        }
    }

    pub fn add(&self, rhs: &Value) -> Result<Value, ValueError> {
        match (self, rhs) {
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                let mut text = self.to_string();
                text.push_str(&rhs.to_string());
                Ok(Value::string(text))
            }
            (Value::Map(a), Value::Map(b)) => {
                let union = Map::from_entries(a.entries());
                for (key, value) in b.entries() {
                    union.insert(key, value);
                }
                Ok(Value::Map(union))
            }
            _ => self.arith(rhs, "+", i64::wrapping_add, |a, b| a + b),
        }
    }

    pub fn sub(&self, rhs: &Value) -> Result<Value, ValueError> {
        self.arith(rhs, "-", i64::wrapping_sub, |a, b| a - b)
    }

    pub fn mul(&self, rhs: &Value) -> Result<Value, ValueError> {
        self.arith(rhs, "*", i64::wrapping_mul, |a, b| a * b)
    }

    pub fn div(&self, rhs: &Value) -> Result<Value, ValueError> {
        if self.type_tag().is_numeric() && is_zero(rhs) {
            return Err(ValueError::DivisionByZero);
        }
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) if a.wrapping_rem(*b) == 0 => {
                Ok(Value::Int(a.wrapping_div(*b)))
            }
            (Value::Int(a), Value::Int(b)) => Ok(Value::Float(*a as f64 / *b as f64)),
            _ => self.arith(rhs, "/", i64::wrapping_div, |a, b| a / b),
        }
    }

    pub fn rem(&self, rhs: &Value) -> Result<Value, ValueError> {
        if self.type_tag().is_numeric() && is_zero(rhs) {
            return Err(ValueError::DivisionByZero);
        }
        self.arith(rhs, "%", i64::wrapping_rem, |a, b| a % b)
    }

    pub fn bit_and(&self, rhs: &Value) -> Result<Value, ValueError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a & b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a & *b)),
            _ => Err(mismatch("&", self, rhs)),
        }
    }

    pub fn bit_or(&self, rhs: &Value) -> Result<Value, ValueError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a | b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a | *b)),
            _ => Err(mismatch("|", self, rhs)),
        }
    }

    pub fn bit_xor(&self, rhs: &Value) -> Result<Value, ValueError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a ^ b)),
            _ => Err(mismatch("^", self, rhs)),
        }
    }

    /// Left shift; the count uses its low 6 bits.
    pub fn shl(&self, rhs: &Value) -> Result<Value, ValueError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_shl(*b as u32))),
            _ => Err(mismatch("<<", self, rhs)),
        }
    }

    /// Arithmetic right shift; the count uses its low 6 bits.
    pub fn shr(&self, rhs: &Value) -> Result<Value, ValueError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_shr(*b as u32))),
            _ => Err(mismatch(">>", self, rhs)),
        }
    }

    pub fn neg(&self) -> Result<Value, ValueError> {
        match self {
            Value::Int(a) => Ok(Value::Int(a.wrapping_neg())),
            Value::Float(a) => Ok(Value::Float(-a)),
            _ => Err(unary_mismatch("unary -", self)),
        }
    }

    /// Unary plus: identity on numbers.
    pub fn plus(&self) -> Result<Value, ValueError> {
        match self {
            Value::Int(_) | Value::Float(_) => Ok(self.clone()),
            _ => Err(unary_mismatch("unary +", self)),
        }
    }

    pub fn bit_not(&self) -> Result<Value, ValueError> {
        match self {
            Value::Int(a) => Ok(Value::Int(!a)),
            _ => Err(unary_mismatch("~", self)),
        }
    }

    /// Logical not of the operand's truthiness.
    pub fn not(&self) -> Result<Value, ValueError> {
        match self {
            Value::Undefined => Err(unary_mismatch("!", self)),
            other => Ok(Value::Bool(!other.truthy())),
        }
    }

    /// Three-way comparison.
    ///
    /// Returns `Ok(None)` when a NaN makes the pair incomparable; callers
    /// must treat that as "no ordering holds". Orderings between
    /// unrelated types (and any ordering of lists or maps) are errors.
    pub fn weak_compare(&self, rhs: &Value) -> Result<Option<Ordering>, ValueError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                match (as_float(self), as_float(rhs)) {
                    (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
                    _ => Err(mismatch("compare", self, rhs)),
                }
            }
            (Value::Bool(a), Value::Bool(b)) => Ok(Some(a.cmp(b))),
            (Value::Null, Value::Null) => Ok(Some(Ordering::Equal)),
            (Value::Str(a), Value::Str(b)) => Ok(Some(a.content_cmp(b))),
            _ => Err(mismatch("compare", self, rhs)),
        }
    }

    /// `self < rhs`; false when incomparable.
    pub fn less_than(&self, rhs: &Value) -> Result<bool, ValueError> {
        Ok(self.weak_compare(rhs)? == Some(Ordering::Less))
    }

    /// `self <= rhs`; false when incomparable.
    pub fn less_equal(&self, rhs: &Value) -> Result<bool, ValueError> {
        Ok(matches!(
            self.weak_compare(rhs)?,
            Some(Ordering::Less | Ordering::Equal)
        ))
    }

    /// `self > rhs`; false when incomparable.
    pub fn greater_than(&self, rhs: &Value) -> Result<bool, ValueError> {
        Ok(self.weak_compare(rhs)? == Some(Ordering::Greater))
    }

    /// `self >= rhs`; false when incomparable.
    pub fn greater_equal(&self, rhs: &Value) -> Result<bool, ValueError> {
        Ok(matches!(
            self.weak_compare(rhs)?,
            Some(Ordering::Greater | Ordering::Equal)
        ))
    }

    /// Add `delta` in place. Only `int` and `float` can be stepped.
    pub fn increment(&mut self, delta: i64) -> Result<(), ValueError> {
        match self {
            Value::Int(a) => *a = a.wrapping_add(delta),
            Value::Float(a) => *a += delta as f64,
            other => {
                let op = if delta < 0 { "--" } else { "++" };
                return Err(unary_mismatch(op, other));
            }
        }
        Ok(())
    }

    /// Number of characters, elements or entries.
    pub fn len(&self) -> Result<usize, ValueError> {
        match self {
            Value::Str(s) => Ok(s.len()),
            Value::List(l) => Ok(l.len()),
            Value::Map(m) => Ok(m.len()),
            other => Err(unary_mismatch("len", other)),
        }
    }

    /// Containment test: list element, map key, or substring.
    pub fn contains(&self, item: &Value) -> Result<bool, ValueError> {
        match (self, item) {
            (Value::List(l), _) => Ok(l.contains(item)),
            (Value::Map(m), _) => Ok(MapKey::from_value(item)
                .map(|key| m.contains_key(&key))
                .unwrap_or(false)),
            (Value::Str(s), Value::Str(needle)) => {
                let needle = needle.snapshot();
                Ok(s.with(|text| text.contains(needle.as_str())))
            }
            _ => Err(mismatch("in", self, item)),
        }
    }

    /// Strict indexed load: out-of-range indices and missing keys fail.
    pub fn load_index(&self, index: &Value) -> Result<Value, ValueError> {
        match (self, index) {
            (Value::List(l), Value::Int(i)) => l.get(*i),
            (Value::Str(s), Value::Int(i)) => s.char_at(*i).map(Value::string),
            (Value::Map(m), _) => {
                let key = MapKey::from_value(index)?;
                m.get(&key).ok_or_else(|| ValueError::UndefinedKey {
                    key: key.to_string(),
                })
            }
            _ => Err(mismatch("[]", self, index)),
        }
    }

    /// Lenient indexed load: out-of-range indices and missing keys yield
    /// `null`. Type errors still fail.
    pub fn load_index_or_null(&self, index: &Value) -> Result<Value, ValueError> {
        match self.load_index(index) {
            Err(ValueError::IndexOutOfBounds { .. } | ValueError::UndefinedKey { .. }) => {
                Ok(Value::Null)
            }
            other => other,
        }
    }

    /// Indexed store. Lists are bounds-checked; maps insert or replace.
    pub fn store_index(&self, index: &Value, value: Value) -> Result<(), ValueError> {
        match (self, index) {
            (Value::List(l), Value::Int(i)) => l.set(*i, value),
            (Value::Map(m), _) => {
                m.insert(MapKey::from_value(index)?, value);
                Ok(())
            }
            _ => Err(mismatch("[]=", self, index)),
        }
    }

    /// Step a container element in place.
    pub fn increment_index(&self, index: &Value, delta: i64) -> Result<(), ValueError> {
        match (self, index) {
            (Value::List(l), Value::Int(i)) => l.update(*i, |slot| slot.increment(delta)),
            (Value::Map(m), _) => {
                let key = MapKey::from_value(index)?;
                m.update(&key, |slot| slot.increment(delta))
            }
            _ => Err(mismatch("[]++", self, index)),
        }
    }

    /// Append to a list, or append the stringified value to a string.
    pub fn append(&self, value: Value) -> Result<(), ValueError> {
        match self {
            Value::List(l) => {
                l.push(value);
                Ok(())
            }
            Value::Str(s) => {
                // Render first: the value may be this same buffer.
                let text = value.to_string();
                s.append(&text);
                Ok(())
            }
            other => Err(mismatch("append", other, &value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_tag::TypeTag;

    fn s(text: &str) -> Value {
        Value::string(text)
    }

    fn key(text: &str) -> MapKey {
        MapKey::Str(text.to_string())
    }

    #[test]
    fn int_add_wraps() {
        assert_eq!(
            Value::Int(i64::MAX).add(&Value::Int(1)).unwrap(),
            Value::Int(i64::MIN)
        );
    }

    #[test]
    fn mixed_numeric_promotes_to_float() {
        assert_eq!(Value::Int(1).add(&Value::Float(0.5)).unwrap(), Value::Float(1.5));
        assert_eq!(Value::Float(0.5).mul(&Value::Int(4)).unwrap(), Value::Float(2.0));
    }

    #[test]
    fn division_typing() {
        assert_eq!(Value::Int(6).div(&Value::Int(3)).unwrap(), Value::Int(2));
        assert_eq!(Value::Int(7).div(&Value::Int(2)).unwrap(), Value::Float(3.5));
        assert_eq!(Value::Int(-9).div(&Value::Int(3)).unwrap(), Value::Int(-3));
        assert_eq!(
            Value::Int(i64::MIN).div(&Value::Int(-1)).unwrap(),
            Value::Int(i64::MIN)
        );
    }

    #[test]
    fn division_by_zero_fails() {
        assert_eq!(Value::Int(5).div(&Value::Int(0)), Err(ValueError::DivisionByZero));
        assert_eq!(Value::Int(5).rem(&Value::Int(0)), Err(ValueError::DivisionByZero));
        assert_eq!(
            Value::Float(5.0).div(&Value::Float(0.0)),
            Err(ValueError::DivisionByZero)
        );
        assert_eq!(
            Value::Float(5.0).rem(&Value::Int(0)),
            Err(ValueError::DivisionByZero)
        );
    }

    #[test]
    fn remainder() {
        assert_eq!(Value::Int(7).rem(&Value::Int(3)).unwrap(), Value::Int(1));
        assert_eq!(Value::Float(7.5).rem(&Value::Int(2)).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn string_concatenation_never_fails() {
        assert_eq!(s("a").add(&Value::Int(1)).unwrap(), s("a1"));
        assert_eq!(Value::Int(1).add(&s("a")).unwrap(), s("1a"));
        assert_eq!(s("x").add(&Value::Null).unwrap(), s("xnull"));
        assert_eq!(Value::Float(2.0).add(&s("")).unwrap(), s("2.0"));
    }

    #[test]
    fn map_union_right_wins() {
        let left = Value::map([(key("x"), Value::Int(1))]);
        let right = Value::map([(key("x"), Value::Int(2)), (key("y"), Value::Int(3))]);
        let union = left.add(&right).unwrap();
        assert_eq!(
            union,
            Value::map([(key("x"), Value::Int(2)), (key("y"), Value::Int(3))])
        );
        // Operands are untouched.
        assert_eq!(left, Value::map([(key("x"), Value::Int(1))]));
    }

    #[test]
    fn arithmetic_type_errors() {
        assert_eq!(
            s("a").sub(&Value::Int(1)),
            Err(ValueError::TypeMismatch {
                op: "-",
                left: TypeTag::Str,
                right: TypeTag::Int
            })
        );
        assert!(Value::Bool(true).add(&Value::Int(1)).is_err());
        assert!(Value::list(vec![]).add(&Value::list(vec![])).is_err());
    }

    #[test]
    fn bitwise_rules() {
        assert_eq!(Value::Int(6).bit_and(&Value::Int(3)).unwrap(), Value::Int(2));
        assert_eq!(
            Value::Bool(true).bit_or(&Value::Bool(false)).unwrap(),
            Value::Bool(true)
        );
        assert!(Value::Bool(true).bit_xor(&Value::Bool(false)).is_err());
        assert_eq!(Value::Int(1).shl(&Value::Int(65)).unwrap(), Value::Int(2));
        assert_eq!(Value::Int(-8).shr(&Value::Int(1)).unwrap(), Value::Int(-4));
        assert!(Value::Float(1.0).shl(&Value::Int(1)).is_err());
    }

    #[test]
    fn unary_rules() {
        assert_eq!(Value::Int(3).neg().unwrap(), Value::Int(-3));
        assert_eq!(Value::Float(1.5).plus().unwrap(), Value::Float(1.5));
        assert_eq!(Value::Int(0).bit_not().unwrap(), Value::Int(-1));
        assert!(Value::Float(1.0).bit_not().is_err());
        assert!(s("x").neg().is_err());
        assert_eq!(Value::Null.not().unwrap(), Value::Bool(true));
    }

    #[test]
    fn nan_comparisons_are_incomparable() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan.weak_compare(&Value::Int(1)), Ok(None));
        assert_eq!(nan.less_than(&Value::Float(0.0)), Ok(false));
        assert_eq!(nan.greater_equal(&Value::Float(0.0)), Ok(false));
    }

    #[test]
    fn ordering_rules() {
        assert_eq!(
            Value::Int(1).weak_compare(&Value::Float(1.0)),
            Ok(Some(Ordering::Equal))
        );
        assert_eq!(s("abc").weak_compare(&s("abd")), Ok(Some(Ordering::Less)));
        assert!(s("a").weak_compare(&Value::Int(1)).is_err());
        assert!(Value::list(vec![]).weak_compare(&Value::list(vec![])).is_err());
    }

    #[test]
    fn increment_in_place() {
        let mut v = Value::Int(1);
        v.increment(1).unwrap();
        assert_eq!(v, Value::Int(2));
        let mut f = Value::Float(0.5);
        f.increment(-1).unwrap();
        assert_eq!(f, Value::Float(-0.5));
        assert!(Value::Null.increment(1).is_err());
    }

    #[test]
    fn strict_and_lenient_index() {
        let list = Value::list(vec![Value::Int(10)]);
        let map = Value::map([(key("a"), Value::Int(1))]);

        assert_eq!(list.load_index(&Value::Int(0)).unwrap(), Value::Int(10));
        assert_eq!(
            list.load_index(&Value::Int(3)),
            Err(ValueError::IndexOutOfBounds { index: 3, len: 1 })
        );
        assert_eq!(list.load_index_or_null(&Value::Int(3)).unwrap(), Value::Null);

        assert_eq!(map.load_index(&s("a")).unwrap(), Value::Int(1));
        assert!(matches!(
            map.load_index(&s("b")),
            Err(ValueError::UndefinedKey { .. })
        ));
        assert_eq!(map.load_index_or_null(&s("b")).unwrap(), Value::Null);

        // Type errors are not softened.
        assert!(list.load_index_or_null(&s("x")).is_err());
    }

    #[test]
    fn string_index_yields_character() {
        assert_eq!(s("héllo").load_index(&Value::Int(1)).unwrap(), s("é"));
    }

    #[test]
    fn store_and_increment_through_containers() {
        let list = Value::list(vec![Value::Int(1), Value::Float(1.0)]);
        list.store_index(&Value::Int(0), Value::Int(5)).unwrap();
        list.increment_index(&Value::Int(0), 1).unwrap();
        list.increment_index(&Value::Int(1), -1).unwrap();
        assert_eq!(list, Value::list(vec![Value::Int(6), Value::Float(0.0)]));
        assert!(list.store_index(&Value::Int(2), Value::Null).is_err());

        let map = Value::map([]);
        map.store_index(&s("n"), Value::Int(0)).unwrap();
        map.increment_index(&s("n"), 1).unwrap();
        assert_eq!(map.load_index(&s("n")).unwrap(), Value::Int(1));
        assert!(map.increment_index(&s("missing"), 1).is_err());
    }

    #[test]
    fn containment() {
        let list = Value::list(vec![Value::Int(1), s("a")]);
        assert_eq!(list.contains(&s("a")), Ok(true));
        assert_eq!(list.contains(&Value::Float(1.0)), Ok(false));
        let map = Value::map([(key("k"), Value::Null)]);
        assert_eq!(map.contains(&s("k")), Ok(true));
        assert_eq!(map.contains(&Value::list(vec![])), Ok(false));
        assert_eq!(s("hello").contains(&s("ell")), Ok(true));
        assert!(Value::Int(1).contains(&Value::Int(1)).is_err());
    }

    #[test]
    fn append_to_self() {
        let text = s("ab");
        text.append(text.clone()).unwrap();
        assert_eq!(text, s("abab"));

        let list = Value::list(vec![]);
        list.append(Value::Int(1)).unwrap();
        assert_eq!(list.len(), Ok(1));
    }
}
