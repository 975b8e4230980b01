//! Shared heap containers: string buffers, lists, and maps.
//!
//! Every container is a handle over `Arc<RwLock<_>>`. Cloning a handle
//! shares the container (the language's reference copy); the explicit
//! deep copy lives on [`Value::deep_clone`].
//!
//! Locking discipline: reads take recursive read locks so a container can
//! be read while another read of it is in progress on the same thread. A
//! write lock is held only for one container mutation and is never held
//! while any other container is locked. Concurrent writers to the same
//! container are serialized; there is no atomicity across containers.

use crate::error::ValueError;
use crate::type_tag::TypeTag;
use crate::value::Value;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Mutable, growable string buffer.
#[derive(Clone, Default)]
pub struct StrBuf(Arc<RwLock<String>>);

impl StrBuf {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(text.into())))
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> String {
        self.0.read_recursive().clone()
    }

    /// Run `f` against the current contents without copying them.
    pub fn with<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.0.read_recursive())
    }

    pub fn append(&self, text: &str) {
        self.0.write().push_str(text);
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.with(|s| s.chars().count())
    }

    pub fn is_empty(&self) -> bool {
        self.with(str::is_empty)
    }

    /// Character at `index`, as a one-character string.
    pub fn char_at(&self, index: i64) -> Result<String, ValueError> {
        self.with(|s| {
            usize::try_from(index)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(String::from)
                .ok_or(ValueError::IndexOutOfBounds {
                    index,
                    len: s.chars().count(),
                })
        })
    }

    /// True if both handles share one buffer.
    pub fn ptr_eq(&self, other: &StrBuf) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn content_eq(&self, other: &StrBuf) -> bool {
        self.ptr_eq(other) || self.with(|a| other.with(|b| a == b))
    }

    pub fn content_cmp(&self, other: &StrBuf) -> Ordering {
        if self.ptr_eq(other) {
            return Ordering::Equal;
        }
        self.with(|a| other.with(|b| a.cmp(b)))
    }
}

impl fmt::Debug for StrBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|s| write!(f, "{s:?}"))
    }
}

/// Zero-indexed, bounds-checked, mutable sequence of values.
#[derive(Clone, Default)]
pub struct List(Arc<RwLock<Vec<Value>>>);

impl List {
    pub fn new(items: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.read_recursive().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reference copy of the element at `index`.
    pub fn get(&self, index: i64) -> Result<Value, ValueError> {
        let items = self.0.read_recursive();
        checked_index(index, items.len()).map(|i| items[i].clone())
    }

    pub fn set(&self, index: i64, value: Value) -> Result<(), ValueError> {
        let mut items = self.0.write();
        let i = checked_index(index, items.len())?;
        items[i] = value;
        Ok(())
    }

    /// Mutate the element at `index` in place.
    pub fn update<R>(
        &self,
        index: i64,
        f: impl FnOnce(&mut Value) -> Result<R, ValueError>,
    ) -> Result<R, ValueError> {
        let mut items = self.0.write();
        let i = checked_index(index, items.len())?;
        f(&mut items[i])
    }

    pub fn push(&self, value: Value) {
        self.0.write().push(value);
    }

    pub fn contains(&self, item: &Value) -> bool {
        self.0.read_recursive().iter().any(|v| v.equals(item))
    }

    /// Reference copies of all elements.
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.read_recursive().clone()
    }

    /// Run `f` against the elements without copying them.
    pub fn with<R>(&self, f: impl FnOnce(&[Value]) -> R) -> R {
        f(&self.0.read_recursive())
    }

    pub fn ptr_eq(&self, other: &List) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the shared storage, for cycle tracking.
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

// Debug goes through the value printer so cycles end in a marker.
impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Value::List(self.clone()), f)
    }
}

fn checked_index(index: i64, len: usize) -> Result<usize, ValueError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or(ValueError::IndexOutOfBounds { index, len })
}

/// Scalar map key.
///
/// String keys are snapshots: mutating the buffer a key was taken from
/// does not rekey the map.
#[derive(Debug, Clone)]
pub enum MapKey {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl MapKey {
    /// Convert a value into a key. Lists, maps and `undefined` are rejected.
    pub fn from_value(value: &Value) -> Result<MapKey, ValueError> {
        match value {
            Value::Null => Ok(MapKey::Null),
            Value::Bool(b) => Ok(MapKey::Bool(*b)),
            Value::Int(i) => Ok(MapKey::Int(*i)),
            Value::Float(f) => Ok(MapKey::Float(*f)),
            Value::Str(s) => Ok(MapKey::Str(s.snapshot())),
            other => Err(ValueError::UnaryTypeMismatch {
                op: "map key",
                operand: other.type_tag(),
            }),
        }
    }

    /// Materialize the key as a fresh value.
    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Null => Value::Null,
            MapKey::Bool(b) => Value::Bool(*b),
            MapKey::Int(i) => Value::Int(*i),
            MapKey::Float(f) => Value::Float(*f),
            MapKey::Str(s) => Value::string(s.as_str()),
        }
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            MapKey::Null => TypeTag::Null,
            MapKey::Bool(_) => TypeTag::Bool,
            MapKey::Int(_) => TypeTag::Int,
            MapKey::Float(_) => TypeTag::Float,
            MapKey::Str(_) => TypeTag::Str,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            MapKey::Null => 0,
            MapKey::Bool(_) => 1,
            MapKey::Int(_) => 2,
            MapKey::Float(_) => 3,
            MapKey::Str(_) => 4,
        }
    }
}

impl Ord for MapKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (MapKey::Null, MapKey::Null) => Ordering::Equal,
            (MapKey::Bool(a), MapKey::Bool(b)) => a.cmp(b),
            (MapKey::Int(a), MapKey::Int(b)) => a.cmp(b),
            (MapKey::Float(a), MapKey::Float(b)) => a.total_cmp(b),
            (MapKey::Str(a), MapKey::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for MapKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MapKey {}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Str(s) => write!(f, "{s:?}"),
            other => write!(f, "{}", other.to_value()),
        }
    }
}

/// Key-ordered mapping from scalar keys to values.
#[derive(Clone, Default)]
pub struct Map(Arc<RwLock<BTreeMap<MapKey, Value>>>);

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (MapKey, Value)>) -> Self {
        Self(Arc::new(RwLock::new(entries.into_iter().collect())))
    }

    pub fn len(&self) -> usize {
        self.0.read_recursive().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &MapKey) -> Option<Value> {
        self.0.read_recursive().get(key).cloned()
    }

    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.0.read_recursive().contains_key(key)
    }

    /// Insert or replace; returns the previous value.
    pub fn insert(&self, key: MapKey, value: Value) -> Option<Value> {
        self.0.write().insert(key, value)
    }

    /// Mutate the entry for `key` in place. A missing key is `UndefinedKey`.
    pub fn update<R>(
        &self,
        key: &MapKey,
        f: impl FnOnce(&mut Value) -> Result<R, ValueError>,
    ) -> Result<R, ValueError> {
        let mut entries = self.0.write();
        match entries.get_mut(key) {
            Some(slot) => f(slot),
            None => Err(ValueError::UndefinedKey {
                key: key.to_string(),
            }),
        }
    }

    /// Reference copies of all entries, in key order.
    pub fn entries(&self) -> Vec<(MapKey, Value)> {
        self.0
            .read_recursive()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Run `f` against the entries without copying them.
    pub fn with<R>(&self, f: impl FnOnce(&BTreeMap<MapKey, Value>) -> R) -> R {
        f(&self.0.read_recursive())
    }

    pub fn ptr_eq(&self, other: &Map) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Value::Map(self.clone()), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_bounds_are_checked() {
        let list = List::new(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(list.get(1).unwrap(), Value::Int(2));
        assert_eq!(
            list.get(2),
            Err(ValueError::IndexOutOfBounds { index: 2, len: 2 })
        );
        assert_eq!(
            list.get(-1),
            Err(ValueError::IndexOutOfBounds { index: -1, len: 2 })
        );
        assert!(list.set(5, Value::Null).is_err());
    }

    #[test]
    fn cloned_handle_shares_storage() {
        let list = List::new(vec![]);
        let alias = list.clone();
        alias.push(Value::Int(9));
        assert_eq!(list.len(), 1);
        assert!(list.ptr_eq(&alias));
    }

    #[test]
    fn string_append_and_char_at() {
        let s = StrBuf::new("ab");
        s.append("cd");
        assert_eq!(s.snapshot(), "abcd");
        assert_eq!(s.len(), 4);
        assert_eq!(s.char_at(2).unwrap(), "c");
        assert!(s.char_at(4).is_err());
    }

    #[test]
    fn map_keys_order_by_kind_then_value() {
        let map = Map::new();
        map.insert(MapKey::Str("b".into()), Value::Int(1));
        map.insert(MapKey::Int(3), Value::Int(2));
        map.insert(MapKey::Str("a".into()), Value::Int(3));
        map.insert(MapKey::Null, Value::Int(4));
        let keys: Vec<MapKey> = map.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                MapKey::Null,
                MapKey::Int(3),
                MapKey::Str("a".into()),
                MapKey::Str("b".into()),
            ]
        );
    }

    #[test]
    fn int_and_float_keys_are_distinct() {
        let map = Map::new();
        map.insert(MapKey::Int(1), Value::string("int"));
        map.insert(MapKey::Float(1.0), Value::string("float"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn string_key_is_a_snapshot() {
        let text = StrBuf::new("k");
        let key = MapKey::from_value(&Value::Str(text.clone())).unwrap();
        text.append("!");
        assert_eq!(key, MapKey::Str("k".into()));
    }

    #[test]
    fn containers_are_not_keys() {
        assert!(MapKey::from_value(&Value::list(vec![])).is_err());
        assert!(MapKey::from_value(&Value::Undefined).is_err());
    }

    #[test]
    fn update_missing_key_is_undefined_key() {
        let map = Map::new();
        let err = map.update(&MapKey::Str("x".into()), |_| Ok(())).unwrap_err();
        assert_eq!(
            err,
            ValueError::UndefinedKey {
                key: "\"x\"".into()
            }
        );
    }
}
