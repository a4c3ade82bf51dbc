//! Records backed by an ordered key-value container.
//!
//! A [Space] is the single source of truth of a record: typed accessors declared with
//! [field::Field] read and write its entries, and a per-instance cache keeps converted values
//! around until the entry changes. [typed_list::TypedList] and [default_map::DefaultMap] build
//! the ledger's collections on top of it.

pub mod default_map;
pub mod field;
pub mod raw;
pub mod typed_list;

use std::{
    any::Any,
    cell::RefCell,
    collections::HashMap,
    fmt::{Debug, Write},
};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::warn;

use raw::CastError;

/// Statically declared shape of a record field. Construction runs raw input through `coerce`.
#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub coerce: fn(&Value) -> Result<Value, CastError>,
}

/// A type whose attributes live in a [Space].
pub trait Record {
    /// Type name used in error messages and representations.
    const NAME: &'static str;

    fn descriptors() -> Vec<FieldDescriptor>;

    fn space(&self) -> &Space;

    /// The space a record of this type is built on, coerced from raw data.
    fn coerce_space(raw: &Value) -> Space
    where
        Self: Sized,
    {
        Space::coerced(Self::NAME, raw, &Self::descriptors())
    }

    fn repr(&self, private: bool, dunder: bool) -> String {
        self.space().repr(Self::NAME, private, dunder)
    }
}

#[derive(Default)]
pub struct Space {
    data: IndexMap<String, Value>,
    cache: RefCell<HashMap<&'static str, Box<dyn Any>>>,
}

impl Space {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a space out of a raw mapping. Declared fields are normalized by their descriptor;
    /// a field that fails to coerce keeps its raw value. Anything that isn't a mapping yields an
    /// empty space.
    pub fn coerced(owner: &'static str, raw: &Value, descriptors: &[FieldDescriptor]) -> Self {
        let Value::Object(map) = raw else {
            if !raw.is_null() {
                warn!("{owner} can't be built from non-mapping {raw}, starting empty");
            }
            return Self::new();
        };

        let mut data = IndexMap::with_capacity(map.len());
        for (key, value) in map {
            let descriptor = descriptors.iter().find(|d| d.name == key);
            let value = match descriptor {
                Some(descriptor) if !value.is_null() => match (descriptor.coerce)(value) {
                    Ok(coerced) => coerced,
                    Err(e) => {
                        warn!("Keeping raw value of {owner}.{key}: {e}");
                        value.clone()
                    }
                },
                _ => value.clone(),
            };
            data.insert(key.clone(), value);
        }
        Self {
            data,
            cache: RefCell::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Item-level write. Any cached attribute of the same name is dropped.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        self.invalidate(&key);
        self.data.insert(key, value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.invalidate(key);
        self.data.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Views a nested mapping as a space of its own. Returns [None] if the key is missing or
    /// doesn't hold a mapping.
    pub fn child(&self, key: &str) -> Option<Space> {
        match self.data.get(key) {
            Some(v @ Value::Object(_)) => Some(Space::coerced("Space", v, &[])),
            _ => None,
        }
    }

    pub fn to_raw(&self) -> Value {
        Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<_, _>>(),
        )
    }

    /// Ordered, one entry per line representation. Keys starting with `_` are shown only with
    /// `private`, keys starting with `__` only with `dunder`.
    pub fn repr(&self, name: &str, private: bool, dunder: bool) -> String {
        let visible = self
            .data
            .iter()
            .filter(|(k, _)| private || !k.starts_with('_') || (dunder && k.starts_with("__")))
            .filter(|(k, _)| dunder || !k.starts_with("__"))
            .collect::<Vec<_>>();
        if visible.is_empty() {
            return format!("{name}({{}})");
        }
        let width = visible.iter().map(|(k, _)| k.len()).max().unwrap_or_default();
        let mut rv = format!("{name}({{\n");
        for (k, v) in visible {
            let _ = writeln!(rv, "  {k:<width$} : {v},");
        }
        rv.push_str("})");
        rv
    }

    pub(crate) fn cached<T: Clone + 'static>(&self, field: &str) -> Option<T> {
        self.cache
            .borrow()
            .get(field)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    pub(crate) fn store_cache<T: 'static>(&self, field: &'static str, value: T) {
        self.cache.borrow_mut().insert(field, Box::new(value));
    }

    fn invalidate(&self, field: &str) {
        self.cache.borrow_mut().remove(field);
    }
}

/// Copies the container. The copy starts with a cold cache.
impl Clone for Space {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            cache: RefCell::default(),
        }
    }
}

impl PartialEq for Space {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Debug for Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{raw::coerce, FieldDescriptor, Space};

    const DESCRIPTORS: [FieldDescriptor; 1] = [FieldDescriptor {
        name: "count",
        coerce: coerce::<i64>,
    }];

    #[test]
    fn construction_coerces_declared_fields() {
        let space = Space::coerced("Test", &json!({"count": "5", "other": "5"}), &DESCRIPTORS);
        assert_eq!(space.get("count"), Some(&json!(5)));
        assert_eq!(space.get("other"), Some(&json!("5")));
    }

    #[test]
    fn failed_coercion_keeps_raw() {
        let space = Space::coerced("Test", &json!({"count": "many"}), &DESCRIPTORS);
        assert_eq!(space.get("count"), Some(&json!("many")));
    }

    #[test]
    fn nested_mapping_is_a_child_space() {
        let space = Space::coerced("Test", &json!({"nested": {"a": 1}, "flat": 2}), &[]);
        let child = space.child("nested").unwrap();
        assert_eq!(child.get("a"), Some(&json!(1)));
        assert!(space.child("flat").is_none());
        assert_eq!(space.to_raw(), json!({"nested": {"a": 1}, "flat": 2}));
    }

    #[test]
    fn non_mapping_starts_empty() {
        assert!(Space::coerced("Test", &json!([1, 2]), &DESCRIPTORS).is_empty());
    }

    #[test]
    fn equality_ignores_cache() {
        let a = Space::coerced("Test", &json!({"count": 1}), &DESCRIPTORS);
        let b = a.clone();
        a.store_cache("count", 1_i64);
        assert_eq!(a, b);
    }

    #[test]
    fn repr_hides_private_keys() {
        let space = Space::coerced("Test", &json!({"name": "x", "_hidden": 1, "__meta": 2}), &[]);
        assert_eq!(space.repr("Test", false, false), "Test({\n  name : \"x\",\n})");
        let all = space.repr("Test", true, true);
        assert!(all.contains("_hidden") && all.contains("__meta"));
        assert_eq!(Space::new().repr("Test", false, false), "Test({})");
    }
}
