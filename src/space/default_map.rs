use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Values a [DefaultMap] can manufacture for a key.
pub trait Vivify: Sized {
    /// Builds the default value for a missing key.
    fn vivify(key: &str) -> Self;

    /// Rebuilds a value that is still in its raw, loaded form.
    fn revive(raw: Value, key: &str) -> Self;

    fn to_raw(&self) -> Value;
}

#[derive(Debug, Clone, PartialEq)]
enum Slot<V> {
    Raw(Value),
    Built(V),
}

/// Key under which a non-mapping value the map was loaded from is written back once keys were
/// added to it.
pub const UNREADABLE_KEY: &str = "_unreadable";

/// An insertion ordered mapping that never misses: looking up an absent key stores and returns
/// `V::vivify(key)`, and a value still in raw form is rebuilt into `V` on first access.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultMap<V> {
    slots: IndexMap<String, Slot<V>>,
    unreadable: Option<Value>,
}

impl<V> Default for DefaultMap<V> {
    fn default() -> Self {
        Self {
            slots: IndexMap::new(),
            unreadable: None,
        }
    }
}

impl<V: Vivify> DefaultMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps every value of a raw mapping as is. They are turned into `V` lazily.
    ///
    /// Anything other than a mapping starts an empty map that still remembers the value. It's
    /// written back unchanged while the map stays empty, and under [UNREADABLE_KEY] otherwise.
    pub fn from_raw(raw: &Value) -> Self {
        match raw {
            Value::Object(map) => Self {
                slots: map
                    .iter()
                    .map(|(k, v)| (k.clone(), Slot::Raw(v.clone())))
                    .collect(),
                unreadable: None,
            },
            Value::Null => Self::default(),
            other => {
                warn!("Expected a mapping, found {other}. Keeping it as is");
                Self {
                    slots: IndexMap::new(),
                    unreadable: Some(other.clone()),
                }
            }
        }
    }

    /// Returns the value under `key`, creating or rebuilding it first if needed.
    pub fn vivify(&mut self, key: &str) -> &mut V {
        let slot = self.slots.entry(key.to_string()).or_insert_with(|| {
            debug!("Vivifying {key:?}");
            Slot::Built(V::vivify(key))
        });
        if let Slot::Raw(raw) = &mut *slot {
            debug!("Reviving {key:?}");
            let raw = std::mem::take(raw);
            *slot = Slot::Built(V::revive(raw, key));
        }
        match slot {
            Slot::Built(v) => v,
            Slot::Raw(_) => unreachable!("raw slots are rebuilt above"),
        }
    }

    /// Returns the value under `key` only if it's present and already built.
    pub fn get(&self, key: &str) -> Option<&V> {
        match self.slots.get(key) {
            Some(Slot::Built(v)) => Some(v),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        match self.slots.insert(key.into(), Slot::Built(value)) {
            Some(Slot::Built(v)) => Some(v),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Builds every raw value and iterates in insertion order.
    pub fn values_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut V> {
        self.build_all();
        self.slots.values_mut().map(|slot| match slot {
            Slot::Built(v) => v,
            Slot::Raw(_) => unreachable!("every slot was built"),
        })
    }

    /// Iterates over the values that are already built, in insertion order.
    pub fn built(&self) -> impl DoubleEndedIterator<Item = (&str, &V)> {
        self.slots.iter().filter_map(|(k, slot)| match slot {
            Slot::Built(v) => Some((k.as_str(), v)),
            Slot::Raw(_) => None,
        })
    }

    pub fn build_all(&mut self) {
        let keys = self.slots.keys().cloned().collect::<Vec<_>>();
        for key in keys {
            self.vivify(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn to_raw(&self) -> Value {
        if let (Some(unreadable), true) = (&self.unreadable, self.slots.is_empty()) {
            return unreadable.clone();
        }
        let mut map = self
            .slots
            .iter()
            .map(|(k, slot)| {
                let raw = match slot {
                    Slot::Raw(raw) => raw.clone(),
                    Slot::Built(v) => v.to_raw(),
                };
                (k.clone(), raw)
            })
            .collect::<Map<_, _>>();
        if let Some(unreadable) = &self.unreadable {
            map.insert(UNREADABLE_KEY.to_string(), unreadable.clone());
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{DefaultMap, Vivify, UNREADABLE_KEY};

    #[derive(Debug, PartialEq)]
    struct Counter {
        key: String,
        revived: bool,
        value: i64,
    }

    impl Vivify for Counter {
        fn vivify(key: &str) -> Self {
            Self {
                key: key.into(),
                revived: false,
                value: 0,
            }
        }

        fn revive(raw: Value, key: &str) -> Self {
            Self {
                key: key.into(),
                revived: true,
                value: raw.as_i64().unwrap_or_default(),
            }
        }

        fn to_raw(&self) -> Value {
            json!(self.value)
        }
    }

    #[test]
    fn absent_key_is_created_and_kept() {
        let mut map = DefaultMap::<Counter>::new();
        map.vivify("a").value = 5;
        assert!(map.contains_key("a"));
        assert_eq!(map.vivify("a").value, 5);
        assert_eq!(map.vivify("a").key, "a");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn raw_value_is_rebuilt_once() {
        let mut map = DefaultMap::<Counter>::from_raw(&json!({"a": 3}));
        assert!(map.get("a").is_none());
        let counter = map.vivify("a");
        assert!(counter.revived);
        assert_eq!(counter.value, 3);
        counter.value = 4;
        assert_eq!(map.get("a").map(|c| c.value), Some(4));
        assert_eq!(map.vivify("a").value, 4);
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut map = DefaultMap::<Counter>::from_raw(&json!({"b": 1, "a": 2}));
        map.vivify("c");
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(map.keys().rev().next(), Some("c"));
        assert_eq!(map.to_raw(), json!({"b": 1, "a": 2, "c": 0}));
    }

    #[test]
    fn values_mut_builds_everything() {
        let mut map = DefaultMap::<Counter>::from_raw(&json!({"a": 1, "b": 2}));
        let sum: i64 = map.values_mut().map(|c| c.value).sum();
        assert_eq!(sum, 3);
        assert_eq!(map.built().count(), 2);
    }

    #[test]
    fn non_mapping_is_written_back() {
        let map = DefaultMap::<Counter>::from_raw(&json!(["oops"]));
        assert!(map.is_empty());
        assert_eq!(map.to_raw(), json!(["oops"]));

        let mut map = DefaultMap::<Counter>::from_raw(&json!("oops"));
        map.vivify("a").value = 1;
        assert_eq!(map.to_raw(), json!({"a": 1, "_unreadable": "oops"}));
        assert_eq!(map.to_raw()[UNREADABLE_KEY], json!("oops"));
    }
}
