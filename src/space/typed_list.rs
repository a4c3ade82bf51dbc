use serde_json::Value;
use tracing::warn;

use super::raw::{CastError, FromRaw, IntoRaw};

/// Slot of a [TypedList].
#[derive(Debug, Clone, PartialEq)]
pub enum Item<T> {
    /// Loaded element that couldn't be converted. Written back untouched.
    Raw(Value),
    Built(T),
}

impl<T> Item<T> {
    fn built(&self) -> Option<&T> {
        match self {
            Item::Built(item) => Some(item),
            Item::Raw(_) => None,
        }
    }

    fn built_mut(&mut self) -> Option<&mut T> {
        match self {
            Item::Built(item) => Some(item),
            Item::Raw(_) => None,
        }
    }
}

pub type Iter<'a, T> = std::iter::FilterMap<std::slice::Iter<'a, Item<T>>, fn(&Item<T>) -> Option<&T>>;
pub type IterMut<'a, T> =
    std::iter::FilterMap<std::slice::IterMut<'a, Item<T>>, fn(&mut Item<T>) -> Option<&mut T>>;

/// An ordered sequence whose elements are always `T`. Raw elements are converted on insertion.
///
/// Loaded elements that aren't a `T` stay in place as raw values. They are invisible to typed
/// access but keep their position when the list is written back.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedList<T> {
    items: Vec<Item<T>>,
}

impl<T> Default for TypedList<T> {
    fn default() -> Self {
        Self { items: vec![] }
    }
}

impl<T: FromRaw + IntoRaw> TypedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a sequence or a single element.
    pub fn from_raw(raw: &Value) -> Self {
        let raw_items: &[Value] = match raw {
            Value::Array(items) => items.as_slice(),
            Value::Null => &[],
            single => std::slice::from_ref(single),
        };
        let mut list = Self::new();
        for raw_item in raw_items {
            if let Err(e) = list.push_raw(raw_item) {
                warn!("Keeping unreadable element {raw_item} as is: {e}");
                list.items.push(Item::Raw(raw_item.clone()));
            }
        }
        list
    }

    pub fn push(&mut self, item: impl Into<T>) {
        self.items.push(Item::Built(item.into()));
    }

    pub fn push_raw(&mut self, raw: &Value) -> Result<(), CastError> {
        self.items.push(Item::Built(T::from_raw(raw)?));
        Ok(())
    }

    /// Removes and returns the last typed element. Raw elements stay where they are.
    pub fn pop(&mut self) -> Option<T> {
        let index = self
            .items
            .iter()
            .rposition(|item| matches!(item, Item::Built(_)))?;
        match self.items.remove(index) {
            Item::Built(item) => Some(item),
            Item::Raw(_) => None,
        }
    }

    pub fn last(&self) -> Option<&T> {
        self.items.iter().rev().find_map(Item::built)
    }

    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.items.iter_mut().rev().find_map(Item::built_mut)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.items.iter().filter_map(Item::built as fn(&Item<T>) -> Option<&T>)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        self.items
            .iter_mut()
            .filter_map(Item::built_mut as fn(&mut Item<T>) -> Option<&mut T>)
    }

    /// Number of typed elements.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_raw(&self) -> Value {
        Value::Array(
            self.items
                .iter()
                .map(|item| match item {
                    Item::Raw(raw) => raw.clone(),
                    Item::Built(item) => item.to_raw(),
                })
                .collect(),
        )
    }
}

impl<'a, T: FromRaw + IntoRaw> IntoIterator for &'a TypedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> FromIterator<T> for TypedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Item::Built).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::TypedList;

    #[test]
    fn single_element_is_a_list() {
        let list = TypedList::<i64>::from_raw(&json!(4));
        assert_eq!(list.len(), 1);
        assert_eq!(list.last(), Some(&4));
    }

    #[test]
    fn unconvertible_elements_are_kept_raw() {
        let list = TypedList::<i64>::from_raw(&json!([1, "2", {"x": 3}]));
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.to_raw(), json!([1, 2, {"x": 3}]));
    }

    #[test]
    fn typed_access_skips_raw_elements() {
        let mut list = TypedList::<i64>::from_raw(&json!([1, "half past ten"]));
        assert_eq!(list.last(), Some(&1));
        if let Some(last) = list.last_mut() {
            *last = 7;
        }
        list.push(8);
        assert_eq!(list.to_raw(), json!([7, "half past ten", 8]));

        assert_eq!(list.pop(), Some(8));
        assert_eq!(list.pop(), Some(7));
        assert_eq!(list.pop(), None);
        assert_eq!(list.to_raw(), json!(["half past ten"]));
    }

    #[test]
    fn raw_insertion_is_converted() {
        let mut list = TypedList::<bool>::new();
        list.push_raw(&json!("true")).unwrap();
        list.push(false);
        assert!(list.push_raw(&json!([])).is_err());
        assert_eq!(list.to_raw(), json!([true, false]));
    }
}
