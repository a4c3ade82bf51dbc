use std::fmt::Debug;

use tracing::debug;

use crate::error::{Error, Result};

use super::{
    raw::{coerce, FromRaw, IntoRaw},
    FieldDescriptor, Space,
};

/// A lazily resolved, cached, typed attribute of a record.
///
/// The raw value lives in the record's [Space] under the field's name. Reading resolves it (raw
/// value, then `default`, then `default_factory`), converts it to `T`, applies `cast` and caches
/// the result on the instance. Writing validates, replaces the raw value and drops the cache.
pub struct Field<T> {
    owner: &'static str,
    name: &'static str,
    default: Option<T>,
    default_factory: Option<fn() -> T>,
    cast: Option<fn(T) -> T>,
    validate: Option<fn(&T) -> bool>,
    optional: bool,
    cache: bool,
}

impl<T> Field<T>
where
    T: FromRaw + IntoRaw + Clone + Debug + 'static,
{
    pub fn new(owner: &'static str, name: &'static str) -> Self {
        Self {
            owner,
            name,
            default: None,
            default_factory: None,
            cast: None,
            validate: None,
            optional: false,
            cache: true,
        }
    }

    pub fn with_default(self, default: T) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    pub fn default_factory(self, factory: fn() -> T) -> Self {
        Self {
            default_factory: Some(factory),
            ..self
        }
    }

    pub fn cast(self, cast: fn(T) -> T) -> Self {
        Self {
            cast: Some(cast),
            ..self
        }
    }

    pub fn validate(self, validate: fn(&T) -> bool) -> Self {
        Self {
            validate: Some(validate),
            ..self
        }
    }

    pub fn optional(self) -> Self {
        Self {
            optional: true,
            ..self
        }
    }

    pub fn uncached(self) -> Self {
        Self {
            cache: false,
            ..self
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn descriptor(&self) -> FieldDescriptor {
        FieldDescriptor {
            name: self.name,
            coerce: coerce::<T>,
        }
    }

    /// Whether a raw value was given. Defaults don't count.
    pub fn is_set(&self, space: &Space) -> bool {
        !matches!(space.get(self.name), None | Some(serde_json::Value::Null))
    }

    /// Resolves the field. [None] only for an unset optional field without defaults.
    pub fn get(&self, space: &Space) -> Result<Option<T>> {
        if self.cache {
            if let Some(cached) = space.cached::<T>(self.name) {
                return Ok(Some(cached));
            }
        }

        let resolved = match space.get(self.name) {
            Some(raw) if !raw.is_null() => {
                Some(T::from_raw(raw).map_err(|source| Error::Cast {
                    owner: self.owner,
                    field: self.name,
                    source,
                })?)
            }
            _ => match (&self.default, self.default_factory) {
                (Some(default), _) => Some(default.clone()),
                (None, Some(factory)) => Some(factory()),
                (None, None) if self.optional => None,
                (None, None) => {
                    return Err(Error::UnsetRequiredField {
                        owner: self.owner,
                        field: self.name,
                    })
                }
            },
        };

        let Some(value) = resolved else {
            return Ok(None);
        };
        let value = match self.cast {
            Some(cast) => cast(value),
            None => value,
        };

        if self.cache {
            debug!("Caching {}.{} = {value:?}", self.owner, self.name);
            space.store_cache(self.name, value.clone());
        }
        Ok(Some(value))
    }

    /// Like [Field::get], but an unset optional field is an error as well.
    pub fn require(&self, space: &Space) -> Result<T> {
        self.get(space)?.ok_or(Error::UnsetRequiredField {
            owner: self.owner,
            field: self.name,
        })
    }

    /// Stores `value` as the new raw value. Cast runs on the next read.
    pub fn set(&self, space: &mut Space, value: T) -> Result<()> {
        self.check(&value)?;
        space.insert(self.name, value.to_raw());
        Ok(())
    }

    pub fn check(&self, value: &T) -> Result<()> {
        match self.validate {
            Some(validate) if !validate(value) => Err(Error::Validation {
                owner: self.owner,
                field: self.name,
                value: format!("{value:?}"),
            }),
            _ => Ok(()),
        }
    }

    /// Forgets both the raw and the cached value.
    pub fn clear(&self, space: &mut Space) {
        space.remove(self.name);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{error::Error, space::Space};

    use super::Field;

    fn upper(v: String) -> String {
        v.to_uppercase()
    }

    #[test]
    fn unset_required_field_fails() {
        let field = Field::<String>::new("Test", "name");
        let err = field.get(&Space::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsetRequiredField {
                owner: "Test",
                field: "name"
            }
        ));
    }

    #[test]
    fn unset_optional_field_resolves_defaults() {
        let space = Space::new();
        assert_eq!(Field::<String>::new("Test", "a").optional().get(&space).unwrap(), None);
        assert_eq!(
            Field::<i64>::new("Test", "b").optional().with_default(3).get(&space).unwrap(),
            Some(3)
        );
        assert_eq!(
            Field::<Vec<i64>>::new("Test", "c")
                .default_factory(Vec::new)
                .get(&space)
                .unwrap(),
            Some(vec![])
        );
    }

    #[test]
    fn static_default_wins_over_factory() {
        let field = Field::<i64>::new("Test", "n")
            .with_default(1)
            .default_factory(|| 2);
        assert_eq!(field.require(&Space::new()).unwrap(), 1);
    }

    #[test]
    fn read_after_write_is_cast() {
        let field = Field::<String>::new("Test", "level").cast(upper);
        let mut space = Space::new();
        field.set(&mut space, "debug".into()).unwrap();
        assert_eq!(space.get("level"), Some(&json!("debug")));
        assert_eq!(field.require(&space).unwrap(), "DEBUG");

        field.set(&mut space, "info".into()).unwrap();
        assert_eq!(field.require(&space).unwrap(), "INFO");
    }

    #[test]
    fn item_write_invalidates_cache() {
        let field = Field::<i64>::new("Test", "n");
        let mut space = Space::new();
        field.set(&mut space, 1).unwrap();
        assert_eq!(field.require(&space).unwrap(), 1);
        space.insert("n", json!(2));
        assert_eq!(field.require(&space).unwrap(), 2);
    }

    #[test]
    fn uncached_field_reconverts() {
        let field = Field::<i64>::new("Test", "n").uncached();
        let mut space = Space::new();
        field.set(&mut space, 1).unwrap();
        field.require(&space).unwrap();
        assert_eq!(space.cached::<i64>("n"), None);
    }

    #[test]
    fn rejected_write_keeps_previous_value() {
        let field = Field::<i64>::new("Test", "n").validate(|v| *v >= 0);
        let mut space = Space::new();
        field.set(&mut space, 4).unwrap();
        assert!(matches!(field.set(&mut space, -1), Err(Error::Validation { .. })));
        assert_eq!(field.require(&space).unwrap(), 4);
    }

    #[test]
    fn clear_goes_back_to_defaults() {
        let field = Field::<i64>::new("Test", "n").with_default(7);
        let mut space = Space::new();
        field.set(&mut space, 1).unwrap();
        assert_eq!(field.require(&space).unwrap(), 1);
        field.clear(&mut space);
        assert!(!field.is_set(&space));
        assert_eq!(field.require(&space).unwrap(), 7);
    }

    #[test]
    fn unreadable_raw_value_is_a_cast_error() {
        let mut space = Space::new();
        space.insert("n", json!({"not": "a number"}));
        let err = Field::<i64>::new("Test", "n").get(&space).unwrap_err();
        assert!(matches!(err, Error::Cast { field: "n", .. }));
    }

    #[test]
    fn instances_dont_share_state() {
        let field = Field::<i64>::new("Test", "n");
        let mut a = Space::new();
        let b = Space::new();
        field.set(&mut a, 1).unwrap();
        assert_eq!(field.require(&a).unwrap(), 1);
        assert!(field.get(&b).is_err());
    }
}
