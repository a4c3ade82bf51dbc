//! Conversions between loosely-typed sheet data ([Value]) and typed field values.
//!
//! [FromRaw] is permissive about shape: a collection accepts a single element where a sequence
//! was expected. [IntoRaw] always yields plain built-in shaped data, which is what ends up in the
//! sheet file.

use std::hash::Hash;

use indexmap::IndexSet;
use serde_json::Value;

use crate::utils::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected}, found {found}")]
pub struct CastError {
    pub expected: &'static str,
    pub found: String,
}

impl CastError {
    pub fn new(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: found.to_string(),
        }
    }
}

pub trait FromRaw: Sized {
    fn from_raw(raw: &Value) -> Result<Self, CastError>;
}

pub trait IntoRaw {
    fn to_raw(&self) -> Value;
}

/// Normalizes a raw value into the canonical raw shape of `T`. This is what record construction
/// runs for every declared field.
pub fn coerce<T: FromRaw + IntoRaw>(raw: &Value) -> Result<Value, CastError> {
    T::from_raw(raw).map(|v| v.to_raw())
}

impl FromRaw for String {
    fn from_raw(raw: &Value) -> Result<Self, CastError> {
        match raw {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(CastError::new("string", other)),
        }
    }
}

impl IntoRaw for String {
    fn to_raw(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FromRaw for bool {
    fn from_raw(raw: &Value) -> Result<Self, CastError> {
        match raw {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            other => Err(CastError::new("boolean", other)),
        }
    }
}

impl IntoRaw for bool {
    fn to_raw(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromRaw for i64 {
    fn from_raw(raw: &Value) -> Result<Self, CastError> {
        match raw {
            Value::Number(n) => n.as_i64().ok_or_else(|| CastError::new("integer", raw)),
            Value::String(s) => s.trim().parse().map_err(|_| CastError::new("integer", raw)),
            other => Err(CastError::new("integer", other)),
        }
    }
}

impl IntoRaw for i64 {
    fn to_raw(&self) -> Value {
        Value::from(*self)
    }
}

impl FromRaw for Timestamp {
    fn from_raw(raw: &Value) -> Result<Self, CastError> {
        match raw {
            Value::String(s) => {
                Timestamp::from_absolute(s).map_err(|_| CastError::new("timestamp", raw))
            }
            other => Err(CastError::new("timestamp", other)),
        }
    }
}

impl IntoRaw for Timestamp {
    fn to_raw(&self) -> Value {
        Value::String(self.to_string())
    }
}

/// Each element is cast on its own. A lone element is a one-element sequence.
impl<T: FromRaw> FromRaw for Vec<T> {
    fn from_raw(raw: &Value) -> Result<Self, CastError> {
        match raw {
            Value::Array(items) => items.iter().map(T::from_raw).collect(),
            Value::Null => Ok(vec![]),
            single => Ok(vec![T::from_raw(single)?]),
        }
    }
}

impl<T: IntoRaw> IntoRaw for Vec<T> {
    fn to_raw(&self) -> Value {
        Value::Array(self.iter().map(IntoRaw::to_raw).collect())
    }
}

impl<T: FromRaw + Hash + Eq> FromRaw for IndexSet<T> {
    fn from_raw(raw: &Value) -> Result<Self, CastError> {
        Ok(Vec::<T>::from_raw(raw)?.into_iter().collect())
    }
}

impl<T: IntoRaw> IntoRaw for IndexSet<T> {
    fn to_raw(&self) -> Value {
        Value::Array(self.iter().map(IntoRaw::to_raw).collect())
    }
}
