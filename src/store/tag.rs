use std::fmt::Display;

use serde_json::Value;

use crate::space::raw::{CastError, FromRaw, IntoRaw};

/// A label attached to entries. Stored trimmed, lower-cased and without a leading `#`, so
/// building a tag out of a tag gives the same tag back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(String);

impl Tag {
    pub fn new(value: impl AsRef<str>) -> Self {
        let value = value.as_ref().trim();
        let value = value.strip_prefix('#').unwrap_or(value).trim();
        Self(value.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Tag::new(value)
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Tag::new(value)
    }
}

impl From<&Tag> for Tag {
    fn from(value: &Tag) -> Self {
        Tag::new(&value.0)
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromRaw for Tag {
    fn from_raw(raw: &Value) -> Result<Self, CastError> {
        match raw {
            Value::String(s) => Ok(Tag::new(s)),
            other => Err(CastError::new("tag", other)),
        }
    }
}

impl IntoRaw for Tag {
    fn to_raw(&self) -> Value {
        Value::String(self.0.clone())
    }
}
