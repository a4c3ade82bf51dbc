use std::fmt::Display;

use serde_json::Value;

use crate::space::raw::{CastError, FromRaw, IntoRaw};

/// Reference to an external ticket, e.g. `ASM-13925`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JiraTicket(String);

impl JiraTicket {
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JiraTicket {
    fn from(value: &str) -> Self {
        JiraTicket::new(value)
    }
}

impl From<&JiraTicket> for JiraTicket {
    fn from(value: &JiraTicket) -> Self {
        JiraTicket::new(&value.0)
    }
}

impl Display for JiraTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromRaw for JiraTicket {
    fn from_raw(raw: &Value) -> Result<Self, CastError> {
        match raw {
            Value::String(s) if !s.trim().is_empty() => Ok(JiraTicket::new(s)),
            other => Err(CastError::new("ticket reference", other)),
        }
    }
}

impl IntoRaw for JiraTicket {
    fn to_raw(&self) -> Value {
        Value::String(self.0.clone())
    }
}
