use std::{
    fmt::Display,
    hash::{Hash, Hasher},
};

use chrono::{NaiveDate, NaiveTime};
use serde_json::{json, Map, Value};

use crate::{
    space::raw::{CastError, FromRaw, IntoRaw},
    utils::{
        text,
        time::{parse_time_of_day, Timestamp, TIME_FORMAT},
    },
};

/// Free text attached to an entry at some point in time.
///
/// Notes loaded from the sheet remember the value they were read from and are written back
/// exactly that way. A note may carry only a time of day (`{"10:30:00": ".."}`), which
/// [Note::anchored] places on the day of the owning entry, or no time at all.
#[derive(Debug, Clone)]
pub struct Note {
    pub time: Option<Timestamp>,
    pub content: String,
    time_of_day: Option<NaiveTime>,
    loaded: Option<Value>,
}

/// Reads the time part of a note. A bare time of day isn't placed on any date yet.
fn read_time(value: &str) -> Option<(Option<Timestamp>, Option<NaiveTime>)> {
    match parse_time_of_day(value) {
        Some(time) => Some((None, Some(time))),
        None => Timestamp::from_absolute(value)
            .ok()
            .map(|time| (Some(time), None)),
    }
}

/// Splits `"content (time)"` into its parts.
fn split_trailing_time(value: &str) -> Option<(&str, &str)> {
    value
        .trim()
        .strip_suffix(')')
        .and_then(|v| v.rsplit_once(" ("))
        .map(|(content, time)| (content.trim(), time))
}

impl Note {
    pub fn new(content: impl Into<String>, time: Timestamp) -> Self {
        Self {
            content: content.into(),
            time: Some(time),
            time_of_day: None,
            loaded: None,
        }
    }

    /// Parses `"content (10:30:00)"` or `"content (01/12/21 10:30:00)"`. A time of day is placed
    /// on the date of `now`, and without a trailing time the note is timed `now`.
    pub fn parse(value: &str, now: Timestamp) -> Self {
        let timed = split_trailing_time(value).and_then(|(content, time)| {
            Timestamp::from_absolute_on(time, now.date())
                .ok()
                .map(|time| Note::new(content, time))
        });
        timed.unwrap_or_else(|| Note::new(value.trim(), now))
    }

    /// Places a note that only knows its time of day on `day`. Other notes are returned as is.
    pub fn anchored(mut self, day: NaiveDate) -> Self {
        if let (None, Some(time)) = (self.time, self.time_of_day) {
            self.time = Timestamp::from_naive(day.and_time(time));
        }
        self
    }

    pub fn is_similar(&self, other: &str) -> bool {
        text::is_similar(&self.content, other)
    }
}

impl From<&Note> for Note {
    fn from(value: &Note) -> Self {
        value.clone()
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
            && self.time == other.time
            && self.time_of_day == other.time_of_day
    }
}

impl Eq for Note {}

impl Hash for Note {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.content.hash(state);
        self.time.hash(state);
        self.time_of_day.hash(state);
    }
}

impl Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.time, self.time_of_day) {
            (Some(time), _) => write!(f, "{} ({})", self.content, time.hhmmss()),
            (None, Some(time)) => write!(f, "{} ({})", self.content, time.format(TIME_FORMAT)),
            (None, None) => write!(f, "{}", self.content),
        }
    }
}

/// Accepts `{"time": .., "content": ..}`, the sheet shorthand `{"10:30:00": "content"}`, or a
/// plain string, optionally ending with `" (time)"`.
impl FromRaw for Note {
    fn from_raw(raw: &Value) -> Result<Self, CastError> {
        let (content, (time, time_of_day)) = match raw {
            Value::String(s) => match split_trailing_time(s) {
                Some((content, time)) => match read_time(time) {
                    Some(time) => (content.to_string(), time),
                    None => (s.trim().to_string(), (None, None)),
                },
                None => (s.trim().to_string(), (None, None)),
            },
            Value::Object(map) if map.contains_key("content") => {
                let content = String::from_raw(&map["content"])?;
                let time = match map.get("time") {
                    Some(Value::String(time)) => {
                        read_time(time).ok_or_else(|| CastError::new("note time", raw))?
                    }
                    None | Some(Value::Null) => (None, None),
                    Some(other) => return Err(CastError::new("note time", other)),
                };
                (content, time)
            }
            Value::Object(map) if map.len() == 1 => {
                let (time, content) = map.iter().next().ok_or_else(|| CastError::new("note", raw))?;
                let time = read_time(time).ok_or_else(|| CastError::new("note", raw))?;
                (String::from_raw(content)?, time)
            }
            other => return Err(CastError::new("note", other)),
        };
        Ok(Note {
            content,
            time,
            time_of_day,
            loaded: Some(raw.clone()),
        })
    }
}

impl IntoRaw for Note {
    fn to_raw(&self) -> Value {
        if let Some(loaded) = &self.loaded {
            return loaded.clone();
        }
        match (self.time, self.time_of_day) {
            (Some(time), _) => json!({
                "time": time.to_string(),
                "content": self.content,
            }),
            (None, Some(time)) => {
                let mut map = Map::new();
                map.insert(time.format(TIME_FORMAT).to_string(), json!(self.content));
                Value::Object(map)
            }
            (None, None) => Value::String(self.content.clone()),
        }
    }
}
