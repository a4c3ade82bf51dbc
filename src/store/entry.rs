use std::{fmt::Display, sync::LazyLock};

use chrono::Duration;
use indexmap::IndexSet;
use serde_json::Value;

use crate::{
    error::Result,
    space::{
        field::Field,
        raw::{CastError, FromRaw, IntoRaw},
        FieldDescriptor, Record, Space,
    },
    utils::time::Timestamp,
};

use super::{jira::JiraTicket, note::Note, tag::Tag};

static START: LazyLock<Field<Timestamp>> = LazyLock::new(|| Field::new(Entry::NAME, "start"));
static END: LazyLock<Field<Timestamp>> =
    LazyLock::new(|| Field::new(Entry::NAME, "end").optional());
static NOTES: LazyLock<Field<Vec<Note>>> =
    LazyLock::new(|| Field::new(Entry::NAME, "notes").default_factory(Vec::new));
static TAGS: LazyLock<Field<IndexSet<Tag>>> =
    LazyLock::new(|| Field::new(Entry::NAME, "tags").default_factory(IndexSet::new));
static SYNCED: LazyLock<Field<bool>> =
    LazyLock::new(|| Field::new(Entry::NAME, "synced").with_default(false));
static JIRA: LazyLock<Field<JiraTicket>> =
    LazyLock::new(|| Field::new(Entry::NAME, "jira").optional());

/// One contiguous interval of work. An entry without `end` is still ongoing.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    space: Space,
}

impl Record for Entry {
    const NAME: &'static str = "Entry";

    fn descriptors() -> Vec<FieldDescriptor> {
        vec![
            START.descriptor(),
            END.descriptor(),
            NOTES.descriptor(),
            TAGS.descriptor(),
            SYNCED.descriptor(),
            JIRA.descriptor(),
        ]
    }

    fn space(&self) -> &Space {
        &self.space
    }

}

impl Entry {
    pub fn new(start: Timestamp) -> Self {
        let mut space = Space::new();
        space.insert(START.name(), start.to_raw());
        Self { space }
    }

    pub fn start(&self) -> Result<Timestamp> {
        START.require(&self.space)
    }

    pub fn end(&self) -> Result<Option<Timestamp>> {
        END.get(&self.space)
    }

    pub fn set_end(&mut self, end: Timestamp) -> Result<()> {
        END.set(&mut self.space, end)
    }

    pub fn is_open(&self) -> bool {
        !END.is_set(&self.space)
    }

    /// Notes that only know their time of day are placed on the day the entry started.
    pub fn notes(&self) -> Result<Vec<Note>> {
        let notes = NOTES.require(&self.space)?;
        Ok(match self.start() {
            Ok(start) => notes.into_iter().map(|note| note.anchored(start.date())).collect(),
            Err(_) => notes,
        })
    }

    pub fn add_note(&mut self, note: Note) -> Result<()> {
        let mut notes = self.notes()?;
        notes.push(note);
        NOTES.set(&mut self.space, notes)
    }

    pub fn tags(&self) -> Result<IndexSet<Tag>> {
        TAGS.require(&self.space)
    }

    /// Empty tags are ignored, a tag already present is kept once.
    pub fn add_tag(&mut self, tag: impl Into<Tag>) -> Result<()> {
        let tag = tag.into();
        if tag.is_empty() {
            return Ok(());
        }
        let mut tags = self.tags()?;
        if tags.insert(tag) {
            TAGS.set(&mut self.space, tags)?;
        }
        Ok(())
    }

    pub fn synced(&self) -> Result<bool> {
        SYNCED.require(&self.space)
    }

    pub fn jira(&self) -> Result<Option<JiraTicket>> {
        JIRA.get(&self.space)
    }

    pub fn set_jira(&mut self, ticket: JiraTicket) -> Result<()> {
        JIRA.set(&mut self.space, ticket)
    }

    /// Length of the interval. Open entries are measured up to `now`.
    pub fn duration(&self, now: Timestamp) -> Result<Duration> {
        let end = self.end()?.unwrap_or(now);
        Ok(end - self.start()?)
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.start(), self.end()) {
            (Ok(start), Ok(Some(end))) => write!(f, "{} → {}", start.hhmmss(), end.hhmmss()),
            (Ok(start), _) => write!(f, "{} →", start.hhmmss()),
            _ => write!(f, "{}", self.repr(false, false)),
        }
    }
}

/// A mapping is a full entry. A lone time is the sheet shorthand for an entry starting then.
impl FromRaw for Entry {
    fn from_raw(raw: &Value) -> Result<Self, CastError> {
        match raw {
            Value::Object(_) => Ok(Entry {
                space: Entry::coerce_space(raw),
            }),
            Value::String(_) => Ok(Entry::new(Timestamp::from_raw(raw)?)),
            other => Err(CastError::new("entry", other)),
        }
    }
}

impl IntoRaw for Entry {
    fn to_raw(&self) -> Value {
        self.space.to_raw()
    }
}
