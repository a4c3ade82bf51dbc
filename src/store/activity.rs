use std::{fmt::Display, sync::LazyLock};

use chrono::Duration;
use indexmap::IndexSet;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    space::{
        default_map::Vivify,
        field::Field,
        raw::IntoRaw,
        typed_list::TypedList,
        FieldDescriptor, Record, Space,
    },
    utils::{text, time::Timestamp},
};

use super::{entry::Entry, jira::JiraTicket, note::Note, tag::Tag};

fn trim_name(name: String) -> String {
    name.trim().to_string()
}

static NAME: LazyLock<Field<String>> = LazyLock::new(|| {
    Field::new(Activity::NAME, "name")
        .cast(trim_name)
        .validate(|name| !name.trim().is_empty())
});
static JIRA: LazyLock<Field<JiraTicket>> =
    LazyLock::new(|| Field::new(Activity::NAME, "jira").optional());

/// A named task, worked on in one or more [Entry] intervals. Only the last entry may be open.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    space: Space,
    entries: TypedList<Entry>,
}

impl Record for Activity {
    const NAME: &'static str = "Activity";

    fn descriptors() -> Vec<FieldDescriptor> {
        vec![NAME.descriptor(), JIRA.descriptor()]
    }

    fn space(&self) -> &Space {
        &self.space
    }

}

impl Activity {
    pub fn new(name: &str) -> Self {
        let mut space = Space::new();
        space.insert(NAME.name(), name.to_string().to_raw());
        Self {
            space,
            entries: TypedList::new(),
        }
    }

    /// Builds an activity out of its loaded entries. The ticket reference is stored per entry in
    /// the sheet, the last one found wins.
    pub fn from_raw(raw: &Value, name: &str) -> Self {
        let mut activity = Self::new(name);
        activity.entries = TypedList::from_raw(raw);
        let ticket = activity
            .entries
            .iter()
            .rev()
            .find_map(|entry| entry.jira().ok().flatten());
        if let Some(ticket) = ticket {
            activity.space.insert(JIRA.name(), ticket.to_raw());
        }
        activity
    }

    pub fn validate_name(name: &str) -> Result<()> {
        NAME.check(&name.to_string())
    }

    pub fn name(&self) -> Result<String> {
        NAME.require(&self.space)
    }

    pub fn jira(&self) -> Result<Option<JiraTicket>> {
        JIRA.get(&self.space)
    }

    /// Sets the ticket on the activity and on every entry, so it survives a save.
    pub fn set_jira(&mut self, ticket: JiraTicket) -> Result<()> {
        for entry in self.entries.iter_mut() {
            entry.set_jira(ticket.clone())?;
        }
        JIRA.set(&mut self.space, ticket)
    }

    pub fn entries(&self) -> &TypedList<Entry> {
        &self.entries
    }

    pub fn last_entry(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn last_entry_mut(&mut self) -> Option<&mut Entry> {
        self.entries.last_mut()
    }

    pub fn ongoing(&self) -> bool {
        self.last_entry().is_some_and(Entry::is_open)
    }

    /// Case, whitespace and punctuation insensitive containment match.
    pub fn has_similar_name(&self, other: &str) -> bool {
        self.name().is_ok_and(|name| text::is_similar(&name, other))
    }

    /// Opens a new entry at `time`, or now.
    pub fn start(
        &mut self,
        time: Option<Timestamp>,
        tag: Option<Tag>,
        note: Option<Note>,
    ) -> Result<&mut Entry> {
        if self.ongoing() {
            return Err(Error::AlreadyOngoing(self.shortrepr()));
        }
        let label = self.to_string();
        let time = time.unwrap_or_else(Timestamp::now);
        let mut entry = Entry::new(time);
        if let Some(tag) = tag {
            entry.add_tag(tag)?;
        }
        if let Some(note) = note {
            entry.add_note(note)?;
        }
        if let Some(ticket) = self.jira()? {
            entry.set_jira(ticket)?;
        }
        info!("Starting {label} at {time}");
        self.entries.push(entry);
        self.entries.last_mut().ok_or(Error::NotOngoing(label))
    }

    /// Closes the open entry at `time`, or now, and returns it.
    pub fn stop(
        &mut self,
        time: Option<Timestamp>,
        tag: Option<Tag>,
        note: Option<Note>,
    ) -> Result<&mut Entry> {
        let label = self.to_string();
        let entry = match self.entries.last_mut() {
            Some(entry) if entry.is_open() => entry,
            _ => return Err(Error::NotOngoing(label)),
        };
        let time = time.unwrap_or_else(Timestamp::now);
        if time < entry.start()? {
            return Err(Error::StopBeforeStart {
                activity: label,
                time: time.to_string(),
            });
        }
        entry.set_end(time)?;
        if let Some(tag) = tag {
            entry.add_tag(tag)?;
        }
        if let Some(note) = note {
            entry.add_note(note)?;
        }
        info!("Stopped {label} at {time}");
        Ok(entry)
    }

    /// Sum of all entries, the open one measured up to `now`.
    pub fn duration(&self, now: Timestamp) -> Result<Duration> {
        let mut sum = Duration::zero();
        for entry in &self.entries {
            sum += entry.duration(now)?;
        }
        Ok(sum)
    }

    pub fn earliest_start(&self) -> Result<Option<Timestamp>> {
        let mut earliest = None;
        for entry in &self.entries {
            let start = entry.start()?;
            earliest = Some(earliest.map_or(start, |e: Timestamp| e.min(start)));
        }
        Ok(earliest)
    }

    /// Tags of all entries, in order of appearance.
    pub fn tags(&self) -> Result<IndexSet<Tag>> {
        let mut tags = IndexSet::new();
        for entry in &self.entries {
            tags.extend(entry.tags()?);
        }
        Ok(tags)
    }

    pub fn notes(&self) -> Result<Vec<Note>> {
        let mut notes = vec![];
        for entry in &self.entries {
            notes.extend(entry.notes()?);
        }
        Ok(notes)
    }

    /// Like the representation, but with only the last entry.
    pub fn shortrepr(&self) -> String {
        let entries = match (self.entries.len(), self.last_entry()) {
            (0, _) | (_, None) => "[]".to_string(),
            (1, Some(last)) => format!("[{last}]"),
            (_, Some(last)) => format!("[... {last}]"),
        };
        let jira = match self.jira() {
            Ok(Some(ticket)) => ticket.to_string(),
            _ => "None".to_string(),
        };
        format!("{} ({self}, jira={jira}) {entries}", Self::NAME)
    }
}

impl Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Ok(name) => write!(f, "{name:?}"),
            Err(_) => write!(f, "<unnamed>"),
        }
    }
}

impl Vivify for Activity {
    fn vivify(key: &str) -> Self {
        debug!("New activity {key:?}");
        Activity::new(key)
    }

    fn revive(raw: Value, key: &str) -> Self {
        Activity::from_raw(&raw, key)
    }

    fn to_raw(&self) -> Value {
        self.entries.to_raw()
    }
}
