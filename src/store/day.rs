use chrono::Duration;
use serde_json::Value;

use crate::{
    error::Result,
    space::default_map::{DefaultMap, Vivify},
    utils::time::Timestamp,
};

use super::activity::Activity;

/// Activities of one calendar day, by name. Asking for an unknown name creates an empty
/// activity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Day {
    date: String,
    activities: DefaultMap<Activity>,
}

impl Day {
    pub fn new(date: &str) -> Self {
        Self {
            date: date.to_string(),
            activities: DefaultMap::new(),
        }
    }

    pub fn from_raw(raw: &Value, date: &str) -> Self {
        Self {
            date: date.to_string(),
            activities: DefaultMap::from_raw(raw),
        }
    }

    /// The key this day lives under, e.g. `01/12/21`.
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn activity(&mut self, name: &str) -> &mut Activity {
        self.activities.vivify(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.activities.contains_key(name)
    }

    /// Activity names in insertion order.
    pub fn names(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.activities.keys()
    }

    pub fn activities(&mut self) -> impl DoubleEndedIterator<Item = &mut Activity> {
        self.activities.values_mut()
    }

    /// Name of the most recently inserted activity that is ongoing.
    pub fn ongoing_name(&mut self) -> Option<String> {
        let names = self.names().rev().map(str::to_owned).collect::<Vec<_>>();
        names
            .into_iter()
            .find(|name| self.activities.vivify(name).ongoing())
    }

    pub fn duration(&mut self, now: Timestamp) -> Result<Duration> {
        let mut sum = Duration::zero();
        for activity in self.activities() {
            sum += activity.duration(now)?;
        }
        Ok(sum)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

impl Vivify for Day {
    fn vivify(key: &str) -> Self {
        Day::new(key)
    }

    fn revive(raw: Value, key: &str) -> Self {
        Day::from_raw(&raw, key)
    }

    fn to_raw(&self) -> Value {
        self.activities.to_raw()
    }
}
