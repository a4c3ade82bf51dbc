use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    space::{default_map::DefaultMap, typed_list::TypedList},
    utils::time::Timestamp,
};

use super::{activity::Activity, day::Day, note::Note, tag::Tag};

/// Top level sheet key holding the names of interrupted activities, most recent last.
pub const INTERRUPTS_KEY: &str = "interrupt_stack";
/// Prefix of the activities started by [Work::interrupt].
pub const INTERRUPT_PREFIX: &str = "interrupt: ";

/// The whole ledger: days by date key, in insertion order. At most one activity in the whole
/// tree is ongoing as long as it's mutated through [Work::on] and [Work::stop].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Work {
    days: DefaultMap<Day>,
    interrupts: TypedList<String>,
}

impl Work {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the ledger out of a loaded snapshot: `date -> activity name -> entries`, plus the
    /// interrupt stack under [INTERRUPTS_KEY].
    pub fn from_raw(raw: &Value) -> Self {
        let Value::Object(map) = raw else {
            return Self {
                days: DefaultMap::from_raw(raw),
                interrupts: TypedList::new(),
            };
        };
        let days = map
            .iter()
            .filter(|(key, _)| key.as_str() != INTERRUPTS_KEY)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<Map<_, _>>();
        Self {
            days: DefaultMap::from_raw(&Value::Object(days)),
            interrupts: map
                .get(INTERRUPTS_KEY)
                .map(TypedList::from_raw)
                .unwrap_or_default(),
        }
    }

    /// Plain nested data, ready to be written back to the sheet.
    pub fn to_raw(&self) -> Value {
        let mut raw = self.days.to_raw();
        let interrupts = self.interrupts.to_raw();
        let pending = interrupts.as_array().is_some_and(|stack| !stack.is_empty());
        if let (Value::Object(map), true) = (&mut raw, pending) {
            map.insert(INTERRUPTS_KEY.to_string(), interrupts);
        }
        raw
    }

    pub fn day(&mut self, date: &str) -> &mut Day {
        self.days.vivify(date)
    }

    pub fn contains_day(&self, date: &str) -> bool {
        self.days.contains_key(date)
    }

    /// Date keys in insertion order.
    pub fn dates(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.days.keys()
    }

    /// Most recent ongoing activity. Days are scanned from the last inserted one backwards, and
    /// activities inside a day the same way.
    pub fn ongoing_activity(&mut self) -> Result<&mut Activity> {
        let (date, name) = self.locate_ongoing().ok_or(Error::NoOngoingActivity)?;
        Ok(self.days.vivify(&date).activity(&name))
    }

    fn locate_ongoing(&mut self) -> Option<(String, String)> {
        let dates = self.dates().rev().map(str::to_owned).collect::<Vec<_>>();
        dates.into_iter().find_map(|date| {
            let name = self.days.vivify(&date).ongoing_name()?;
            Some((date, name))
        })
    }

    /// Number of ongoing activities across all days.
    pub fn ongoing_count(&mut self) -> usize {
        self.days
            .values_mut()
            .flat_map(|day| day.activities())
            .filter(|activity| activity.ongoing())
            .count()
    }

    /// Starts working on `name` at `time`, or now. An ongoing activity is stopped first, unless
    /// it's the same activity or has a similar name.
    pub fn on(
        &mut self,
        name: &str,
        time: Option<Timestamp>,
        tag: Option<Tag>,
        note: Option<Note>,
    ) -> Result<&mut Activity> {
        let name = name.trim();
        Activity::validate_name(name)?;
        let time = time.unwrap_or_else(Timestamp::now);

        match self.ongoing_activity() {
            Ok(ongoing) => {
                let ongoing_name = ongoing.name()?;
                if ongoing_name == name {
                    return Err(Error::AlreadyOngoing(ongoing.shortrepr()));
                }
                if ongoing.has_similar_name(name) {
                    return Err(Error::SimilarName {
                        ongoing: ongoing.to_string(),
                        requested: name.to_string(),
                    });
                }
                debug!("Switching from {ongoing_name:?} to {name:?}");
                ongoing.stop(Some(time), None, None)?;
            }
            Err(Error::NoOngoingActivity) => {}
            Err(e) => return Err(e),
        }

        let activity = self.day(&time.ddmmyy()).activity(name);
        activity.start(Some(time), tag, note)?;
        info!("Now working on {name:?}");
        Ok(activity)
    }

    /// Stops the ongoing activity at `time`, or now.
    pub fn stop(
        &mut self,
        time: Option<Timestamp>,
        tag: Option<Tag>,
        note: Option<Note>,
    ) -> Result<&mut Activity> {
        let ongoing = self.ongoing_activity()?;
        ongoing.stop(time, tag, note)?;
        Ok(ongoing)
    }

    /// Stops the ongoing activity and starts `interrupt: <name>` in its place at `time`, or now.
    /// The stopped activity is resumed by [Work::resume_interrupted]. Returns how many
    /// activities are waiting to be resumed.
    pub fn interrupt(
        &mut self,
        name: &str,
        time: Option<Timestamp>,
        tag: Option<Tag>,
        note: Option<Note>,
    ) -> Result<usize> {
        let name = name.trim();
        Activity::validate_name(name)?;
        let time = time.unwrap_or_else(Timestamp::now);

        let interrupted = {
            let ongoing = self.ongoing_activity()?;
            ongoing.stop(Some(time), None, None)?;
            ongoing.name()?
        };
        debug!("Interrupting {interrupted:?}");
        self.interrupts.push(interrupted);

        let name = format!("{INTERRUPT_PREFIX}{name}");
        self.day(&time.ddmmyy()).activity(&name).start(Some(time), tag, note)?;
        info!("Now working on {name:?}");
        Ok(self.interrupts.len())
    }

    /// Starts the most recently interrupted activity again at `time`. Nothing happens when no
    /// activity was interrupted.
    pub fn resume_interrupted(&mut self, time: Timestamp) -> Result<Option<&mut Activity>> {
        let Some(name) = self.interrupts.pop() else {
            return Ok(None);
        };
        debug!("Back from interrupt to {name:?}");
        self.on(&name, Some(time), None, None).map(Some)
    }

    /// Number of interrupted activities waiting to be resumed.
    pub fn interrupt_depth(&self) -> usize {
        self.interrupts.len()
    }

    /// Tags the open entry of the ongoing activity.
    pub fn tag(&mut self, tags: impl IntoIterator<Item = Tag>) -> Result<&mut Activity> {
        let ongoing = self.ongoing_activity()?;
        {
            let entry = ongoing
                .last_entry_mut()
                .ok_or(Error::NoOngoingActivity)?;
            for tag in tags {
                entry.add_tag(tag)?;
            }
        }
        Ok(ongoing)
    }

    /// Adds a note to the open entry of the ongoing activity.
    pub fn note(&mut self, note: Note) -> Result<&mut Activity> {
        let ongoing = self.ongoing_activity()?;
        ongoing
            .last_entry_mut()
            .ok_or(Error::NoOngoingActivity)?
            .add_note(note)?;
        Ok(ongoing)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        error::Error,
        store::{note::Note, tag::Tag},
        utils::time::Timestamp,
    };

    use super::Work;

    fn ts(value: &str) -> Timestamp {
        Timestamp::from_absolute(value).unwrap()
    }

    #[test]
    fn switching_stops_the_previous_activity() {
        let mut work = Work::new();
        work.on("Got to office", Some(ts("01/12/21 10:00:00")), None, None)
            .unwrap();
        work.on("Integration", Some(ts("01/12/21 10:30:00")), None, None)
            .unwrap();

        assert_eq!(work.ongoing_count(), 1);
        assert_eq!(work.ongoing_activity().unwrap().name().unwrap(), "Integration");
        let office = work.day("01/12/21").activity("Got to office");
        assert_eq!(
            office.last_entry().unwrap().end().unwrap(),
            Some(ts("01/12/21 10:30:00"))
        );
    }

    #[test]
    fn most_recent_day_is_checked_first() {
        let mut work = Work::from_raw(&json!({
            "02/12/21": {"Later": [{"start": "02/12/21 09:00:00"}]},
            "01/12/21": {"Earlier": [{"start": "01/12/21 09:00:00", "end": "01/12/21 10:00:00"}]},
        }));
        assert_eq!(work.ongoing_activity().unwrap().name().unwrap(), "Later");
    }

    #[test]
    fn insertion_order_beats_calendar_order() {
        let mut work = Work::from_raw(&json!({
            "02/12/21": {"A": [{"start": "02/12/21 09:00:00"}]},
            "01/12/21": {"B": [{"start": "01/12/21 09:00:00"}]},
        }));
        assert_eq!(work.ongoing_activity().unwrap().name().unwrap(), "B");
    }

    #[test]
    fn stop_without_ongoing_fails() {
        let mut work = Work::new();
        assert!(matches!(
            work.stop(None, None, None),
            Err(Error::NoOngoingActivity)
        ));
        assert!(matches!(
            work.tag([Tag::new("x")]),
            Err(Error::NoOngoingActivity)
        ));
    }

    #[test]
    fn switching_before_ongoing_start_fails() {
        let mut work = Work::new();
        work.on("A", Some(ts("01/12/21 10:00:00")), None, None).unwrap();
        let err = work
            .on("B", Some(ts("01/12/21 09:00:00")), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::StopBeforeStart { .. }));
        assert_eq!(work.ongoing_activity().unwrap().name().unwrap(), "A");
        assert!(!work.day("01/12/21").contains("B"));
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut work = Work::new();
        assert!(matches!(
            work.on("  ", None, None, None),
            Err(Error::Validation { .. })
        ));
        assert!(work.dates().next().is_none());
    }

    #[test]
    fn tag_and_note_go_to_open_entry() {
        let mut work = Work::new();
        work.on("A", Some(ts("01/12/21 10:00:00")), None, None).unwrap();
        work.tag([Tag::new("red"), Tag::new("blue")]).unwrap();
        work.note(Note::new("remember", ts("01/12/21 10:05:00")))
            .unwrap();

        let raw = work.to_raw();
        assert_eq!(raw["01/12/21"]["A"][0]["tags"], json!(["red", "blue"]));
        assert_eq!(raw["01/12/21"]["A"][0]["notes"][0]["content"], json!("remember"));
    }

    #[test]
    fn serialized_snapshot_reloads_equal() {
        let mut work = Work::new();
        work.on("A", Some(ts("01/12/21 10:00:00")), Some(Tag::new("t")), None)
            .unwrap();
        work.stop(Some(ts("01/12/21 11:00:00")), None, None).unwrap();
        let raw = work.to_raw();
        assert_eq!(Work::from_raw(&raw).to_raw(), raw);
    }

    #[test]
    fn interrupted_activity_is_resumed() {
        let mut work = Work::new();
        work.on("Integration", Some(ts("01/12/21 10:00:00")), None, None)
            .unwrap();
        assert_eq!(
            work.interrupt("Call", Some(ts("01/12/21 10:30:00")), None, None)
                .unwrap(),
            1
        );
        assert_eq!(work.ongoing_activity().unwrap().name().unwrap(), "interrupt: Call");
        assert_eq!(work.to_raw()["interrupt_stack"], json!(["Integration"]));

        work.stop(Some(ts("01/12/21 10:45:00")), None, None).unwrap();
        let resumed = work
            .resume_interrupted(ts("01/12/21 10:45:00"))
            .unwrap()
            .map(|activity| activity.name().unwrap());
        assert_eq!(resumed.as_deref(), Some("Integration"));
        assert_eq!(work.interrupt_depth(), 0);
        assert!(work.to_raw().get("interrupt_stack").is_none());
        assert_eq!(
            work.day("01/12/21").activity("Integration").entries().len(),
            2
        );
        assert!(work.resume_interrupted(ts("01/12/21 11:00:00")).unwrap().is_none());
    }

    #[test]
    fn interrupt_needs_ongoing_activity() {
        let mut work = Work::new();
        assert!(matches!(
            work.interrupt("Call", None, None, None),
            Err(Error::NoOngoingActivity)
        ));
        assert_eq!(work.interrupt_depth(), 0);
    }

    #[test]
    fn interrupt_stack_is_not_a_day() {
        let raw = json!({
            "01/12/21": {"A": [{"start": "01/12/21 09:00:00", "end": "01/12/21 10:00:00"}]},
            "interrupt_stack": ["A"],
        });
        let mut work = Work::from_raw(&raw);
        assert_eq!(work.dates().collect::<Vec<_>>(), vec!["01/12/21"]);
        assert_eq!(work.interrupt_depth(), 1);
        assert_eq!(work.to_raw(), raw);
        assert!(work.ongoing_activity().is_err());
    }

    #[test]
    fn unreadable_parts_are_written_back() {
        let mut work = Work::from_raw(&json!({
            "01/12/21": {"A": [{"start": "01/12/21 09:00:00", "end": "01/12/21 10:00:00"}, "half past ten"]},
            "30/11/21": ["oops"],
        }));
        work.on("B", Some(ts("02/12/21 09:00:00")), None, None).unwrap();

        let raw = work.to_raw();
        assert_eq!(raw["01/12/21"]["A"][1], json!("half past ten"));
        assert_eq!(raw["30/11/21"], json!(["oops"]));
        assert!(work.day("02/12/21").activity("B").ongoing());
    }
}
