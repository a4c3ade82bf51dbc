use ansi_term::{Colour, Style};
use anyhow::Result;
use chrono_english::Dialect;
use tracing::debug;

use crate::{
    store::{Activity, JiraTicket, Note, Tag, Work},
    utils::{
        clock::Clock,
        time::{format_duration, Timestamp},
    },
};

/// Turns trailing time words into a moment. No words means `now`.
pub fn resolve_time(words: &[String], now: Timestamp, dialect: Dialect) -> Result<Timestamp> {
    let joined = words.join(" ");
    let time = Timestamp::from_human(&joined, now, dialect)?;
    debug!("Resolved {joined:?} to {time}");
    Ok(time)
}

fn paint_name(activity: &Activity) -> String {
    Colour::Cyan.bold().paint(activity.to_string()).to_string()
}

fn paint_time(time: Timestamp) -> String {
    Colour::Yellow.paint(time.hhmmss()).to_string()
}

fn paint_tags<'a>(tags: impl IntoIterator<Item = &'a Tag>) -> String {
    tags.into_iter()
        .map(|tag| Colour::Purple.paint(format!("#{tag}")).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Arguments of `on`.
#[derive(Debug, Clone, Default)]
pub struct OnRequest {
    pub name: String,
    pub time: Vec<String>,
    pub tag: Option<String>,
    pub note: Option<String>,
    pub jira: Option<String>,
}

/// Starts working on an activity, stopping the ongoing one.
pub fn on(
    work: &mut Work,
    request: OnRequest,
    clock: &impl Clock,
    dialect: Dialect,
) -> Result<String> {
    let time = resolve_time(&request.time, clock.now(), dialect)?;
    let previous = work.ongoing_activity().ok().map(|activity| paint_name(activity));
    let tag = request.tag.map(Tag::new);
    let note = request.note.map(|note| Note::parse(&note, time));

    let activity = work.on(&request.name, Some(time), tag, note)?;
    if let Some(ticket) = request.jira {
        activity.set_jira(JiraTicket::new(ticket))?;
    }

    let started = format!("Working on {} since {}", paint_name(activity), paint_time(time));
    Ok(match previous {
        Some(previous) => format!("Stopped {previous} at {}\n{started}", paint_time(time)),
        None => started,
    })
}

/// Stops the ongoing activity.
pub fn stop(
    work: &mut Work,
    time: &[String],
    tag: Option<String>,
    note: Option<String>,
    clock: &impl Clock,
    dialect: Dialect,
) -> Result<String> {
    let now = clock.now();
    let time = resolve_time(time, now, dialect)?;
    let tag = tag.map(Tag::new);
    let note = note.map(|note| Note::parse(&note, time));

    let activity = work.stop(Some(time), tag, note)?;
    let spent = match activity.last_entry() {
        Some(entry) => format_duration(entry.duration(now)?),
        None => format_duration(chrono::Duration::zero()),
    };
    let mut lines = vec![format!(
        "Stopped {} at {} after {}",
        paint_name(activity),
        paint_time(time),
        Style::new().bold().paint(spent)
    )];

    if let Some(resumed) = work.resume_interrupted(time)? {
        lines.push(format!("Back to {} since {}", paint_name(resumed), paint_time(time)));
        lines.push(match work.interrupt_depth() {
            0 => "Out of interrupts".to_string(),
            depth => format!("Still {depth} deep in interrupts"),
        });
    }
    Ok(lines.join("\n"))
}

/// Stops the ongoing activity for an interruption, to be resumed when it's stopped.
pub fn interrupt(
    work: &mut Work,
    name: &str,
    time: &[String],
    tag: Option<String>,
    note: Option<String>,
    clock: &impl Clock,
    dialect: Dialect,
) -> Result<String> {
    let time = resolve_time(time, clock.now(), dialect)?;
    let interrupted = paint_name(work.ongoing_activity()?);
    let tag = tag.map(Tag::new);
    let note = note.map(|note| Note::parse(&note, time));

    let depth = work.interrupt(name, Some(time), tag, note)?;
    let current = paint_name(work.ongoing_activity()?);
    Ok(format!(
        "Put {interrupted} aside at {}\nWorking on {current}, {depth} deep in interrupts",
        paint_time(time)
    ))
}

/// Describes the ongoing activity, if any.
pub fn status(work: &mut Work, notes: bool, clock: &impl Clock) -> Result<String> {
    let now = clock.now();
    let Ok(activity) = work.ongoing_activity() else {
        return Ok(Colour::White.dimmed().paint("Not working on anything").to_string());
    };
    let Some(entry) = activity.last_entry() else {
        return Ok(Colour::White.dimmed().paint("Not working on anything").to_string());
    };

    let mut lines = vec![format!(
        "Working on {} since {} ({})",
        paint_name(activity),
        paint_time(entry.start()?),
        format_duration(entry.duration(now)?)
    )];
    let tags = entry.tags()?;
    if !tags.is_empty() {
        lines.push(format!("  {}", paint_tags(&tags)));
    }
    if let Some(ticket) = activity.jira()? {
        lines.push(format!("  jira: {ticket}"));
    }
    if notes {
        for note in entry.notes()? {
            lines.push(format!("  - {note}"));
        }
    }
    Ok(lines.join("\n"))
}

/// Tags the open entry of the ongoing activity.
pub fn tag(work: &mut Work, tags: Vec<String>) -> Result<String> {
    let tags = tags
        .into_iter()
        .map(Tag::new)
        .filter(|tag| !tag.is_empty())
        .collect::<Vec<_>>();
    let painted = paint_tags(&tags);
    let activity = work.tag(tags)?;
    Ok(format!("Tagged {} with {painted}", paint_name(activity)))
}

/// Adds a note to the open entry of the ongoing activity.
pub fn note(work: &mut Work, text: &[String], clock: &impl Clock) -> Result<String> {
    let note = Note::parse(&text.join(" "), clock.now());
    let shown = note.to_string();
    let activity = work.note(note)?;
    Ok(format!("Noted on {}: {shown}", paint_name(activity)))
}

/// Summary of a single day. Activities are ordered by when they were first started.
pub fn log(
    work: &mut Work,
    day: &[String],
    detailed: bool,
    clock: &impl Clock,
    dialect: Dialect,
) -> Result<String> {
    let now = clock.now();
    let key = resolve_time(day, now, dialect)?.ddmmyy();
    if !work.contains_day(&key) {
        return Ok(format!("Nothing logged on {key}"));
    }

    let day = work.day(&key);
    let mut activities = Vec::new();
    for activity in day.activities() {
        let activity = &*activity;
        activities.push((activity.earliest_start()?, activity));
    }
    activities.sort_by_key(|(start, _)| *start);

    let mut total = chrono::Duration::zero();
    let mut lines = vec![Style::new().underline().paint(key.as_str()).to_string()];
    for (_, activity) in activities {
        let duration = activity.duration(now)?;
        total += duration;
        let marker = if activity.ongoing() { " *" } else { "" };
        lines.push(format!(
            "{}\t{}{marker}",
            format_duration(duration),
            paint_name(activity)
        ));
        if !detailed {
            continue;
        }
        for entry in activity.entries() {
            let tags = entry.tags()?;
            lines.push(format!("    {entry}\t{}", paint_tags(&tags)).trim_end().to_string());
            for note in entry.notes()? {
                lines.push(format!("      - {note}"));
            }
        }
    }
    lines.push(format!(
        "{}\ttotal",
        Style::new().bold().paint(format_duration(total))
    ));
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use chrono_english::Dialect;
    use serde_json::json;

    use crate::{
        store::Work,
        utils::{clock::MockClock, logging::TEST_LOGGING, time::Timestamp},
    };

    use super::{interrupt, log, note, on, status, stop, tag, OnRequest};

    fn ts(value: &str) -> Timestamp {
        Timestamp::from_absolute(value).unwrap()
    }

    fn clock_at(value: &str) -> MockClock {
        let mut clock = MockClock::new();
        clock.expect_now().return_const(ts(value));
        clock
    }

    fn words(value: &str) -> Vec<String> {
        value.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn on_then_switch() {
        *TEST_LOGGING;
        let mut work = Work::new();
        let clock = clock_at("01/12/21 12:00:00");

        let output = on(
            &mut work,
            OnRequest {
                name: "Got to office".into(),
                time: words("01/12/21 10:00"),
                ..Default::default()
            },
            &clock,
            Dialect::Uk,
        )
        .unwrap();
        assert!(output.contains("Got to office"));
        assert!(!output.contains("Stopped"));

        let output = on(
            &mut work,
            OnRequest {
                name: "Integration".into(),
                time: words("01/12/21 10:30"),
                tag: Some("review".into()),
                jira: Some("asm-1".into()),
                ..Default::default()
            },
            &clock,
            Dialect::Uk,
        )
        .unwrap();
        assert!(output.contains("Stopped"));
        assert!(output.contains("10:30:00"));

        let raw = work.to_raw();
        assert_eq!(raw["01/12/21"]["Got to office"][0]["end"], json!("01/12/21 10:30:00"));
        assert_eq!(raw["01/12/21"]["Integration"][0]["tags"], json!(["review"]));
        assert_eq!(raw["01/12/21"]["Integration"][0]["jira"], json!("ASM-1"));
    }

    #[test]
    fn on_without_time_uses_clock() {
        let mut work = Work::new();
        let clock = clock_at("01/12/21 09:15:00");
        on(
            &mut work,
            OnRequest {
                name: "Standup".into(),
                ..Default::default()
            },
            &clock,
            Dialect::Uk,
        )
        .unwrap();
        let entry = work.day("01/12/21").activity("Standup").last_entry().cloned();
        assert_eq!(entry.unwrap().start().unwrap(), ts("01/12/21 09:15:00"));
    }

    #[test]
    fn humanized_time_is_relative_to_clock() {
        let mut work = Work::new();
        let clock = clock_at("01/12/21 12:00:00");
        on(
            &mut work,
            OnRequest {
                name: "Lunch".into(),
                time: words("1 hour ago"),
                ..Default::default()
            },
            &clock,
            Dialect::Uk,
        )
        .unwrap();
        let entry = work.day("01/12/21").activity("Lunch").last_entry().cloned();
        assert_eq!(entry.unwrap().start().unwrap(), ts("01/12/21 11:00:00"));
    }

    #[test]
    fn stop_reports_duration() {
        let mut work = Work::new();
        work.on("A", Some(ts("01/12/21 10:00:00")), None, None).unwrap();
        let clock = clock_at("01/12/21 11:30:00");
        let output = stop(&mut work, &[], None, Some("done".into()), &clock, Dialect::Uk).unwrap();
        assert!(output.contains("1h30m0s"));
        assert!(work.ongoing_activity().is_err());
        assert!(stop(&mut work, &[], None, None, &clock, Dialect::Uk).is_err());
    }

    #[test]
    fn status_with_notes() {
        let mut work = Work::new();
        let clock = clock_at("01/12/21 10:45:00");
        assert!(status(&mut work, false, &clock).unwrap().contains("Not working"));

        work.on("A", Some(ts("01/12/21 10:00:00")), None, None).unwrap();
        tag(&mut work, words("#Focus")).unwrap();
        note(&mut work, &words("halfway (10:20:00)"), &clock).unwrap();

        let output = status(&mut work, true, &clock).unwrap();
        assert!(output.contains("45m0s"));
        assert!(output.contains("#focus"));
        assert!(output.contains("halfway (10:20:00)"));
        let notes = work.ongoing_activity().unwrap().notes().unwrap();
        assert_eq!(notes[0].time, Some(ts("01/12/21 10:20:00")));
        assert!(!status(&mut work, false, &clock).unwrap().contains("halfway"));
    }

    #[test]
    fn note_time_of_day_uses_clock_date() {
        let mut work = Work::new();
        work.on("A", Some(ts("30/11/21 22:00:00")), None, None).unwrap();
        note(&mut work, &words("late call (23:10)"), &clock_at("30/11/21 23:30:00")).unwrap();
        let notes = work.ongoing_activity().unwrap().notes().unwrap();
        assert_eq!(notes[0].time, Some(ts("30/11/21 23:10:00")));
    }

    #[test]
    fn stopping_an_interruption_resumes() {
        let mut work = Work::new();
        work.on("Integration", Some(ts("01/12/21 10:00:00")), None, None).unwrap();
        let clock = clock_at("01/12/21 10:30:00");

        let output = interrupt(&mut work, "Call", &[], None, None, &clock, Dialect::Uk).unwrap();
        assert!(output.contains("Integration"));
        assert!(output.contains("1 deep"));

        let clock = clock_at("01/12/21 10:45:00");
        let output = stop(&mut work, &[], None, None, &clock, Dialect::Uk).unwrap();
        assert!(output.contains("interrupt: Call"));
        assert!(output.contains("Back to"));
        assert!(output.contains("Out of interrupts"));
        assert_eq!(work.ongoing_activity().unwrap().name().unwrap(), "Integration");

        assert!(!stop(&mut work, &[], None, None, &clock, Dialect::Uk)
            .unwrap()
            .contains("Back to"));
    }

    #[test]
    fn tag_and_note_need_ongoing() {
        let mut work = Work::new();
        let clock = clock_at("01/12/21 10:45:00");
        assert!(tag(&mut work, words("x")).is_err());
        assert!(note(&mut work, &words("x"), &clock).is_err());
    }

    #[test]
    fn log_orders_by_first_start_and_totals() {
        let mut work = Work::from_raw(&json!({
            "01/12/21": {
                "Integration": [
                    {"start": "01/12/21 10:30:00", "end": "01/12/21 11:00:00", "tags": ["review"]},
                ],
                "Got to office": [
                    {"start": "01/12/21 10:00:00", "end": "01/12/21 10:30:00"},
                ],
            }
        }));
        let clock = clock_at("02/12/21 12:00:00");

        let output = log(&mut work, &words("01/12/21"), true, &clock, Dialect::Uk).unwrap();
        let office = output.find("Got to office").unwrap();
        let integration = output.find("Integration").unwrap();
        assert!(office < integration);
        assert!(output.contains("1h0m0s"));
        assert!(output.contains("#review"));

        let output = log(&mut work, &[], false, &clock, Dialect::Uk).unwrap();
        assert_eq!(output, "Nothing logged on 02/12/21");
    }
}
