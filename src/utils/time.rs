use std::{fmt::Display, ops::Sub};

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_english::{parse_date_string, Dialect};

/// Format used for persisting timestamps in the sheet.
pub const DATETIME_FORMAT: &str = "%d/%m/%y %H:%M:%S";
/// Format of the keys under which days live in the sheet.
pub const DATE_FORMAT: &str = "%d/%m/%y";
pub const TIME_FORMAT: &str = "%H:%M:%S";

const ABSOLUTE_DATETIME_FORMATS: [&str; 2] = [DATETIME_FORMAT, "%d/%m/%y %H:%M"];
const ABSOLUTE_TIME_FORMATS: [&str; 2] = [TIME_FORMAT, "%H:%M"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("can't parse {input:?} into a time: {reason}")]
pub struct TimeParseError {
    pub input: String,
    pub reason: String,
}

/// A moment in local time. Everything the ledger stores is a [Timestamp].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Local>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Local::now())
    }

    pub fn from_datetime<Tz: TimeZone>(value: DateTime<Tz>) -> Self {
        Self(value.with_timezone(&Local))
    }

    /// Interprets a naive date time as local time. Ambiguous times resolve to the earliest
    /// candidate.
    pub fn from_naive(value: NaiveDateTime) -> Option<Self> {
        Local.from_local_datetime(&value).earliest().map(Self)
    }

    /// Parses an absolute time like `01/12/21 10:30:00`, `01/12/21` or `10:30`. Time-only
    /// inputs are placed on today's date.
    pub fn from_absolute(value: &str) -> Result<Self, TimeParseError> {
        Self::from_absolute_on(value, Local::now().date_naive())
    }

    /// Like [Timestamp::from_absolute], but time-only inputs are placed on `day`.
    pub fn from_absolute_on(value: &str, day: NaiveDate) -> Result<Self, TimeParseError> {
        let value = value.trim();
        let error = |reason: &str| TimeParseError {
            input: value.to_string(),
            reason: reason.to_string(),
        };

        for format in ABSOLUTE_DATETIME_FORMATS {
            if let Ok(v) = NaiveDateTime::parse_from_str(value, format) {
                return Self::from_naive(v).ok_or_else(|| error("time doesn't exist locally"));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
            return Self::from_naive(date.and_time(NaiveTime::MIN))
                .ok_or_else(|| error("time doesn't exist locally"));
        }
        if let Some(time) = parse_time_of_day(value) {
            return Self::from_naive(day.and_time(time))
                .ok_or_else(|| error("time doesn't exist locally"));
        }
        DateTime::parse_from_rfc3339(value)
            .map(Self::from_datetime)
            .map_err(|_| error("unrecognized absolute format"))
    }

    /// Parses both absolute and humanized inputs, e.g. "now", "yesterday", "1 hour ago",
    /// "12:00 16/03/2025". `now` is the reference for relative expressions.
    pub fn from_human(value: &str, now: Timestamp, dialect: Dialect) -> Result<Self, TimeParseError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("now") {
            return Ok(now);
        }
        if let Ok(v) = Self::from_absolute_on(trimmed, now.date()) {
            return Ok(v);
        }
        parse_date_string(trimmed, now.0, dialect)
            .map(Self::from_datetime)
            .map_err(|e| TimeParseError {
                input: trimmed.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Key of the day this timestamp belongs to.
    pub fn ddmmyy(&self) -> String {
        date_to_record_name(self.date())
    }

    pub fn hhmmss(&self) -> String {
        self.0.format(TIME_FORMAT).to_string()
    }

    pub fn as_datetime(&self) -> &DateTime<Local> {
        &self.0
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATETIME_FORMAT))
    }
}

impl Sub for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

/// Parses a bare time of day such as `10:30` or `10:30:00`.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    ABSOLUTE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value.trim(), format).ok())
}

/// This is the standard way of converting a date to a day key in timefred.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_duration(v: Duration) -> String {
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}
