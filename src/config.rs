use std::{env, fmt::Display, path::PathBuf};

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

pub const APPLICATION_NAME: &str = "timefred";
/// Environment variable pointing at the sheet file.
pub const SHEET_ENV: &str = "TIMEFRED_SHEET";
pub const DEFAULT_SHEET_NAME: &str = "sheet.json";

/// Base directory for application state: `%APPDATA%` on Windows, elsewhere `$XDG_STATE_HOME`,
/// or `$HOME/.local/state`.
fn state_home() -> Result<PathBuf> {
    #[cfg(windows)]
    let home = env::var_os("APPDATA").map(PathBuf::from);
    #[cfg(not(windows))]
    let home = env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/state")));

    home.ok_or_else(|| anyhow!("No directory for application state, set $XDG_STATE_HOME or $HOME"))
}

/// Application directory holding the default sheet and the logs. Created if missing.
pub fn application_dir() -> Result<PathBuf> {
    let dir = state_home()?.join(APPLICATION_NAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Style of dates used when parsing user input. For Uk it's day/month/year, for Us
/// month/day/year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DateStyle {
    #[default]
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Settings of a single invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub sheet: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: Option<LevelFilter>,
    pub log_console: bool,
    pub date_style: DateStyle,
}

impl Config {
    /// The sheet is `sheet` if given, then `$TIMEFRED_SHEET`, then `sheet.json` in the
    /// application directory. Logs always go to the application directory.
    pub fn resolve(sheet: Option<PathBuf>, log: bool, date_style: DateStyle) -> Result<Self> {
        let app_dir = application_dir()?;
        let sheet = sheet
            .or_else(|| env::var_os(SHEET_ENV).map(PathBuf::from))
            .unwrap_or_else(|| app_dir.join(DEFAULT_SHEET_NAME));

        Ok(Self {
            sheet,
            log_dir: app_dir.join("logs"),
            log_level: log.then_some(LevelFilter::TRACE),
            log_console: log,
            date_style,
        })
    }
}
