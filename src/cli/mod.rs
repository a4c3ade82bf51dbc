pub mod commands;

use std::path::PathBuf;

use anyhow::Result;
use chrono_english::Dialect;
use clap::{Parser, Subcommand};
use commands::OnRequest;
use tracing::debug;

use crate::{
    config::{Config, DateStyle},
    storage::sheet::{SheetFile, SheetStorage},
    utils::{
        clock::{Clock, DefaultClock},
        logging::{enable_logging, CLI_PREFIX},
    },
};

const TIME_HELP: &str = "When it happened. Examples are \"10:30\", \"01/12/21 10:30\", \"15 minutes ago\". Defaults to now";

#[derive(Parser, Debug)]
#[command(name = "tf", version, long_about = None)]
#[command(about = "Keeps track of what you've been working on", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
    #[arg(
        long,
        global = true,
        help = "Sheet file. By default $TIMEFRED_SHEET, or sheet.json in $XDG_STATE_HOME/timefred or $HOME/.local/state/timefred"
    )]
    pub sheet: Option<PathBuf>,
    #[arg(long, global = true, help = "Enable logging")]
    pub log: bool,
    #[arg(long, global = true, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    pub date_style: DateStyle,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(about = "Start working on an activity, stopping the ongoing one")]
    On {
        #[arg(help = "Name of the activity. Quote it if it has spaces")]
        name: String,
        #[arg(help = TIME_HELP)]
        time: Vec<String>,
        #[arg(long, short, help = "Tag the new entry")]
        tag: Option<String>,
        #[arg(long, short, help = "Attach a note to the new entry")]
        note: Option<String>,
        #[arg(long, short, help = "Jira ticket of the activity")]
        jira: Option<String>,
    },
    #[command(about = "Put the ongoing activity aside for an interruption. Stopping the interruption resumes it")]
    Interrupt {
        #[arg(help = "What interrupted you. Quote it if it has spaces")]
        name: String,
        #[arg(help = TIME_HELP)]
        time: Vec<String>,
        #[arg(long, short, help = "Tag the interruption")]
        tag: Option<String>,
        #[arg(long, short, help = "Attach a note to the interruption")]
        note: Option<String>,
    },
    #[command(alias = "fin", about = "Stop the ongoing activity, resuming an interrupted one")]
    Stop {
        #[arg(help = TIME_HELP)]
        time: Vec<String>,
        #[arg(long, short, help = "Tag the stopped entry")]
        tag: Option<String>,
        #[arg(long, short, help = "Attach a note to the stopped entry")]
        note: Option<String>,
    },
    #[command(about = "Show the ongoing activity")]
    Status {
        #[arg(long, help = "Include notes of the ongoing entry")]
        notes: bool,
    },
    #[command(about = "Tag the ongoing activity")]
    Tag {
        #[arg(required = true)]
        tags: Vec<String>,
    },
    #[command(about = "Add a note to the ongoing activity, e.g. \"PR-5000 (10:30)\"")]
    Note {
        #[arg(required = true)]
        text: Vec<String>,
    },
    #[command(about = "Summarize a day")]
    Log {
        #[arg(help = "Day to summarize, e.g. \"yesterday\" or \"01/12/21\". Defaults to today")]
        day: Vec<String>,
        #[arg(long, short, help = "List every entry with its tags and notes")]
        detailed: bool,
    },
}

impl Command {
    /// Whether the sheet has to be written back after the command.
    pub fn mutates(&self) -> bool {
        !matches!(self, Command::Status { .. } | Command::Log { .. })
    }
}

/// Loads the sheet, runs `command` against it, and saves it back if anything changed. Returns
/// what should be shown to the user.
pub async fn execute(
    command: Command,
    storage: &impl SheetStorage,
    clock: &impl Clock,
    dialect: Dialect,
) -> Result<String> {
    let mut work = storage.load().await?;
    let mutates = command.mutates();
    debug!("Executing {command:?}");

    let output = match command {
        Command::On {
            name,
            time,
            tag,
            note,
            jira,
        } => commands::on(
            &mut work,
            OnRequest {
                name,
                time,
                tag,
                note,
                jira,
            },
            clock,
            dialect,
        )?,
        Command::Interrupt {
            name,
            time,
            tag,
            note,
        } => commands::interrupt(&mut work, &name, &time, tag, note, clock, dialect)?,
        Command::Stop { time, tag, note } => {
            commands::stop(&mut work, &time, tag, note, clock, dialect)?
        }
        Command::Status { notes } => commands::status(&mut work, notes, clock)?,
        Command::Tag { tags } => commands::tag(&mut work, tags)?,
        Command::Note { text } => commands::note(&mut work, &text, clock)?,
        Command::Log { day, detailed } => {
            commands::log(&mut work, &day, detailed, clock, dialect)?
        }
    };

    if mutates {
        storage.save(&work).await?;
    }
    Ok(output)
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let config = Config::resolve(args.sheet, args.log, args.date_style)?;
    enable_logging(CLI_PREFIX, &config)?;
    debug!("Using {config:?}");

    let storage = SheetFile::new(config.sheet)?;
    let output = execute(
        args.command,
        &storage,
        &DefaultClock,
        config.date_style.into(),
    )
    .await?;
    println!("{output}");
    Ok(())
}
