use std::sync::LazyLock;

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

use crate::config::Config;

/// Prefix of the log files written by `tf`.
pub const CLI_PREFIX: &str = "cli";
const KEPT_LOG_FILES: usize = 5;

/// Filter for this crate only. An explicit level wins over `RUST_LOG`, which wins over `info`.
fn crate_filter(level: Option<LevelFilter>) -> EnvFilter {
    let level = match level {
        Some(level) => level.to_string(),
        None => std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    };
    EnvFilter::new(format!("{}={level}", env!("CARGO_PKG_NAME").replace('-', "_")))
}

/// Installs the global subscriber. Events go to a daily rotated file in the configured log
/// directory, and are mirrored to stdout when console logging is on.
pub fn enable_logging(prefix: &str, config: &Config) -> Result<()> {
    let file = Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(KEPT_LOG_FILES)
        .filename_prefix(prefix)
        .build(&config.log_dir)?;

    let console = config.log_console;
    let stdout = std::io::stdout.with_filter(move |_| console);

    tracing_subscriber::fmt()
        .with_env_filter(crate_filter(config.log_level))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stdout.and(file))
        .pretty()
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
