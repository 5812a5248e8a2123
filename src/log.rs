//! Initialisation of the program logger.
//!
//! Messages go to the terminal (colourised if it supports it) and, during a run, to log files in
//! the output folder. Warnings and errors are kept apart from the ordinary progress messages in
//! both places.
use anyhow::{Context, Result, bail, ensure};
use chrono::Local;
use fern::{Dispatch, FormatCallback};
use fern::colors::{Color, ColoredLevelConfig};
use log::{LevelFilter, Metadata, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::OnceLock;

/// Set once the logger has been initialised
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The log level used if neither the environment nor the settings file gives one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The environment variable which overrides the log level
const LOG_LEVEL_ENV_VAR: &str = "PROJECTSIM_LOG_LEVEL";

/// Log file for progress messages during a run
const LOG_INFO_FILE_NAME: &str = "projectsim_info.log";

/// Log file for warnings and errors during a run
const LOG_ERROR_FILE_NAME: &str = "projectsim_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Initialise the program logger.
///
/// The level is taken from the `PROJECTSIM_LOG_LEVEL` environment variable if set, otherwise
/// from `settings.toml`, otherwise [`DEFAULT_LOG_LEVEL`]. Level names are `off`, `error`, `warn`,
/// `info`, `debug` and `trace`, in any case.
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level specified in `settings.toml`
/// * `log_file_dir`: If given, `projectsim_info.log` and `projectsim_error.log` are written here
pub fn init(log_level_from_settings: Option<&str>, log_file_dir: Option<&Path>) -> Result<()> {
    ensure!(!is_logger_initialised(), "Logger already initialised");

    let level_name = env::var(LOG_LEVEL_ENV_VAR)
        .unwrap_or_else(|_| log_level_from_settings.unwrap_or(DEFAULT_LOG_LEVEL).to_string());
    let level = parse_level(&level_name)?;

    let mut dispatch = Dispatch::new()
        .chain(
            terminal_output(io::stdout().is_terminal())
                .filter(is_progress)
                .level(level)
                .chain(io::stdout()),
        )
        .chain(
            terminal_output(io::stderr().is_terminal())
                .level(level.min(LevelFilter::Warn))
                .chain(io::stderr()),
        );

    if let Some(dir) = log_file_dir {
        let create = |file_name: &str| {
            File::create(dir.join(file_name))
                .with_context(|| format!("Failed to create log file {file_name}"))
        };
        dispatch = dispatch
            .chain(
                Dispatch::new()
                    .filter(is_progress)
                    .format(|out, message, record| write_line(out, record.level(), record, message))
                    .level(level.max(LevelFilter::Info))
                    .chain(create(LOG_INFO_FILE_NAME)?),
            )
            .chain(
                Dispatch::new()
                    .format(|out, message, record| write_line(out, record.level(), record, message))
                    .level(LevelFilter::Warn)
                    .chain(create(LOG_ERROR_FILE_NAME)?),
            );
    }

    dispatch.apply().context("Logger already initialised")?;
    let _ = LOGGER_INIT.set(());

    Ok(())
}

/// Convert a log level name (in any case) to a [`LevelFilter`]
fn parse_level(name: &str) -> Result<LevelFilter> {
    let level = match name.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(level)
}

/// Messages below warning level
fn is_progress(metadata: &Metadata) -> bool {
    metadata.level() > LevelFilter::Warn
}

/// A terminal output, with the level coloured if `use_colour` is set
fn terminal_output(use_colour: bool) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    Dispatch::new().format(move |out, message, record| {
        if use_colour {
            write_line(out, colours.color(record.level()), record, message);
        } else {
            write_line(out, record.level(), record, message);
        }
    })
}

/// Write a log line in the format `[HH:MM:SS LEVEL target] message`
fn write_line<L: Display>(out: FormatCallback, level: L, record: &Record, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");
    out.finish(format_args!("[{timestamp} {level} {}] {message}", record.target()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;

    #[rstest]
    #[case("off", LevelFilter::Off)]
    #[case("WARN", LevelFilter::Warn)]
    #[case("Debug", LevelFilter::Debug)]
    fn test_parse_level(#[case] name: &str, #[case] expected: LevelFilter) {
        assert_eq!(parse_level(name).unwrap(), expected);
    }

    #[test]
    fn test_parse_level_unknown() {
        assert_error!(parse_level("chatty"), "Unknown log level: chatty");
    }
}
