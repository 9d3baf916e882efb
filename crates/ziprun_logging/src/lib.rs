#![deny(missing_docs)]
//! Logging for the ziprun workspace.
//!
//! Crates log through the `ziprun_*` macros, which forward to the `log` facade.
//! The binary installs a `simplelog` backend with [`initialize`]; tests use
//! [`initialize_for_tests`].

use std::fs::File;
use std::io;
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Log file created in the working directory for the file destinations.
pub const LOG_FILENAME: &str = "ziprun.log";

/// Only records from the workspace crates are kept; HTTP internals stay quiet.
const TARGET_PREFIX: &str = "ziprun";

/// `log::trace!` under the workspace name.
#[macro_export]
macro_rules! ziprun_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// `log::debug!` under the workspace name.
#[macro_export]
macro_rules! ziprun_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// `log::info!` under the workspace name.
#[macro_export]
macro_rules! ziprun_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// `log::warn!` under the workspace name.
#[macro_export]
macro_rules! ziprun_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// `log::error!` under the workspace name.
#[macro_export]
macro_rules! ziprun_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Where [`initialize`] sends records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogDestination {
    /// `./ziprun.log` only.
    File,
    /// The terminal only; warnings and errors go to stderr.
    #[default]
    Terminal,
    /// The terminal and `./ziprun.log`.
    Both,
}

impl LogDestination {
    /// Parses `terminal`, `file` or `both`, ignoring case and surrounding blanks.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "terminal" => Some(Self::Terminal),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    fn wants_terminal(self) -> bool {
        matches!(self, Self::Terminal | Self::Both)
    }

    fn wants_file(self) -> bool {
        matches!(self, Self::File | Self::Both)
    }
}

/// Installs the global logger.
///
/// A log file that cannot be created is reported on stderr and skipped. Calling
/// this after a logger is already installed has no effect.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = client_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if destination.wants_terminal() {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }
    if destination.wants_file() {
        let path = Path::new(".").join(LOG_FILENAME);
        match file_logger(&path, level, config) {
            Ok(logger) => loggers.push(logger),
            Err(err) => eprintln!("Warning: cannot create log file {}: {}", path.display(), err),
        }
    }

    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }
}

/// Terminal logger for tests. Safe to call from every test; only the first call installs it.
pub fn initialize_for_tests() {
    let _ = TermLogger::init(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Never,
    );
}

fn client_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_allow_str(TARGET_PREFIX)
        .build()
}

fn file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> io::Result<Box<WriteLogger<File>>> {
    Ok(WriteLogger::new(level, config, File::create(path)?))
}
