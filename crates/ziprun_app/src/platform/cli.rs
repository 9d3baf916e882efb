use std::path::PathBuf;

use clap::Parser;
use ziprun_logging::LogDestination;

#[derive(Debug, Parser)]
#[command(
    name = "ziprun",
    version,
    about = "Submit a ZIP archive for processing, follow its log and fetch the result"
)]
pub struct Cli {
    /// ZIP archive to submit.
    pub file: PathBuf,

    /// Processing service URL. Overrides the config file.
    #[arg(long)]
    pub server: Option<String>,

    /// RON config file. A missing file means defaults.
    #[arg(long, default_value = "ziprun.ron")]
    pub config: PathBuf,

    /// Directory the result is saved into. Overrides the config file.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Stop after processing finishes without downloading the result.
    #[arg(long)]
    pub no_download: bool,

    /// Where diagnostics go: terminal, file or both.
    #[arg(long, default_value = "terminal", value_parser = parse_destination)]
    pub log_to: LogDestination,

    /// Log engine activity at info level instead of warnings only.
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_destination(value: &str) -> Result<LogDestination, String> {
    LogDestination::parse(value)
        .ok_or_else(|| format!("unknown log destination '{value}' (terminal, file, both)"))
}
