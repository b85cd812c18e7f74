use clap::Parser;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "BoostMD Developers",
    version,
    about = "BoostMD - a staged chunk-execution runner for boosted (bias-accelerated) molecular dynamics, with exact checkpoint/restart semantics.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// Input file describing the simulation to run.
    #[arg(value_name = "INPUT_FILE")]
    pub input_file: PathBuf,

    /// Format of the input file. Currently only 'toml'.
    #[arg(value_name = "INPUT_FILE_TYPE")]
    pub input_file_type: String,

    /// Resume the simulation from the rolling checkpoint in the output
    /// directory instead of starting fresh.
    #[arg(short = 'r', long)]
    pub restart: bool,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
