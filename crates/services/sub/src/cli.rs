//! Command-line interface for sub.

use std::path::PathBuf;

use clap::Parser;
use sub_core::reporter::ColorChoice;

/// Concurrency used when `-j` is not given.
pub const DEFAULT_JOBS: i64 = 4;

/// Command-line interface for sub.
#[derive(Parser, Debug)]
#[command(name = "sub")]
#[command(about = "Run a command in many directories at once")]
#[command(override_usage = "sub [OPTIONS] [--] <COMMAND>...")]
pub struct Cli {
    /// Run only in this directory (can be repeated)
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub dirs: Vec<String>,

    /// JSON file holding an array of directories to run in
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of concurrent subprocesses, 0 or less for one per CPU
    #[arg(short, long, default_value_t = DEFAULT_JOBS, allow_negative_numbers = true)]
    pub jobs: i64,

    /// Kill commands that are still running after this many seconds
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Print output as each directory finishes instead of sorted at the end
    #[arg(long)]
    pub stream: bool,

    /// When to colorize status lines: auto, always or never
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Print out the version and exit
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Command to run in each directory, `{}` is replaced by the directory name
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}
