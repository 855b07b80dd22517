//! sub
//!
//! Runs one command in many directories, a bounded number at a time, and
//! prints what each of them produced.
//!
//! Directories come from `-d`, a JSON array passed with `-c`, a `sub.cnf`
//! file in the current directory or, failing those, every visible
//! subdirectory. Every `{}` in the command is replaced by the directory name.
//!
//! Output is held back until everything finished and then printed sorted by
//! directory, each line prefixed with its directory. `--stream` prints it as
//! each directory completes instead.

mod cli;
mod commands;
mod error;
mod prelude;

use std::process::ExitCode;

use clap::{CommandFactory, Parser, error::ErrorKind};
use cli::Cli;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::handle_run;

/// Main entry point for sub.
///
/// # Examples
///
/// ```bash
/// # Pull every repository below the current directory, 8 at a time
/// sub -j 8 git pull
///
/// # Only in two directories, with the directory name as an argument
/// sub -d api -d web -- tar czf ../{}.tar.gz .
/// ```
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sub=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if cli.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if cli.command.is_empty() {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "a command to run is required",
            )
            .exit();
    }

    match handle_run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_task_failure() => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
