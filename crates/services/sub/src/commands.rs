//! Command handlers for sub.

use std::{path::PathBuf, sync::Arc, time::Duration};

use sub_config::Discovery;
use sub_core::{
    collector::{ReportMode, ResultCollector},
    executor::ProcessExecutor,
    reporter::StatusReporter,
    scheduler::{Limit, Pool},
    task::CommandTemplate,
};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::prelude::*;

/// Runs the command template once in every resolved directory.
///
/// Configuration problems abort before anything is spawned. Once the pool is
/// running, failing directories are reported as they finish and only turn
/// into an error after every directory has run.
pub async fn handle_run(cli: Cli) -> Result<()> {
    let template = CommandTemplate::new(cli.command)?;
    let discovery = Discovery {
        explicit: cli.dirs,
        config: cli.config,
        root: PathBuf::from("."),
    };

    let (source, dirs) = discovery.resolve()?;
    info!("Running in {} directories from {:?}", dirs.len(), source);
    if dirs.is_empty() {
        return Ok(());
    }

    let executor = ProcessExecutor::with_timeout(cli.timeout.map(Duration::from_secs));
    let pool = Pool::new(executor, Limit::from(cli.jobs))?;
    info!("Running {} at a time", pool.capacity());

    let mode = if cli.stream {
        ReportMode::Streaming
    } else {
        ReportMode::Batch
    };
    let reporter = Arc::new(StatusReporter::stdio(cli.color));
    let collector = Arc::new(ResultCollector::new(mode, Arc::clone(&reporter)));

    let items = template.work_items(&PathBuf::new(), &dirs);
    let result = pool.run(items, Arc::clone(&collector)).await;
    collector.finish();

    let summary = match &result {
        Ok(()) => reporter.info(format!("{} directories done", dirs.len())),
        Err(sub_core::error::Error::TasksFailed { failed, total }) => {
            reporter.failure(format!("{failed} of {total} directories failed"))
        }
        Err(_) => Ok(()),
    };
    if let Err(err) = summary {
        warn!("Failed to write summary: {err}");
    }

    Ok(result?)
}
