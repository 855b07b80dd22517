//! Bounded-concurrency execution engine for sub.
//!
//! Runs one command per directory through a fixed-size worker pool and
//! reports the results without interleaving concurrent output.
//!
//! - [`task`]: work items, outcomes and the `{}` command template
//! - [`executor`]: the [`executor::Executor`] seam and its process-backed implementation
//! - [`scheduler`]: the FIFO, semaphore-gated worker pool
//! - [`reporter`]: serialized, colorized status lines
//! - [`collector`]: streaming or sorted batch reporting of captured output
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::{path::Path, sync::Arc};
//! use sub_core::prelude::*;
//! use sub_core::{
//!     collector::{ReportMode, ResultCollector},
//!     executor::ProcessExecutor,
//!     reporter::{ColorChoice, StatusReporter},
//!     scheduler::{Limit, Pool},
//!     task::CommandTemplate,
//! };
//!
//! # async fn example() -> Result<()> {
//! let template = CommandTemplate::new(vec!["git".into(), "pull".into()])?;
//! let items = template.work_items(Path::new("."), &["api".into(), "web".into()]);
//!
//! let reporter = Arc::new(StatusReporter::stdio(ColorChoice::Auto));
//! let collector = Arc::new(ResultCollector::new(ReportMode::Batch, reporter));
//! let pool = Pool::new(ProcessExecutor::new(), Limit::from(4))?;
//!
//! let result = pool.run(items, Arc::clone(&collector)).await;
//! collector.finish();
//! result
//! # }
//! ```

pub mod collector;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod reporter;
pub mod scheduler;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;
