//! Bounded worker pool.
//!
//! Work items are admitted strictly in submission order: the submission loop
//! acquires a permit from a fair semaphore before spawning each task, so once
//! `capacity` tasks are in flight it waits for the oldest free slot before
//! admitting the next item. A failing task never cancels or delays its
//! siblings; failures are only counted and reported once everything is done.

use std::{
    num::NonZero,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::{
    executor::Executor,
    prelude::*,
    task::{TaskError, TaskOutcome, WorkItem},
};

/// Requested number of concurrently running tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Limit {
    /// At most this many tasks at once.
    Max(NonZero<usize>),

    /// One task per available processing unit.
    #[default]
    Auto,
}

impl From<i64> for Limit {
    /// Non-positive values select [`Limit::Auto`].
    fn from(value: i64) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(NonZero::new)
            .map(Limit::Max)
            .unwrap_or(Limit::Auto)
    }
}

impl Limit {
    /// Resolve the limit to a concrete pool capacity.
    ///
    /// Explicit limits are capped at [`Semaphore::MAX_PERMITS`].
    pub fn resolve(self) -> Result<NonZero<usize>> {
        match self {
            Limit::Max(max) => Ok(NonZero::new(max.get().min(Semaphore::MAX_PERMITS))
                .unwrap_or(NonZero::<usize>::MIN)),
            Limit::Auto => std::thread::available_parallelism().map_err(Error::PoolConstruction),
        }
    }
}

/// Receives each outcome as soon as its task completes.
///
/// Called concurrently from the pool's workers.
pub trait OutcomeSink: Send + Sync + 'static {
    fn record(&self, outcome: TaskOutcome);
}

impl<F> OutcomeSink for F
where
    F: Fn(TaskOutcome) + Send + Sync + 'static,
{
    fn record(&self, outcome: TaskOutcome) {
        self(outcome)
    }
}

/// Runs work items through an [`Executor`], at most `capacity` at a time.
pub struct Pool<E> {
    executor: Arc<E>,
    capacity: NonZero<usize>,
}

impl<E: Executor> Pool<E> {
    /// Create a pool, failing if `limit` can't be resolved.
    pub fn new(executor: E, limit: Limit) -> Result<Self> {
        let capacity = limit.resolve()?;
        debug!("Worker pool capacity: {capacity}");
        Ok(Self {
            executor: Arc::new(executor),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Execute every item exactly once and wait for all of them.
    ///
    /// Returns [`Error::TasksFailed`] if any outcome was unsuccessful. That
    /// only happens after the last task has finished.
    pub async fn run<S: OutcomeSink>(&self, items: Vec<WorkItem>, sink: Arc<S>) -> Result<()> {
        let total = items.len();
        let semaphore = Arc::new(Semaphore::new(self.capacity.get()));
        let failed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(total);
        for item in items {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            let executor = Arc::clone(&self.executor);
            let sink = Arc::clone(&sink);
            let failed = Arc::clone(&failed);
            let id = item.id().to_string();
            debug!("{id} - admitted");

            let handle = tokio::spawn(async move {
                let _permit = permit; // Hold permit until done

                let outcome = executor.execute(&item).await;
                if !outcome.succeeded() {
                    failed.fetch_add(1, Ordering::Relaxed);
                }
                sink.record(outcome);
            });
            handles.push((id, handle));
        }

        for (id, handle) in handles {
            if let Err(err) = handle.await {
                error!("{id} - task did not complete: {err}");
                failed.fetch_add(1, Ordering::Relaxed);
                sink.record(TaskOutcome::failure(
                    id,
                    Vec::new(),
                    TaskError::Panicked(err.to_string()),
                ));
            }
        }

        let failed = failed.load(Ordering::Relaxed);
        debug!("{} of {total} tasks succeeded", total - failed);
        if failed > 0 {
            return Err(Error::TasksFailed { failed, total });
        }
        Ok(())
    }
}
