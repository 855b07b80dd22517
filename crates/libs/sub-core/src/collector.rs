//! Aggregating task outcomes into status lines and a final report.

use std::{
    collections::BTreeMap,
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

use tracing::warn;

use crate::{reporter::StatusReporter, scheduler::OutcomeSink, task::TaskOutcome};

/// How captured output reaches the primary stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportMode {
    /// Hold all output and print it, sorted by directory, after the run.
    #[default]
    Batch,
    /// Print each task's output as soon as it completes.
    Streaming,
}

/// Collects outcomes from the pool's workers.
///
/// Every outcome immediately produces a `<id>: done` or `<id>: failed: ...`
/// status line. What happens to the captured output depends on the
/// [`ReportMode`].
pub struct ResultCollector {
    mode: ReportMode,
    reporter: Arc<StatusReporter>,
    outputs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl ResultCollector {
    pub fn new(mode: ReportMode, reporter: Arc<StatusReporter>) -> Self {
        Self {
            mode,
            reporter,
            outputs: Mutex::new(BTreeMap::new()),
        }
    }

    /// Print the batch report and drop the stored output.
    ///
    /// Lines are prefixed with their directory id and directories come out in
    /// lexicographic order. Does nothing in streaming mode, where output was
    /// already printed.
    pub fn finish(&self) {
        let outputs = std::mem::take(
            &mut *self
                .outputs
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        for (id, output) in outputs.iter() {
            let mut block = Vec::new();
            if let Err(err) = write_prefixed(&mut block, id, output) {
                warn!("{id} - failed to format output: {err}");
                continue;
            }
            if let Err(err) = self.reporter.write_output(&block) {
                self.report_write_error(id, &err);
            }
        }
    }

    fn report_write_error(&self, id: &str, err: &io::Error) {
        if let Err(status_err) = self
            .reporter
            .failure(format!("{id}: failed to write output: {err}"))
        {
            warn!("{id} - failed to report write error: {status_err}");
        }
    }
}

impl OutcomeSink for ResultCollector {
    fn record(&self, outcome: TaskOutcome) {
        let status = match &outcome.error {
            None => self.reporter.success(format!("{}: done", outcome.id)),
            Some(err) => self
                .reporter
                .failure(format!("{}: failed: {}", outcome.id, err)),
        };
        if let Err(err) = status {
            warn!("{} - failed to write status line: {err}", outcome.id);
        }

        match self.mode {
            ReportMode::Streaming => {
                if let Err(err) = self.reporter.write_output(&outcome.output) {
                    self.report_write_error(&outcome.id, &err);
                }
            }
            ReportMode::Batch => {
                if !outcome.output.is_empty() {
                    self.outputs
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(outcome.id, outcome.output);
                }
            }
        }
    }
}

/// Write every line of `output` as `<id>: <line>`.
///
/// A final line without a trailing newline is still written, with one.
pub fn write_prefixed<W: Write>(mut writer: W, id: &str, output: &[u8]) -> io::Result<()> {
    for line in String::from_utf8_lossy(output).lines() {
        writeln!(writer, "{id}: {line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::num::NonZero;

    use tokio::sync::watch;

    use super::*;
    use crate::{
        executor::Executor,
        scheduler::{Limit, Pool},
        task::{TaskError, WorkItem},
        testing::SharedBuffer,
    };

    /// Completes directories in `order`, each one only after the previous one
    /// was recorded. Directories not in `order` complete immediately.
    struct Gated {
        order: Vec<&'static str>,
        turn: Arc<watch::Sender<usize>>,
        failing: &'static str,
    }

    impl Gated {
        fn new(order: Vec<&'static str>) -> Self {
            Self {
                order,
                turn: Arc::new(watch::Sender::new(0)),
                failing: "",
            }
        }
    }

    impl Executor for Gated {
        async fn execute(&self, item: &WorkItem) -> TaskOutcome {
            if let Some(position) = self.order.iter().position(|id| *id == item.id()) {
                let mut turn = self.turn.subscribe();
                let _ = turn.wait_for(|turn| *turn == position).await;
            }

            let output = format!("first {}\nsecond {}\n", item.id(), item.id()).into_bytes();
            if item.id() == self.failing {
                let status = std::io::Error::other("exit status: 1");
                return TaskOutcome::failure(item.id(), output, TaskError::Spawn(status));
            }
            TaskOutcome::success(item.id(), output)
        }
    }

    /// Hands outcomes to the collector, then lets the next gated task finish.
    struct Sequenced {
        collector: Arc<ResultCollector>,
        turn: Arc<watch::Sender<usize>>,
    }

    impl OutcomeSink for Sequenced {
        fn record(&self, outcome: TaskOutcome) {
            self.collector.record(outcome);
            self.turn.send_modify(|turn| *turn += 1);
        }
    }

    fn items(ids: &[&str]) -> Vec<WorkItem> {
        ids.iter()
            .map(|id| WorkItem::new(*id, vec!["true".into()], *id).unwrap())
            .collect()
    }

    fn collector(mode: ReportMode) -> (Arc<ResultCollector>, SharedBuffer, SharedBuffer) {
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let reporter = Arc::new(StatusReporter::new(out.clone(), err.clone(), false));
        (
            Arc::new(ResultCollector::new(mode, reporter)),
            out,
            err,
        )
    }

    /// Run `b`, `a`, `c` so that they complete as `b`, `c`, `a`.
    async fn run_out_of_order(collector: &Arc<ResultCollector>) {
        let executor = Gated::new(vec!["b", "c", "a"]);
        let sink = Arc::new(Sequenced {
            collector: Arc::clone(collector),
            turn: Arc::clone(&executor.turn),
        });
        let pool = Pool::new(executor, limit(3)).unwrap();

        pool.run(items(&["b", "a", "c"]), sink).await.unwrap();
    }

    fn limit(n: usize) -> Limit {
        Limit::Max(NonZero::new(n).unwrap())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_batch_report_is_sorted_by_directory() {
        let (collector, out, _) = collector(ReportMode::Batch);

        run_out_of_order(&collector).await;

        // Only status lines so far, in completion order
        assert_eq!(out.contents(), "b: done\nc: done\na: done\n");

        collector.finish();
        assert_eq!(
            out.contents(),
            "b: done\nc: done\na: done\n\
             a: first a\na: second a\n\
             b: first b\nb: second b\n\
             c: first c\nc: second c\n"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_streaming_prints_in_completion_order() {
        let (collector, out, _) = collector(ReportMode::Streaming);

        run_out_of_order(&collector).await;
        collector.finish();

        assert_eq!(
            out.contents(),
            "b: done\nfirst b\nsecond b\n\
             c: done\nfirst c\nsecond c\n\
             a: done\nfirst a\nsecond a\n"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failed_task_still_reported() {
        let (collector, out, err) = collector(ReportMode::Batch);
        let executor = Gated {
            failing: "b",
            ..Gated::new(Vec::new())
        };
        let pool = Pool::new(executor, limit(2)).unwrap();

        let result = pool
            .run(items(&["a", "b", "c"]), Arc::clone(&collector))
            .await;
        collector.finish();

        assert!(result.is_err());
        assert_eq!(err.contents(), "b: failed: exit status: 1\n");

        let out = out.contents();
        let report: Vec<&str> = out.lines().filter(|l| l.contains("first")).collect();
        assert_eq!(report, vec!["a: first a", "b: first b", "c: first c"]);
        assert_eq!(out.matches(": done").count(), 2);
    }

    #[test]
    fn test_empty_output_is_skipped() {
        let (collector, out, _) = collector(ReportMode::Batch);

        collector.record(TaskOutcome::success("quiet", Vec::new()));
        collector.record(TaskOutcome::success("loud", b"hi".to_vec()));
        collector.finish();

        assert_eq!(out.contents(), "quiet: done\nloud: done\nloud: hi\n");
    }

    #[test]
    fn test_finish_drains_stored_output() {
        let (collector, out, _) = collector(ReportMode::Batch);

        collector.record(TaskOutcome::success("x", b"1\n".to_vec()));
        collector.finish();
        collector.finish();

        assert_eq!(out.contents(), "x: done\nx: 1\n");
    }

    #[test]
    fn test_write_prefixed_handles_missing_newline() {
        let mut buffer = Vec::new();
        write_prefixed(&mut buffer, "dir", b"one\ntwo\r\nthree").unwrap();
        assert_eq!(buffer, b"dir: one\ndir: two\ndir: three\n");
    }
}
