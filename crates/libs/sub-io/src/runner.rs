//! High-level process runner with merged output capture.

use std::{
    path::{Path, PathBuf},
    process::ExitStatus,
    time::{Duration, Instant},
};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    sync::mpsc::{UnboundedSender, unbounded_channel},
    task::JoinHandle,
};
use tracing::{debug, trace, warn};

use crate::process::{ProcessError, spawn_process, wait_child};

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutput {
    /// Stdout and stderr bytes, interleaved in the order they were read.
    pub output: Vec<u8>,
    /// Exit status, or why the process could not be run to completion.
    pub status: Result<ExitStatus, ProcessError>,
}

/// Process runner that captures stdout and stderr into one buffer.
#[derive(Debug, Clone)]
pub struct Runner {
    /// Program to execute.
    program: String,
    /// Command line arguments.
    args: Vec<String>,
    /// Directory the program runs in.
    cwd: PathBuf,
    /// Optional limit after which the process is killed.
    timeout: Option<Duration>,
}

impl Runner {
    /// Create a new runner with a program and its arguments.
    ///
    /// The runner starts out executing in the current directory without a
    /// timeout.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sub_io::runner::Runner;
    ///
    /// let runner = Runner::new("ls", vec!["-la", "/tmp"]);
    /// ```
    pub fn new(program: impl Into<String>, args: Vec<impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(|a| a.into()).collect(),
            cwd: PathBuf::from("."),
            timeout: None,
        }
    }

    /// Run the program inside `cwd`.
    pub fn current_dir(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = cwd.as_ref().to_path_buf();
        self
    }

    /// Kill the program if it is still running after `timeout`.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the full command string with arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sub_io::runner::Runner;
    ///
    /// let runner = Runner::new("ls", vec!["-la"]);
    /// assert_eq!(runner.get_full_command(), "ls -la");
    /// ```
    pub fn get_full_command(&self) -> String {
        if self.args.is_empty() {
            return self.program.clone();
        }
        format!("{} {}", &self.program, &self.args.join(" "))
    }

    async fn read_stream<T: AsyncRead + Unpin>(tx: UnboundedSender<Vec<u8>>, mut stream: T) {
        let mut buffer = [0; 1024];
        loop {
            match stream.read(&mut buffer).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    if tx.send(buffer[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    trace!("Stream read stopped: {err}");
                    break;
                }
            }
        }
    }

    fn launch_stream_reader<T>(tx: UnboundedSender<Vec<u8>>, stream: T) -> JoinHandle<()>
    where
        T: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(Runner::read_stream(tx, stream))
    }

    /// Run the process to completion and collect its merged output.
    ///
    /// Never panics and never returns early with an error: spawn failures,
    /// wait failures and timeouts all end up in [`RunOutput::status`]. The
    /// timeout covers both the process and any descendants still holding its
    /// pipes open. Whatever was printed before it expired is still returned.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use sub_io::runner::Runner;
    ///
    /// # async fn example() {
    /// let output = Runner::new("echo", vec!["Hello"]).run().await;
    /// assert!(output.status.is_ok_and(|status| status.success()));
    /// assert_eq!(output.output, b"Hello\n");
    /// # }
    /// ```
    pub async fn run(&self) -> RunOutput {
        let mut child = match spawn_process(&self.program, &self.args, &self.cwd) {
            Ok(child) => child,
            Err(err) => {
                debug!("{} - {err}", self.get_full_command());
                return RunOutput {
                    output: Vec::new(),
                    status: Err(err),
                };
            }
        };
        debug!(
            "Spawned `{}` in {:?} (pid {:?})",
            self.get_full_command(),
            self.cwd,
            child.id()
        );

        // Both pipes feed the same channel so chunks land in arrival order
        let (tx, mut rx) = unbounded_channel();
        let readers: Vec<JoinHandle<()>> = [
            child
                .stdout
                .take()
                .map(|stdout| Runner::launch_stream_reader(tx.clone(), stdout)),
            child
                .stderr
                .take()
                .map(|stderr| Runner::launch_stream_reader(tx.clone(), stderr)),
        ]
        .into_iter()
        .flatten()
        .collect();
        drop(tx);

        let started = Instant::now();
        let mut output = Vec::new();
        let wait = wait_child(&mut child, self.timeout);
        tokio::pin!(wait);

        let mut status = loop {
            tokio::select! {
                status = &mut wait => break status,
                Some(chunk) = rx.recv() => output.extend_from_slice(&chunk),
            }
        };

        // Descendants may outlive the child and keep the pipes open
        if let Some(limit) = self.timeout.filter(|_| status.is_ok()) {
            let remaining = limit.saturating_sub(started.elapsed());
            let drain = async {
                while let Some(chunk) = rx.recv().await {
                    output.extend_from_slice(&chunk);
                }
            };
            if tokio::time::timeout(remaining, drain).await.is_err() {
                warn!(
                    "`{}` left output pipes open after {limit:?}",
                    self.get_full_command()
                );
                status = Err(ProcessError::TimedOut(limit));
            }
        }

        if status.is_err() {
            for reader in readers.iter() {
                reader.abort();
            }
        }
        while let Some(chunk) = rx.recv().await {
            output.extend_from_slice(&chunk);
        }

        RunOutput { output, status }
    }
}

#[cfg(test)]
mod test {
    use ntest::timeout;

    use super::*;

    fn block_on(runner: &Runner) -> RunOutput {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("Couldn't build runtime")
            .block_on(runner.run())
    }

    fn sh(script: &str) -> Runner {
        Runner::new("sh", vec!["-c", script])
    }

    fn bare(program: &str) -> Runner {
        Runner::new(program, Vec::<String>::new())
    }

    fn exited_ok(output: &RunOutput) -> bool {
        matches!(&output.status, Ok(status) if status.success())
    }

    #[test]
    #[timeout(5000)]
    fn test_captures_stdout() {
        let output = block_on(&Runner::new("echo", vec!["Hello", "World"]));
        assert!(exited_ok(&output));
        assert_eq!(output.output, b"Hello World\n");
    }

    #[test]
    #[timeout(5000)]
    fn test_merges_stderr_with_stdout() {
        let output = block_on(&sh("echo out; echo err >&2"));
        assert!(exited_ok(&output));

        let text = String::from_utf8_lossy(&output.output);
        assert!(text.contains("out\n"));
        assert!(text.contains("err\n"));
        assert_eq!(text.len(), "out\nerr\n".len());
    }

    #[test]
    #[timeout(5000)]
    fn test_non_zero_exit() {
        let output = block_on(&sh("echo partial; exit 3"));
        assert!(!exited_ok(&output));
        assert_eq!(output.output, b"partial\n");
        let status = output.status.expect("Process should have exited");
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    #[timeout(5000)]
    fn test_missing_program() {
        let output = block_on(&bare("sub-io-definitely-not-a-program"));
        assert!(!exited_ok(&output));
        assert!(output.output.is_empty());
        assert!(matches!(output.status, Err(ProcessError::Spawn(_))));
    }

    #[test]
    #[timeout(5000)]
    fn test_missing_directory() {
        let runner = bare("pwd").current_dir("/definitely/not/here");
        let output = block_on(&runner);
        assert!(matches!(output.status, Err(ProcessError::Spawn(_))));
    }

    #[test]
    #[timeout(5000)]
    fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().expect("Couldn't create temp dir");
        std::fs::write(dir.path().join("marker.txt"), "").expect("Couldn't write marker");

        let output = block_on(&bare("ls").current_dir(dir.path()));
        assert!(exited_ok(&output));
        assert_eq!(output.output, b"marker.txt\n");
    }

    #[test]
    #[timeout(5000)]
    fn test_timeout_kills_process() {
        let runner = sh("echo started; sleep 30").timeout(Some(Duration::from_millis(200)));

        let start = Instant::now();
        let output = block_on(&runner);

        assert!(start.elapsed() < Duration::from_secs(4));
        assert!(matches!(output.status, Err(ProcessError::TimedOut(_))));
        assert_eq!(output.output, b"started\n");
    }

    #[test]
    #[timeout(5000)]
    fn test_timeout_covers_background_descendants() {
        let runner = sh("sleep 30 & echo hi").timeout(Some(Duration::from_secs(1)));

        let start = Instant::now();
        let output = block_on(&runner);

        assert!(start.elapsed() < Duration::from_secs(4));
        assert!(matches!(output.status, Err(ProcessError::TimedOut(_))));
        assert_eq!(output.output, b"hi\n");
    }

    #[test]
    #[timeout(5000)]
    fn test_quick_exit_within_timeout_succeeds() {
        let output = block_on(&sh("echo fast").timeout(Some(Duration::from_secs(5))));
        assert!(exited_ok(&output));
        assert_eq!(output.output, b"fast\n");
    }

    #[test]
    fn test_full_command() {
        assert_eq!(bare("pwd").get_full_command(), "pwd");
        assert_eq!(
            Runner::new("git", vec!["log", "-1"]).get_full_command(),
            "git log -1"
        );
    }
}
