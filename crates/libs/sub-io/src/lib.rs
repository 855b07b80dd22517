//! Process execution and output capture for sub.
//!
//! Spawns external programs inside a working directory, merges their stdout
//! and stderr into a single buffer and optionally kills them after a timeout.
//!
//! # Usage
//!
//! ```rust,no_run
//! use sub_io::runner::Runner;
//!
//! # async fn example() {
//! let runner = Runner::new("git", vec!["status"]).current_dir("some/repo");
//! let output = runner.run().await;
//!
//! println!("{}", String::from_utf8_lossy(&output.output));
//! match output.status {
//!     Ok(status) => println!("exited with {status}"),
//!     Err(err) => println!("failed: {err}"),
//! }
//! # }
//! ```

pub mod process;
pub mod runner;
