//! Directory discovery for sub.
//!
//! Turns command line input, config files and the contents of the working
//! directory into the sorted list of directories a command should run in.
//!
//! # Usage
//!
//! ```rust,no_run
//! use sub_config::Discovery;
//!
//! let discovery = Discovery {
//!     root: ".".into(),
//!     ..Default::default()
//! };
//! let (source, dirs) = discovery.resolve().unwrap();
//! println!("{} directories from {:?}", dirs.len(), source);
//! ```

pub mod directory_config;
pub mod discovery;
pub mod error;
pub mod prelude;

pub use directory_config::DirectoryConfig;
pub use discovery::{DirectorySource, Discovery};
