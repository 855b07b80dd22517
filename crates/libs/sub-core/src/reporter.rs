//! Serialized, colorized status lines.

use std::{
    fmt::Display,
    io::{self, IsTerminal, Write},
    str::FromStr,
    sync::{Mutex, MutexGuard, PoisonError},
};

use owo_colors::OwoColorize;

/// Severity of a status line, which also decides its stream and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Failure,
}

/// When status lines are colorized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorChoice {
    /// Only when stdout is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn enabled(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::env::var_os("NO_COLOR").is_none()
                    && !std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false)
                    && io::stdout().is_terminal()
            }
        }
    }
}

impl FromStr for ColorChoice {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            other => Err(format!(
                "invalid color choice `{other}` (expected auto, always or never)"
            )),
        }
    }
}

struct Streams {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

/// Writes status lines and captured output without interleaving.
///
/// Every write happens inside one exclusive section shared by both streams,
/// held only for the formatting and writing of a single line or block.
pub struct StatusReporter {
    streams: Mutex<Streams>,
    color: bool,
}

impl StatusReporter {
    pub fn new(
        out: impl Write + Send + 'static,
        err: impl Write + Send + 'static,
        color: bool,
    ) -> Self {
        Self {
            streams: Mutex::new(Streams {
                out: Box::new(out),
                err: Box::new(err),
            }),
            color,
        }
    }

    /// Reporter bound to the process' stdout and stderr.
    pub fn stdio(color: ColorChoice) -> Self {
        Self::new(io::stdout(), io::stderr(), color.enabled())
    }

    pub fn info(&self, message: impl Display) -> io::Result<()> {
        self.emit(Severity::Info, message)
    }

    pub fn success(&self, message: impl Display) -> io::Result<()> {
        self.emit(Severity::Success, message)
    }

    pub fn failure(&self, message: impl Display) -> io::Result<()> {
        self.emit(Severity::Failure, message)
    }

    /// Write raw bytes to the primary stream.
    pub fn write_output(&self, bytes: &[u8]) -> io::Result<()> {
        let mut streams = self.lock();
        streams.out.write_all(bytes)?;
        streams.out.flush()
    }

    fn emit(&self, severity: Severity, message: impl Display) -> io::Result<()> {
        let mut streams = self.lock();
        let line = self.format(severity, message);
        let stream = match severity {
            Severity::Info | Severity::Success => &mut streams.out,
            Severity::Failure => &mut streams.err,
        };
        stream.write_all(line.as_bytes())?;
        stream.flush()
    }

    fn format(&self, severity: Severity, message: impl Display) -> String {
        if !self.color {
            return format!("{message}\n");
        }
        let message = message.to_string();
        match severity {
            Severity::Info => format!("{}\n", message.bold().blue()),
            Severity::Success => format!("{}\n", message.bold().purple()),
            Severity::Failure => format!("{}\n", message.bold().red()),
        }
    }

    // Streams carry no state between lines; poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Streams> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
