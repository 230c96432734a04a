//! Centralized user-facing output.
//!
//! The Shell is the only place feedback about discovered, imported and
//! locked dependencies is written. It is owned by the [`GlobalContext`] and
//! passed explicitly to every component that reports to the user.
//!
//! [`GlobalContext`]: crate::util::GlobalContext

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only, no spinners
    Quiet,
    /// Default: status messages and spinners
    #[default]
    Normal,
    /// --verbose: extra detail, no spinners
    Verbose,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Using,
    Locking,
    Created,
    Finished,

    // In-progress statuses (cyan)
    Searching,
    Importing,
    Resolving,

    // Info
    Info,

    // Warning statuses (yellow)
    Skipped,
    Warning,

    // Error status (red)
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Using => "Using",
            Status::Locking => "Locking",
            Status::Created => "Created",
            Status::Finished => "Finished",
            Status::Searching => "Searching",
            Status::Importing => "Importing",
            Status::Resolving => "Resolving",
            Status::Info => "Info",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Using | Status::Locking | Status::Created | Status::Finished => "\x1b[1;32m",
            Status::Searching | Status::Importing | Status::Resolving => "\x1b[1;36m",
            Status::Info => "\x1b[1;34m",
            Status::Skipped | Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

/// Where shell output ends up.
#[derive(Debug, Clone)]
enum Sink {
    Stderr,
    /// In-memory buffer, used by tests to assert on feedback.
    Capture(Arc<Mutex<Vec<u8>>>),
}

/// Central shell for all user-facing output.
#[derive(Debug, Clone)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
    sink: Sink,
}

impl Shell {
    /// Create a shell writing to stderr.
    pub fn new(verbosity: Verbosity) -> Self {
        Shell {
            verbosity,
            use_color: io::stderr().is_terminal(),
            sink: Sink::Stderr,
        }
    }

    /// Create a shell from CLI flags. Quiet wins over verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: bool) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        let mut shell = Shell::new(verbosity);
        shell.use_color &= color;
        shell
    }

    /// Create a shell that records everything into a shared buffer.
    pub fn capture(verbosity: Verbosity) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let shell = Shell {
            verbosity,
            use_color: false,
            sink: Sink::Capture(Arc::clone(&buffer)),
        };
        (shell, buffer)
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Print a status message.
    ///
    /// Format: `{status:>12} {message}`. In quiet mode only errors are printed.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() && status != Status::Error {
            return;
        }

        let line = format!("{} {}\n", self.format_status(status), msg);
        self.write_line(&line);
    }

    /// Print a message only in verbose mode.
    pub fn verbose(&self, status: Status, msg: impl Display) {
        if self.is_verbose() {
            self.status(status, msg);
        }
    }

    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    pub fn error(&self, msg: impl Display) {
        self.status(Status::Error, msg);
    }

    /// Print a raw, pre-formatted block (e.g. a rendered diagnostic).
    pub fn print_raw(&self, text: &str) {
        self.write_line(text);
    }

    /// Create a spinner for a long-running step.
    ///
    /// Hidden unless the shell writes to an interactive stderr in normal
    /// verbosity; verbose mode prints status lines instead.
    pub fn spinner(&self, msg: impl Display) -> ProgressBar {
        let interactive = matches!(self.sink, Sink::Stderr)
            && self.verbosity == Verbosity::Normal
            && io::stderr().is_terminal();

        if !interactive {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    fn format_status(&self, status: Status) -> String {
        if self.use_color {
            format!("{}{:>12}\x1b[0m", status.color_code(), status.as_str())
        } else {
            format!("{:>12}", status.as_str())
        }
    }

    fn write_line(&self, line: &str) {
        match &self.sink {
            Sink::Stderr => {
                let mut stderr = io::stderr().lock();
                let _ = stderr.write_all(line.as_bytes());
            }
            Sink::Capture(buffer) => {
                if let Ok(mut buffer) = buffer.lock() {
                    buffer.extend_from_slice(line.as_bytes());
                }
            }
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal)
    }
}

/// Read a capture buffer back as a string.
pub fn captured(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
    buffer
        .lock()
        .map(|b| String::from_utf8_lossy(&b).into_owned())
        .unwrap_or_default()
}
