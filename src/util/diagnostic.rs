//! User-friendly diagnostic messages.
//!
//! Fatal errors are rendered with their root cause, the context that led to
//! them, and suggested fixes.

use std::fmt;

use crate::util::shell::Shell;

/// Common suggestion messages.
pub mod suggestions {
    pub const EXISTING_MANIFEST: &str =
        "Remove the existing Wharf.toml and Wharf.lock to start over";

    pub const OUTSIDE_SEARCH_PATH: &str =
        "Pass the project's import path with `--root`, or set WHARF_PATH";

    pub const IMPORT_CYCLE: &str = "Break the cycle by restructuring the packages involved";

    pub const NETWORK: &str = "Check your network connection, or retry with `--offline`";

    pub const SKIP_TOOLS: &str = "Retry with `--skip-tools` to ignore legacy configuration";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self) -> String {
        let mut output = format!("{}: {}\n", self.severity, self.message);

        for ctx in &self.context {
            output.push_str(&format!("  -> {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push_str("\nhelp: consider:\n");
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }

    /// Write the diagnostic through the shell.
    pub fn emit(&self, shell: &Shell) {
        shell.print_raw(&self.format());
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}
