//! Solve error types and diagnostics.

use thiserror::Error;

use crate::sources::source::SourceError;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error during solving.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("no matching version for `{project}`")]
    NoMatchingVersion {
        project: String,
        /// (required by, constraint)
        constraints: Vec<(String, String)>,
        available: Vec<String>,
    },

    #[error("could not determine the project for `{import_path}`")]
    DeduceRoot {
        import_path: String,
        #[source]
        source: SourceError,
    },

    #[error("could not list versions of `{project}`")]
    Source {
        project: String,
        #[source]
        source: SourceError,
    },
}

impl SolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            SolveError::NoMatchingVersion {
                project,
                constraints,
                available,
            } => {
                let mut diag = Diagnostic::error(format!("no version of `{}` satisfies every constraint", project));

                for (by, constraint) in constraints {
                    diag = diag.with_context(format!("`{}` requires {} {}", by, project, constraint));
                }

                if !available.is_empty() {
                    diag = diag.with_context(format!("available versions: {}", available.join(", ")));
                }

                diag.with_suggestion(format!("Relax the constraint on `{}` in Wharf.toml", project))
            }

            SolveError::DeduceRoot { import_path, source } => {
                Diagnostic::error(format!("could not determine the project for `{}`", import_path))
                    .with_context(source.to_string())
            }

            SolveError::Source { project, source } => {
                Diagnostic::error(format!("could not list versions of `{}`", project))
                    .with_context(source.to_string())
                    .with_suggestion(suggestions::NETWORK)
            }
        }
    }
}
