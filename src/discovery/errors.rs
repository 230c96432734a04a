//! Discovery error types.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::sources::source::SourceError;

/// Fatal errors while discovering dependencies.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum DiscoveryError {
    #[error("import cycle detected on `{package}`")]
    #[diagnostic(
        code(wharf::discovery::import_cycle),
        help("Break the cycle by restructuring the packages involved")
    )]
    ImportCycle { package: String },

    #[error("could not determine the project root of `{import_path}`")]
    #[diagnostic(code(wharf::discovery::deduce_root))]
    DeduceRoot {
        import_path: String,
        #[source]
        source: SourceError,
    },
}
