//! Legacy configuration import.
//!
//! Each supported foreign tool has a converter that detects the tool's files
//! and turns them into a [`Manifest`] and [`Lock`]. When several tools'
//! files are present their outputs are composed, later tools overriding
//! earlier ones.

mod analyzer;
mod base;
pub mod compose;
mod glide;
mod godep;
mod govend;
mod govendor;

pub use analyzer::RootAnalyzer;
pub use base::{is_default_source, Converter, ImportedPackage};
pub use compose::{merge_locks, merge_manifests};

use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::lock::Lock;
use crate::core::manifest::Manifest;
use crate::core::project::ProjectRoot;
use crate::sources::source::{SourceError, SourceManager};
use crate::util::shell::Status;
use crate::util::GlobalContext;

/// Errors raised while importing legacy configuration.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ImportError {
    #[error("invalid {tool} {file}: {message}")]
    #[diagnostic(
        code(wharf::import::invalid),
        help("Fix the file, or retry with `--skip-tools` to ignore legacy configuration")
    )]
    Invalid {
        tool: &'static str,
        file: &'static str,
        message: String,
    },

    #[error("failed to read {}", path.display())]
    #[diagnostic(code(wharf::import::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    #[diagnostic(code(wharf::import::parse))]
    Parse { path: PathBuf, message: String },

    #[error("could not determine the project root of `{import_path}`")]
    #[diagnostic(code(wharf::import::deduce_root))]
    DeduceRoot {
        import_path: String,
        #[source]
        source: SourceError,
    },
}

impl ImportError {
    pub(crate) fn invalid(tool: &'static str, file: &'static str, message: impl Into<String>) -> Self {
        ImportError::Invalid {
            tool,
            file,
            message: message.into(),
        }
    }
}

pub(crate) fn read_file(path: &Path) -> Result<String, ImportError> {
    std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// A supported foreign dependency tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importer {
    Glide,
    Godep,
    Govend,
    Govendor,
}

impl Importer {
    /// Every converter, in composition order.
    pub const ALL: [Importer; 4] = [
        Importer::Glide,
        Importer::Godep,
        Importer::Govend,
        Importer::Govendor,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Importer::Glide => "glide",
            Importer::Godep => "godep",
            Importer::Govend => "govend",
            Importer::Govendor => "govendor",
        }
    }

    /// Whether the tool's files exist in `dir`. Nothing is parsed.
    pub fn has_metadata(&self, dir: &Path) -> bool {
        match self {
            Importer::Glide => glide::has_metadata(dir),
            Importer::Godep => godep::has_metadata(dir),
            Importer::Govend => govend::has_metadata(dir),
            Importer::Govendor => govendor::has_metadata(dir),
        }
    }

    /// Parse the tool's files in `dir` and convert them.
    pub fn import(
        &self,
        ctx: &GlobalContext,
        sm: &dyn SourceManager,
        dir: &Path,
        root: &ProjectRoot,
    ) -> Result<(Manifest, Lock), ImportError> {
        let mut conv = Converter::new(ctx, sm);
        match self {
            Importer::Glide => glide::import(&mut conv, dir, root)?,
            Importer::Godep => godep::import(&mut conv, dir)?,
            Importer::Govend => govend::import(&mut conv, dir)?,
            Importer::Govendor => govendor::import(&mut conv, dir, root)?,
        }
        Ok(conv.finish())
    }
}

/// Import every enabled tool's configuration found in `dir`.
///
/// Returns `None` when no enabled tool has files there.
pub fn import_legacy(
    ctx: &GlobalContext,
    sm: &dyn SourceManager,
    dir: &Path,
    root: &ProjectRoot,
) -> Result<Option<(Manifest, Lock)>, ImportError> {
    let mut result: Option<(Manifest, Lock)> = None;

    for importer in Importer::ALL {
        if !ctx.config().import_enabled(importer.name()) || !importer.has_metadata(dir) {
            continue;
        }

        ctx.shell().status(
            Status::Importing,
            format!("configuration from {}", importer.name()),
        );
        let (manifest, lock) = importer.import(ctx, sm, dir, root)?;

        result = Some(match result {
            None => (manifest, lock),
            Some((m, l)) => (merge_manifests(m, manifest), merge_locks(l, lock)),
        });
    }

    Ok(result)
}
