//! Source traits - the interfaces the discovery engine and converters consume.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::constraint::Constraint;
use crate::core::package_tree::PackageTree;
use crate::core::project::{ProjectIdentifier, ProjectRoot};
use crate::core::version::Version;
use crate::resolver::infer::infer_constraint_from_versions;

/// Errors raised by a source manager.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("import path is empty")]
    EmptyImportPath,

    #[error("`{0}` is part of the standard library")]
    StandardLibrary(String),

    #[error("unable to deduce repository root for `{import_path}`: {reason}")]
    Deduction { import_path: String, reason: String },

    #[error("git operation failed for {project}")]
    Git {
        project: String,
        #[source]
        source: git2::Error,
    },

    #[error("{project} is not cached and the network is disabled")]
    Offline { project: String },

    #[error("`{hint}` is not a valid version for {project}")]
    InvalidVersion { hint: String, project: String },

    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Knows where projects live upstream and which versions they have.
///
/// Implementations must be usable from several threads at once: source
/// synchronization runs concurrently with graph traversal.
pub trait SourceManager: Send + Sync {
    /// Deduce the project root owning an import path.
    fn deduce_project_root(&self, import_path: &str) -> Result<ProjectRoot, SourceError>;

    /// List known versions of a project, each paired with its revision.
    fn list_versions(&self, id: &ProjectIdentifier) -> Result<Vec<Version>, SourceError>;

    /// Fetch or refresh the cached source of a project.
    fn sync_source_for(&self, id: &ProjectIdentifier) -> Result<(), SourceError>;

    /// Turn a free-form version string into a constraint.
    ///
    /// An empty hint means "any". Otherwise, in order: an exact branch
    /// name, a semver range (bare versions get an implied caret), an exact
    /// tag, then a full or abbreviated revision.
    fn infer_constraint(
        &self,
        hint: &str,
        id: &ProjectIdentifier,
    ) -> Result<Constraint, SourceError> {
        if hint.is_empty() {
            return Ok(Constraint::Any);
        }

        let versions = self.list_versions(id)?;
        infer_constraint_from_versions(hint, versions).ok_or_else(|| SourceError::InvalidVersion {
            hint: hint.to_string(),
            project: id.to_string(),
        })
    }
}

/// Errors raised while listing packages on disk.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("directory does not exist: {0}")]
    NotFound(PathBuf),

    #[error("failed to walk {path}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Parses source packages in a directory into a [`PackageTree`].
pub trait PackageLister: Sync {
    fn list_packages(&self, dir: &Path, import_root: &str) -> Result<PackageTree, ListError>;
}
