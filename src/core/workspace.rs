//! Workspace inspection - which dependency versions are already on disk.
//!
//! Dependencies checked out under a search root live at
//! `<search root>/src/<project root>`. The version of such a checkout is read
//! from its git metadata.

use std::path::{Path, PathBuf};

use git2::Repository;

use crate::core::project::ProjectRoot;
use crate::core::version::{upgrade_cmp, Revision, UnpairedVersion, Version};
use crate::util::GlobalContext;

/// Outcome of looking for a project's version in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnDiskVersion {
    /// The project is checked out and its version is known.
    Resolved(Version),
    /// No checkout exists under any search root.
    Absent,
    /// A checkout exists but its version could not be determined.
    Unknown(String),
}

impl OnDiskVersion {
    pub fn resolved(&self) -> Option<&Version> {
        match self {
            OnDiskVersion::Resolved(v) => Some(v),
            _ => None,
        }
    }
}

/// Read-only view of projects present in the local workspace.
pub trait WorkspaceInspector: Sync {
    /// Directory holding the checkout for a project root, if one exists.
    fn project_dir(&self, root: &ProjectRoot) -> Option<PathBuf>;

    /// Determine the checked-out version of a project.
    fn version_in_workspace(&self, root: &ProjectRoot) -> OnDiskVersion;
}

/// Git-backed workspace made of one or more search roots.
#[derive(Debug, Clone)]
pub struct Workspace {
    search_paths: Vec<PathBuf>,
}

impl Workspace {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Workspace { search_paths }
    }

    pub fn from_context(ctx: &GlobalContext) -> Self {
        Self::new(ctx.search_paths().to_vec())
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl WorkspaceInspector for Workspace {
    fn project_dir(&self, root: &ProjectRoot) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .map(|p| p.join("src").join(root.as_str()))
            .find(|dir| dir.is_dir())
    }

    fn version_in_workspace(&self, root: &ProjectRoot) -> OnDiskVersion {
        match self.project_dir(root) {
            Some(dir) => vcs_version(&dir),
            None => OnDiskVersion::Absent,
        }
    }
}

/// Read the version of a git checkout.
///
/// HEAD at a tag yields the tag (semver preferred, newest first) paired with
/// the revision; HEAD on a branch yields the branch paired with the revision;
/// a detached HEAD yields the bare revision.
pub fn vcs_version(dir: &Path) -> OnDiskVersion {
    let repo = match Repository::open(dir) {
        Ok(repo) => repo,
        Err(e) => return OnDiskVersion::Unknown(format!("not a git checkout: {}", e.message())),
    };

    let head = match repo.head() {
        Ok(head) => head,
        Err(e) => return OnDiskVersion::Unknown(format!("unreadable HEAD: {}", e.message())),
    };

    let commit = match head.peel_to_commit() {
        Ok(commit) => commit,
        Err(e) => return OnDiskVersion::Unknown(format!("HEAD is not a commit: {}", e.message())),
    };
    let revision = Revision::new(commit.id().to_string());

    let mut tags: Vec<Version> = repo
        .tag_names(None)
        .map(|names| {
            names
                .iter()
                .flatten()
                .filter(|name| {
                    repo.find_reference(&format!("refs/tags/{}", name))
                        .and_then(|r| r.peel_to_commit())
                        .map(|c| c.id() == commit.id())
                        .unwrap_or(false)
                })
                .map(|name| Version::Unpaired(UnpairedVersion::from_tag(name)))
                .collect()
        })
        .unwrap_or_default();

    if !tags.is_empty() {
        tags.sort_by(upgrade_cmp);
        if let Some(Version::Unpaired(tag)) = tags.into_iter().next() {
            return OnDiskVersion::Resolved(tag.pair(revision));
        }
    }

    if head.is_branch() {
        if let Some(name) = head.shorthand() {
            return OnDiskVersion::Resolved(UnpairedVersion::branch(name).pair(revision));
        }
    }

    OnDiskVersion::Resolved(Version::Revision(revision))
}
