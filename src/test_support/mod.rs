//! Test utilities and mocks for Wharf unit tests.
//!
//! The mocks stand in for the three external collaborators of discovery and
//! import: the source manager (network), the package lister (parsing), and
//! the workspace (checkouts on disk).

pub mod fixtures;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::core::package_tree::PackageTree;
use crate::core::project::{ProjectIdentifier, ProjectRoot};
use crate::core::version::Version;
use crate::core::workspace::{OnDiskVersion, WorkspaceInspector};
use crate::sources::deduce::deduce_root;
use crate::sources::source::{ListError, PackageLister, SourceError, SourceManager};

pub use fixtures::*;

/// In-memory source manager that records sync requests.
#[derive(Debug, Default)]
pub struct MockSourceManager {
    roots: Vec<ProjectRoot>,
    versions: HashMap<ProjectRoot, Vec<Version>>,
    failing_sync: HashSet<ProjectRoot>,
    sync_delay: Option<Duration>,
    synced: Mutex<Vec<ProjectRoot>>,
}

impl MockSourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root so deduction maps its sub-packages to it.
    pub fn with_root(mut self, root: &str) -> Self {
        self.roots.push(ProjectRoot::new(root));
        self
    }

    pub fn with_versions(mut self, root: &str, versions: Vec<Version>) -> Self {
        let root = ProjectRoot::new(root);
        if !self.roots.contains(&root) {
            self.roots.push(root.clone());
        }
        self.versions.insert(root, versions);
        self
    }

    pub fn with_failing_sync(mut self, root: &str) -> Self {
        self.failing_sync.insert(ProjectRoot::new(root));
        self
    }

    /// Make every sync sleep before recording itself.
    pub fn with_sync_delay(mut self, delay: Duration) -> Self {
        self.sync_delay = Some(delay);
        self
    }

    /// Roots synced so far, sorted.
    pub fn synced(&self) -> Vec<ProjectRoot> {
        let mut synced = self.synced.lock().unwrap().clone();
        synced.sort();
        synced
    }
}

impl SourceManager for MockSourceManager {
    fn deduce_project_root(&self, import_path: &str) -> Result<ProjectRoot, SourceError> {
        let known = self
            .roots
            .iter()
            .filter(|r| r.contains_package(import_path))
            .max_by_key(|r| r.as_str().len());
        match known {
            Some(root) => Ok(root.clone()),
            None => deduce_root(import_path),
        }
    }

    fn list_versions(&self, id: &ProjectIdentifier) -> Result<Vec<Version>, SourceError> {
        Ok(self.versions.get(&id.root).cloned().unwrap_or_default())
    }

    fn sync_source_for(&self, id: &ProjectIdentifier) -> Result<(), SourceError> {
        if let Some(delay) = self.sync_delay {
            std::thread::sleep(delay);
        }
        if self.failing_sync.contains(&id.root) {
            return Err(SourceError::Offline {
                project: id.to_string(),
            });
        }
        self.synced.lock().unwrap().push(id.root.clone());
        Ok(())
    }
}

/// Package lister serving pre-built trees by directory.
#[derive(Debug, Default)]
pub struct MockPackageLister {
    trees: HashMap<PathBuf, PackageTree>,
}

impl MockPackageLister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tree(mut self, dir: impl AsRef<Path>, tree: PackageTree) -> Self {
        self.trees.insert(dir.as_ref().to_path_buf(), tree);
        self
    }
}

impl PackageLister for MockPackageLister {
    fn list_packages(&self, dir: &Path, _import_root: &str) -> Result<PackageTree, ListError> {
        self.trees
            .get(dir)
            .cloned()
            .ok_or_else(|| ListError::NotFound(dir.to_path_buf()))
    }
}

/// Workspace with a fixed set of checkouts.
#[derive(Debug, Default)]
pub struct MockWorkspace {
    projects: HashMap<ProjectRoot, (PathBuf, OnDiskVersion)>,
}

impl MockWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, root: &str, dir: impl AsRef<Path>, version: OnDiskVersion) -> Self {
        self.projects
            .insert(ProjectRoot::new(root), (dir.as_ref().to_path_buf(), version));
        self
    }

    /// Checkout directory used by `with_checkout` for a root.
    pub fn checkout_dir(root: &str) -> PathBuf {
        PathBuf::from("/ws/src").join(root)
    }

    /// A checkout at the conventional mock location with a resolved version.
    pub fn with_checkout(self, root: &str, version: Version) -> Self {
        self.with_project(root, Self::checkout_dir(root), OnDiskVersion::Resolved(version))
    }
}

impl WorkspaceInspector for MockWorkspace {
    fn project_dir(&self, root: &ProjectRoot) -> Option<PathBuf> {
        self.projects.get(root).map(|(dir, _)| dir.clone())
    }

    fn version_in_workspace(&self, root: &ProjectRoot) -> OnDiskVersion {
        self.projects
            .get(root)
            .map(|(_, v)| v.clone())
            .unwrap_or(OnDiskVersion::Absent)
    }
}
