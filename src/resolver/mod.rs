//! Solving.
//!
//! The [`Solver`] trait is the boundary to the version solver. It takes the
//! root project's package tree, manifest, and lock, and produces a
//! [`Solution`]: one locked version per required project. It also computes
//! the memo hash of its inputs, stored in the lock to detect staleness.

pub mod errors;
pub mod hash;
pub mod infer;
pub mod local;

pub use errors::SolveError;
pub use local::LocalFirstSolver;

use std::path::Path;

use anyhow::Result;

use crate::core::lock::{Lock, LockedProject};
use crate::core::manifest::Manifest;
use crate::core::package_tree::PackageTree;
use crate::core::project::ProjectRoot;

/// Reads the manifest and lock a dependency declares, in whatever format it
/// uses.
pub trait ProjectAnalyzer: Sync {
    /// Analyzer name and version, folded into the input hash.
    fn info(&self) -> (&'static str, u32);

    /// Derive a manifest and lock for the project checked out at `dir`.
    ///
    /// Returns `None` when the project carries no configuration at all.
    fn derive_manifest_and_lock(
        &self,
        dir: &Path,
        root: &ProjectRoot,
    ) -> Result<Option<(Manifest, Lock)>>;
}

/// Everything a solve depends on.
#[derive(Clone, Copy)]
pub struct SolveParameters<'a> {
    pub root_dir: &'a Path,
    pub root_package_tree: &'a PackageTree,
    pub manifest: &'a Manifest,
    pub lock: &'a Lock,
    pub analyzer: &'a dyn ProjectAnalyzer,
}

impl SolveParameters<'_> {
    /// Import root of the project being solved.
    pub fn import_root(&self) -> ProjectRoot {
        ProjectRoot::new(self.root_package_tree.import_root.as_str())
    }

    /// External, non-standard-library imports of the root project, with
    /// ignored packages removed, plus required packages.
    pub fn external_imports(&self) -> Vec<String> {
        let (reach, _) =
            self.root_package_tree
                .to_reach_map(true, true, false, &self.manifest.ignored);
        let mut imports = reach.flatten_external(true);
        imports.extend(self.manifest.required.iter().cloned());
        imports.sort();
        imports.dedup();
        imports
    }
}

/// The result of a successful solve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    projects: Vec<LockedProject>,
}

impl Solution {
    pub fn new(mut projects: Vec<LockedProject>) -> Self {
        projects.sort_by(|a, b| a.root().cmp(b.root()));
        Solution { projects }
    }

    pub fn projects(&self) -> &[LockedProject] {
        &self.projects
    }

    pub fn into_lock(self) -> Lock {
        Lock::from_projects(self.projects)
    }
}

/// A version solver.
pub trait Solver {
    fn solve(&self, params: &SolveParameters<'_>) -> Result<Solution, SolveError>;

    /// Deterministic digest of the solve inputs.
    fn hash_inputs(&self, params: &SolveParameters<'_>) -> String {
        hash::hash_inputs(params)
    }
}
