//! Dependency discovery.
//!
//! Starting from the root project's package tree, discovery finds every
//! external project the root reaches, directly or through other projects,
//! and classifies each as checked out in the workspace (with its version)
//! or not. Checked-out direct dependencies also get an initial constraint
//! derived from their version.

mod engine;
pub mod errors;

pub use engine::Discovery;
pub use errors::DiscoveryError;

use std::collections::{BTreeMap, BTreeSet};

use crate::core::lock::{Lock, LockedProject};
use crate::core::manifest::{Manifest, ProjectProperties};
use crate::core::project::{ProjectIdentifier, ProjectRoot};
use crate::core::version::Version;

/// What discovery learned about the root project's dependencies.
///
/// `ondisk` and `notondisk` never share a root, and every root in either
/// has an entry in `dependencies`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectData {
    /// Initial constraints for checked-out direct dependencies
    pub constraints: BTreeMap<ProjectRoot, ProjectProperties>,
    /// Import paths used from each dependency, sorted
    pub dependencies: BTreeMap<ProjectRoot, Vec<String>>,
    /// Roots the root project imports directly
    pub direct: BTreeSet<ProjectRoot>,
    /// Checked-out dependencies and their versions
    pub ondisk: BTreeMap<ProjectRoot, Version>,
    /// Dependencies with no usable checkout
    pub notondisk: BTreeSet<ProjectRoot>,
}

impl ProjectData {
    /// Manifest holding the discovered constraints.
    pub fn manifest(&self) -> Manifest {
        Manifest {
            constraints: self.constraints.clone(),
            ..Manifest::default()
        }
    }

    /// Lock pinning every checked-out dependency to its on-disk version.
    ///
    /// Packages are recorded relative to their project root.
    pub fn lock(&self) -> Lock {
        let projects = self
            .ondisk
            .iter()
            .map(|(root, version)| {
                let packages = self
                    .dependencies
                    .get(root)
                    .map(|ips| ips.iter().map(|ip| root.relative_package(ip)).collect())
                    .unwrap_or_default();
                LockedProject::new(ProjectIdentifier::new(root.clone()), version.clone(), packages)
            })
            .collect();

        Lock::from_projects(projects)
    }
}
