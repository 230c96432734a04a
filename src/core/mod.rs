//! Core data structures for Wharf.
//!
//! Versions and constraints, project identity, the manifest and lock
//! files, package trees with their reachability maps, and the workspace
//! view of checked-out projects.

pub mod constraint;
pub mod feedback;
pub mod lock;
pub mod manifest;
pub mod package_tree;
pub mod project;
pub mod version;
pub mod workspace;

pub use constraint::Constraint;
pub use feedback::{DependencyType, Feedback};
pub use lock::{Lock, LockedProject, LOCKFILE_NAME};
pub use manifest::{Manifest, ProjectProperties, MANIFEST_NAME};
pub use package_tree::{Package, PackageTree, ReachMap};
pub use project::{ProjectIdentifier, ProjectRoot};
pub use version::{Revision, UnpairedVersion, Version};
pub use workspace::{OnDiskVersion, Workspace, WorkspaceInspector};
