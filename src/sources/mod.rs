//! Project sources.
//!
//! Sources know how import paths map to project roots, which versions a
//! project has upstream, and how to list the packages in a checkout.

pub mod deduce;
pub mod git;
pub mod go_packages;
pub mod source;

pub use git::GitSourceManager;
pub use go_packages::GoPackageLister;
pub use source::{ListError, PackageLister, SourceError, SourceManager};
