//! Wharf - dependency discovery and legacy configuration import for Go
//! source trees.
//!
//! This crate provides the library behind the `wharf` binary: it walks a
//! project's imports, classifies every dependency as direct or transitive,
//! on disk or not, imports configuration from older tools, and hands the
//! result to a solver to produce `Wharf.toml` and `Wharf.lock`.

pub mod core;
pub mod discovery;
pub mod importers;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities and mocks for Wharf unit tests.
///
/// Mock source managers, package listers, and workspaces, plus helpers for
/// building package trees and throwaway git repositories.
#[cfg(test)]
pub mod test_support;

pub use core::{Lock, Manifest, ProjectRoot, Version};
pub use discovery::{Discovery, ProjectData};
pub use util::context::GlobalContext;
