//! Project identification - WHICH project an import path belongs to.
//!
//! A [`ProjectRoot`] is the import-path prefix of one versioned unit (usually
//! a repository root). Every package path maps to exactly one root once it
//! has been deduced; all maps in this crate are keyed by root, never by raw
//! package path.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical import-path prefix identifying one external dependency.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectRoot(String);

impl ProjectRoot {
    pub fn new(root: impl Into<String>) -> Self {
        ProjectRoot(root.into().trim_end_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a package path lives in this project.
    pub fn contains_package(&self, pkg: &str) -> bool {
        pkg == self.0
            || (pkg.starts_with(self.0.as_str()) && pkg[self.0.len()..].starts_with('/'))
    }

    /// Express a package path relative to this root.
    ///
    /// The root package itself becomes `.`; anything outside the root is
    /// returned unchanged.
    pub fn relative_package(&self, pkg: &str) -> String {
        if pkg == self.0 {
            ".".to_string()
        } else if self.contains_package(pkg) {
            pkg[self.0.len() + 1..].to_string()
        } else {
            pkg.to_string()
        }
    }

    /// Inverse of [`ProjectRoot::relative_package`].
    pub fn absolute_package(&self, rel: &str) -> String {
        match rel {
            "." | "" => self.0.clone(),
            rel => format!("{}/{}", self.0, rel.trim_start_matches("./")),
        }
    }
}

impl fmt::Display for ProjectRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectRoot {
    fn from(s: &str) -> Self {
        ProjectRoot::new(s)
    }
}

impl From<String> for ProjectRoot {
    fn from(s: String) -> Self {
        ProjectRoot::new(s)
    }
}

impl AsRef<str> for ProjectRoot {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A project root plus an optional alternate source location.
///
/// Two identifiers with the same root but different sources (a fork, a
/// mirror) are distinct for solving purposes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectIdentifier {
    pub root: ProjectRoot,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ProjectIdentifier {
    pub fn new(root: ProjectRoot) -> Self {
        ProjectIdentifier { root, source: None }
    }

    pub fn with_source(root: ProjectRoot, source: Option<String>) -> Self {
        let source = source.filter(|s| !s.is_empty());
        ProjectIdentifier { root, source }
    }

    /// The location to fetch from: the explicit source, or the root itself.
    pub fn normalized_source(&self) -> &str {
        self.source.as_deref().unwrap_or_else(|| self.root.as_str())
    }
}

impl From<ProjectRoot> for ProjectIdentifier {
    fn from(root: ProjectRoot) -> Self {
        ProjectIdentifier::new(root)
    }
}

impl fmt::Display for ProjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{} ({})", self.root, source),
            None => write!(f, "{}", self.root),
        }
    }
}

/// Check whether an import path refers to the standard library.
///
/// Standard library paths have no dot in their first element (`fmt`,
/// `net/http`, `C`).
pub fn is_standard_import_path(path: &str) -> bool {
    let first = path.split('/').next().unwrap_or(path);
    !first.contains('.')
}
