//! Static project-root deduction for well-known hosts.

use crate::core::project::{is_standard_import_path, ProjectRoot};
use crate::sources::source::SourceError;

/// Hosts laid out as `host/owner/repo`.
const OWNER_REPO_HOSTS: &[&str] = &["github.com", "bitbucket.org", "gitlab.com"];

/// Vanity prefixes whose root is the prefix plus one element.
const SINGLE_ELEMENT_PREFIXES: &[&str] = &[
    "golang.org/x",
    "google.golang.org",
    "cloud.google.com",
    "go.uber.org",
    "k8s.io",
    "sigs.k8s.io",
];

/// Suffixes that mark the repository element of an import path.
const VCS_SUFFIXES: &[&str] = &[".git", ".hg", ".bzr", ".svn"];

/// Deduce the project root of an import path.
pub fn deduce_root(import_path: &str) -> Result<ProjectRoot, SourceError> {
    let import_path = import_path.trim().trim_end_matches('/');
    if import_path.is_empty() {
        return Err(SourceError::EmptyImportPath);
    }
    if is_standard_import_path(import_path) {
        return Err(SourceError::StandardLibrary(import_path.to_string()));
    }

    let parts: Vec<&str> = import_path.split('/').collect();
    let fail = |reason: &str| SourceError::Deduction {
        import_path: import_path.to_string(),
        reason: reason.to_string(),
    };

    if let Some(idx) = parts
        .iter()
        .position(|p| VCS_SUFFIXES.iter().any(|s| p.ends_with(s)))
    {
        return Ok(ProjectRoot::new(parts[..=idx].join("/")));
    }

    let host = parts[0];

    if OWNER_REPO_HOSTS.contains(&host) {
        if parts.len() < 3 {
            return Err(fail("expected host/owner/repo"));
        }
        return Ok(ProjectRoot::new(parts[..3].join("/")));
    }

    if host == "gopkg.in" {
        return match parts.as_slice() {
            [_, pkg, ..] if is_gopkg_versioned(pkg) => Ok(ProjectRoot::new(parts[..2].join("/"))),
            [_, _, pkg, ..] if is_gopkg_versioned(pkg) => {
                Ok(ProjectRoot::new(parts[..3].join("/")))
            }
            _ => Err(fail("gopkg.in paths need a .vN suffix")),
        };
    }

    for prefix in SINGLE_ELEMENT_PREFIXES {
        let depth = prefix.split('/').count();
        if import_path.starts_with(prefix) && parts.len() > depth && parts[..depth].join("/") == *prefix {
            return Ok(ProjectRoot::new(parts[..=depth].join("/")));
        }
    }

    Err(fail("unknown host; add a VCS suffix (e.g. `.git`) to the repository element"))
}

fn is_gopkg_versioned(element: &str) -> bool {
    element
        .rsplit_once(".v")
        .is_some_and(|(name, major)| {
            !name.is_empty() && !major.is_empty() && major.chars().all(|c| c.is_ascii_digit())
        })
}
