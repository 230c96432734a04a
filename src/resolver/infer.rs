//! Version and constraint inference.
//!
//! Turns what is known about a dependency (a checked-out version, a legacy
//! version string, a pinned revision) into constraints and lockable
//! versions.

use crate::core::constraint::Constraint;
use crate::core::project::ProjectIdentifier;
use crate::core::version::{sort_for_upgrade, Revision, UnpairedVersion, Version};
use crate::sources::source::SourceManager;

/// Shortest abbreviated revision accepted as a prefix match.
const MIN_ABBREVIATED_REVISION: usize = 7;

/// Constraint implied by a concrete version.
///
/// Semver tags become caret ranges (`v1.0.0` gives `^1.0.0`), branches and
/// plain tags constrain to themselves, and a bare revision gives nothing.
pub fn constraint_for_version(version: &Version) -> Option<Constraint> {
    match version.unpaired()? {
        UnpairedVersion::Semver { version, .. } => Some(Constraint::caret_for(version)),
        UnpairedVersion::Branch { name, .. } => Some(Constraint::Branch(name.clone())),
        UnpairedVersion::Plain(tag) => Some(Constraint::Plain(tag.clone())),
    }
}

/// Whether `hint` names the revision `full`, either exactly or as an
/// abbreviation.
pub fn revision_matches(full: &Revision, hint: &str) -> bool {
    full.as_str() == hint
        || (hint.len() >= MIN_ABBREVIATED_REVISION && full.as_str().starts_with(hint))
}

fn looks_like_revision(hint: &str) -> bool {
    hint.len() >= MIN_ABBREVIATED_REVISION
        && hint.len() <= 40
        && hint.chars().all(|c| c.is_ascii_hexdigit())
}

/// Infer a constraint from a version string, given the project's versions.
pub fn infer_constraint_from_versions(hint: &str, versions: Vec<Version>) -> Option<Constraint> {
    if hint.is_empty() {
        return Some(Constraint::Any);
    }

    let is_branch = versions.iter().any(|v| {
        matches!(v.unpaired(), Some(UnpairedVersion::Branch { name, .. }) if name == hint)
    });
    if is_branch {
        return Some(Constraint::Branch(hint.to_string()));
    }

    if let Some(c) = Constraint::semver_implied_caret(hint) {
        return Some(c);
    }

    let is_tag = versions.iter().any(|v| {
        matches!(v.unpaired(), Some(u @ UnpairedVersion::Plain(_)) if u.as_str() == hint)
    });
    if is_tag {
        return Some(Constraint::Plain(hint.to_string()));
    }

    if let Some(rev) = versions
        .iter()
        .filter_map(|v| v.revision())
        .find(|r| revision_matches(r, hint))
    {
        return Some(Constraint::Revision(rev.clone()));
    }

    looks_like_revision(hint).then(|| Constraint::Revision(Revision::new(hint)))
}

/// Pick the best version for a revision out of a project's versions.
///
/// Versions are searched newest-first. A match that also satisfies the
/// constraint wins; failing that, a branch constraint pairs the branch with
/// the revision; then the first version at the revision; then the bare
/// revision.
pub fn match_revision(
    mut versions: Vec<Version>,
    constraint: Option<&Constraint>,
    rev: &Revision,
) -> Version {
    sort_for_upgrade(&mut versions);

    let at_revision: Vec<&Version> = versions
        .iter()
        .filter(|v| v.revision().is_some_and(|r| revision_matches(r, rev.as_str())))
        .collect();

    if let Some(c) = constraint {
        if let Some(v) = at_revision.iter().find(|v| c.matches(v)) {
            return (*v).clone();
        }
    }

    if let Some(Constraint::Branch(name)) = constraint {
        let branch = versions.iter().find_map(|v| match v.unpaired() {
            Some(u @ UnpairedVersion::Branch { name: n, .. }) if n == name => Some(u.clone()),
            _ => None,
        });
        if let Some(branch) = branch {
            return branch.pair(rev.clone());
        }
    }

    match at_revision.first() {
        Some(v) => (*v).clone(),
        None => Version::Revision(rev.clone()),
    }
}

/// Look up the version a revision corresponds to upstream.
///
/// Failing to list versions is not fatal: the bare revision is returned and
/// a warning is logged.
pub fn lookup_version_for_revision(
    sm: &dyn SourceManager,
    id: &ProjectIdentifier,
    constraint: Option<&Constraint>,
    rev: &Revision,
) -> Version {
    match sm.list_versions(id) {
        Ok(versions) => match_revision(versions, constraint, rev),
        Err(e) => {
            tracing::warn!("Unable to list versions for {}: {}", id, e);
            Version::Revision(rev.clone())
        }
    }
}
