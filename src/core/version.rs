//! Concrete versions - WHAT a project is resolved to.
//!
//! A [`Version`] is either a bare source-control revision, a human-readable
//! version (semver tag, plain tag, or branch) on its own, or such a version
//! paired with the revision it points at.

use std::cmp::Ordering;
use std::fmt;

/// A source-control revision identifier (e.g. a git commit hash).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(rev: impl Into<String>) -> Self {
        Revision(rev.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this looks like a full 40-character hex commit hash.
    pub fn is_full_hash(&self) -> bool {
        self.0.len() == 40 && self.0.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Short form for display: 7 characters when this is a full hash.
    pub fn short(&self) -> &str {
        if self.is_full_hash() {
            &self.0[..7]
        } else {
            &self.0
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of a version, independent of pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionType {
    Revision,
    Branch,
    Semver,
    Plain,
}

/// A human-readable version without a revision attached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnpairedVersion {
    /// A branch; `is_default` marks the repository's default branch
    Branch { name: String, is_default: bool },
    /// A tag that parses as a semantic version; the original tag is kept
    Semver { tag: String, version: semver::Version },
    /// Any other tag
    Plain(String),
}

impl UnpairedVersion {
    /// Classify a tag name: semver when it parses as one, plain otherwise.
    pub fn from_tag(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        match parse_semver_tag(&tag) {
            Some(version) => UnpairedVersion::Semver { tag, version },
            None => UnpairedVersion::Plain(tag),
        }
    }

    pub fn branch(name: impl Into<String>) -> Self {
        UnpairedVersion::Branch {
            name: name.into(),
            is_default: false,
        }
    }

    pub fn default_branch(name: impl Into<String>) -> Self {
        UnpairedVersion::Branch {
            name: name.into(),
            is_default: true,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            UnpairedVersion::Branch { name, .. } => name,
            UnpairedVersion::Semver { tag, .. } => tag,
            UnpairedVersion::Plain(tag) => tag,
        }
    }

    pub fn version_type(&self) -> VersionType {
        match self {
            UnpairedVersion::Branch { .. } => VersionType::Branch,
            UnpairedVersion::Semver { .. } => VersionType::Semver,
            UnpairedVersion::Plain(_) => VersionType::Plain,
        }
    }

    pub fn pair(self, revision: Revision) -> Version {
        Version::Paired {
            version: self,
            revision,
        }
    }
}

impl fmt::Display for UnpairedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete resolved version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    Revision(Revision),
    Unpaired(UnpairedVersion),
    Paired {
        version: UnpairedVersion,
        revision: Revision,
    },
}

impl Version {
    pub fn revision_only(rev: impl Into<String>) -> Self {
        Version::Revision(Revision::new(rev))
    }

    pub fn version_type(&self) -> VersionType {
        match self {
            Version::Revision(_) => VersionType::Revision,
            Version::Unpaired(v) | Version::Paired { version: v, .. } => v.version_type(),
        }
    }

    /// The underlying revision, if known.
    pub fn revision(&self) -> Option<&Revision> {
        match self {
            Version::Revision(r) | Version::Paired { revision: r, .. } => Some(r),
            Version::Unpaired(_) => None,
        }
    }

    /// The human-readable half, if any.
    pub fn unpaired(&self) -> Option<&UnpairedVersion> {
        match self {
            Version::Unpaired(v) | Version::Paired { version: v, .. } => Some(v),
            Version::Revision(_) => None,
        }
    }

    /// Drop the revision from a paired version.
    pub fn unpair(&self) -> Version {
        match self {
            Version::Paired { version, .. } => Version::Unpaired(version.clone()),
            other => other.clone(),
        }
    }

    pub fn is_paired(&self) -> bool {
        matches!(self, Version::Paired { .. })
    }

    /// The parsed semantic version, for semver tags.
    pub fn semver(&self) -> Option<&semver::Version> {
        match self.unpaired() {
            Some(UnpairedVersion::Semver { version, .. }) => Some(version),
            _ => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Revision(r) => write!(f, "{}", r),
            Version::Unpaired(v) | Version::Paired { version: v, .. } => write!(f, "{}", v),
        }
    }
}

impl From<UnpairedVersion> for Version {
    fn from(v: UnpairedVersion) -> Self {
        Version::Unpaired(v)
    }
}

impl From<Revision> for Version {
    fn from(r: Revision) -> Self {
        Version::Revision(r)
    }
}

/// Parse a tag as a semantic version.
///
/// A leading `v` is accepted, and incomplete versions (`1`, `1.2`) are
/// padded with zeros.
pub fn parse_semver_tag(tag: &str) -> Option<semver::Version> {
    let s = tag.strip_prefix('v').unwrap_or(tag);

    if let Ok(v) = semver::Version::parse(s) {
        return Some(v);
    }

    let parts: Vec<&str> = s.split('.').collect();
    let all_numeric = parts
        .iter()
        .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if !all_numeric {
        return None;
    }

    match parts.as_slice() {
        [major] => Some(semver::Version::new(major.parse().ok()?, 0, 0)),
        [major, minor] => Some(semver::Version::new(
            major.parse().ok()?,
            minor.parse().ok()?,
            0,
        )),
        _ => None,
    }
}

fn upgrade_class(v: &Version) -> u8 {
    match v.unpaired() {
        Some(UnpairedVersion::Semver { .. }) => 0,
        Some(UnpairedVersion::Branch {
            is_default: true, ..
        }) => 1,
        Some(UnpairedVersion::Branch { .. }) => 2,
        Some(UnpairedVersion::Plain(_)) => 3,
        None => 4,
    }
}

/// Order two versions by upgrade preference (most preferred first).
///
/// Semver tags come first, newest to oldest; then the default branch, other
/// branches, and plain tags, each lexicographically; bare revisions last.
pub fn upgrade_cmp(a: &Version, b: &Version) -> Ordering {
    let (ca, cb) = (upgrade_class(a), upgrade_class(b));
    if ca != cb {
        return ca.cmp(&cb);
    }

    match (a.semver(), b.semver()) {
        (Some(va), Some(vb)) => vb.cmp(va).then_with(|| a.to_string().cmp(&b.to_string())),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Sort versions newest-first by upgrade preference.
pub fn sort_for_upgrade(versions: &mut [Version]) {
    versions.sort_by(upgrade_cmp);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paired(tag: &str, rev: &str) -> Version {
        UnpairedVersion::from_tag(tag).pair(Revision::new(rev))
    }

    #[test]
    fn test_parse_semver_tag() {
        assert_eq!(parse_semver_tag("v1.2.3"), Some(semver::Version::new(1, 2, 3)));
        assert_eq!(parse_semver_tag("1.2"), Some(semver::Version::new(1, 2, 0)));
        assert_eq!(parse_semver_tag("v2"), Some(semver::Version::new(2, 0, 0)));
        assert_eq!(parse_semver_tag("release-2017"), None);
        assert_eq!(parse_semver_tag("master"), None);
    }

    #[test]
    fn test_from_tag_classifies() {
        assert_eq!(UnpairedVersion::from_tag("v1.0.0").version_type(), VersionType::Semver);
        assert_eq!(UnpairedVersion::from_tag("stable").version_type(), VersionType::Plain);
    }

    #[test]
    fn test_paired_display_is_tag() {
        let v = paired("v1.0.0", "ff2948a2ac8f538c4ecd55962e919d1e13e74baf");
        assert_eq!(v.to_string(), "v1.0.0");
        assert_eq!(
            v.revision().map(|r| r.short()),
            Some("ff2948a")
        );
        assert_eq!(v.unpair(), Version::Unpaired(UnpairedVersion::from_tag("v1.0.0")));
    }

    #[test]
    fn test_short_revision_only_for_full_hashes() {
        assert_eq!(Revision::new("abc123").short(), "abc123");
    }

    #[test]
    fn test_sort_for_upgrade() {
        let mut versions = vec![
            paired("stable", "1"),
            Version::Paired {
                version: UnpairedVersion::branch("develop"),
                revision: Revision::new("2"),
            },
            paired("v1.0.0", "3"),
            Version::Paired {
                version: UnpairedVersion::default_branch("master"),
                revision: Revision::new("4"),
            },
            paired("v1.2.0", "5"),
            Version::revision_only("6"),
        ];

        sort_for_upgrade(&mut versions);
        let names: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
        assert_eq!(names, vec!["v1.2.0", "v1.0.0", "master", "develop", "stable", "6"]);
    }
}
