//! Declared version constraints.
//!
//! A [`Constraint`] is an acceptable-version expression, not a concrete
//! version: a semver range, an exact branch or tag, a pinned revision
//! (a hint rather than a real constraint), or "any".

use std::fmt;

use semver::VersionReq;

use crate::core::version::{parse_semver_tag, Revision, UnpairedVersion, Version};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Any,
    Semver(VersionReq),
    Branch(String),
    /// Exact non-semver tag
    Plain(String),
    /// Pinned revision; only a hint for the solver
    Revision(Revision),
}

impl Constraint {
    /// Parse a semver range, treating a bare version as caret (`1.0.0` and
    /// `v1.0.0` both mean `^1.0.0`).
    pub fn semver_implied_caret(s: &str) -> Option<Constraint> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let normalized = strip_v_prefixes(s);
        if let Ok(req) = VersionReq::parse(&normalized) {
            return Some(Constraint::Semver(req));
        }

        // Tags like `v1.2` that the range grammar rejects.
        parse_semver_tag(s).map(|v| Constraint::Semver(caret(&v)))
    }

    /// Caret constraint for a concrete semantic version.
    pub fn caret_for(version: &semver::Version) -> Constraint {
        Constraint::Semver(caret(version))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Constraint::Any)
    }

    /// Revisions pin rather than constrain.
    pub fn is_hint(&self) -> bool {
        matches!(self, Constraint::Revision(_))
    }

    /// Check whether a concrete version satisfies this constraint.
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::Semver(req) => version.semver().is_some_and(|v| req.matches(v)),
            Constraint::Branch(name) => matches!(
                version.unpaired(),
                Some(UnpairedVersion::Branch { name: n, .. }) if n == name
            ),
            Constraint::Plain(tag) => matches!(
                version.unpaired(),
                Some(UnpairedVersion::Plain(t)) if t == tag
            ),
            Constraint::Revision(rev) => version.revision() == Some(rev),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Any => f.write_str("*"),
            Constraint::Semver(req) => write!(f, "{}", req),
            Constraint::Branch(name) => f.write_str(name),
            Constraint::Plain(tag) => f.write_str(tag),
            Constraint::Revision(rev) => write!(f, "{}", rev),
        }
    }
}

impl Default for Constraint {
    fn default() -> Self {
        Constraint::Any
    }
}

fn caret(v: &semver::Version) -> VersionReq {
    VersionReq {
        comparators: vec![semver::Comparator {
            op: semver::Op::Caret,
            major: v.major,
            minor: Some(v.minor),
            patch: Some(v.patch),
            pre: v.pre.clone(),
        }],
    }
}

/// Drop `v` prefixes from each comparator (`>= v1.0, < v2` → `>= 1.0, < 2`).
fn strip_v_prefixes(s: &str) -> String {
    s.split(',')
        .map(|part| {
            let part = part.trim();
            let op_len = part
                .find(|c: char| !matches!(c, '<' | '>' | '=' | '^' | '~' | ' '))
                .unwrap_or(part.len());
            let (op, rest) = part.split_at(op_len);
            let rest = rest
                .strip_prefix('v')
                .filter(|r| r.starts_with(|c: char| c.is_ascii_digit()))
                .unwrap_or(rest);
            format!("{}{}", op, rest)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
