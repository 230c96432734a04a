//! Lock - the last resolved concrete state (Wharf.lock).

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::project::{ProjectIdentifier, ProjectRoot};
use crate::core::version::{Revision, UnpairedVersion, Version};

/// Lockfile name.
pub const LOCKFILE_NAME: &str = "Wharf.lock";

/// A project pinned to a concrete version, with the packages used from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedProject {
    id: ProjectIdentifier,
    version: Version,
    /// Root-relative package paths; `.` is the root package
    packages: Vec<String>,
}

impl LockedProject {
    pub fn new(id: ProjectIdentifier, version: Version, mut packages: Vec<String>) -> Self {
        packages.sort();
        packages.dedup();
        LockedProject {
            id,
            version,
            packages,
        }
    }

    pub fn ident(&self) -> &ProjectIdentifier {
        &self.id
    }

    pub fn root(&self) -> &ProjectRoot {
        &self.id.root
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }
}

/// The resolved state plus a memo of the solver inputs that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lock {
    /// Hex digest of the solver inputs
    pub memo: String,
    projects: Vec<LockedProject>,
}

impl Lock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_projects(projects: Vec<LockedProject>) -> Self {
        let mut lock = Lock::new();
        for project in projects {
            lock.upsert(project);
        }
        lock
    }

    pub fn projects(&self) -> &[LockedProject] {
        &self.projects
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Insert a project, replacing any existing entry for the same root.
    pub fn upsert(&mut self, project: LockedProject) {
        match self.projects.iter_mut().find(|p| p.root() == project.root()) {
            Some(existing) => *existing = project,
            None => self.projects.push(project),
        }
    }

    pub fn get(&self, root: &ProjectRoot) -> Option<&LockedProject> {
        self.projects.iter().find(|p| p.root() == root)
    }

    pub fn has_project_with_root(&self, root: &ProjectRoot) -> bool {
        self.get(root).is_some()
    }

    /// Sort projects by root for deterministic output.
    pub fn sort(&mut self) {
        self.projects.sort_by(|a, b| a.root().cmp(b.root()));
    }

    /// Load a lockfile from a path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read lockfile: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("failed to parse lockfile: {}", path.display()))
    }

    /// Parse lockfile TOML.
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawLock = toml::from_str(content)?;
        let mut lock = Lock {
            memo: raw.memo,
            projects: Vec::with_capacity(raw.projects.len()),
        };

        for project in raw.projects {
            let project = project.into_locked()?;
            if lock.has_project_with_root(project.root()) {
                bail!("duplicate lock entry for `{}`", project.root());
            }
            lock.projects.push(project);
        }

        Ok(lock)
    }

    /// Encode to TOML, projects sorted by root.
    pub fn to_toml_string(&self) -> Result<String> {
        let mut projects: Vec<RawLockedProject> =
            self.projects.iter().map(RawLockedProject::from_locked).collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));

        let raw = RawLock {
            memo: self.memo.clone(),
            projects,
        };

        Ok(toml::to_string_pretty(&raw)?)
    }

    /// Save the lockfile to a path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = format!(
            "# This file is automatically generated by Wharf.\n\
             # It is not intended for manual editing.\n\n\
             {}",
            self.to_toml_string()?
        );

        std::fs::write(path, content)
            .with_context(|| format!("failed to write lockfile: {}", path.display()))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawLock {
    #[serde(default)]
    memo: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    projects: Vec<RawLockedProject>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawLockedProject {
    name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision: Option<String>,

    #[serde(default)]
    packages: Vec<String>,
}

impl RawLockedProject {
    fn from_locked(lp: &LockedProject) -> Self {
        let mut raw = RawLockedProject {
            name: lp.root().to_string(),
            source: lp.ident().source.clone(),
            revision: lp.version().revision().map(|r| r.to_string()),
            packages: lp.packages().to_vec(),
            ..Default::default()
        };

        match lp.version().unpaired() {
            Some(UnpairedVersion::Branch { name, .. }) => raw.branch = Some(name.clone()),
            Some(v) => raw.version = Some(v.to_string()),
            None => {}
        }

        raw
    }

    fn into_locked(self) -> Result<LockedProject> {
        if self.name.is_empty() {
            bail!("lock entry is missing `name`");
        }

        let unpaired = match (self.branch, self.version) {
            (Some(_), Some(_)) => {
                bail!("`{}` may declare only one of `branch` or `version`", self.name)
            }
            (Some(branch), None) => Some(UnpairedVersion::branch(branch)),
            (None, Some(version)) => Some(UnpairedVersion::from_tag(version)),
            (None, None) => None,
        };

        let version = match (unpaired, self.revision) {
            (Some(v), Some(rev)) => v.pair(Revision::new(rev)),
            (Some(v), None) => Version::Unpaired(v),
            (None, Some(rev)) => Version::Revision(Revision::new(rev)),
            (None, None) => bail!("lock entry for `{}` has no version or revision", self.name),
        };

        let id = ProjectIdentifier::with_source(ProjectRoot::new(self.name), self.source);
        Ok(LockedProject::new(id, version, self.packages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn locked(root: &str, version: Version) -> LockedProject {
        LockedProject::new(ProjectIdentifier::new(root.into()), version, vec![".".into()])
    }

    #[test]
    fn test_upsert_replaces_same_root() {
        let mut lock = Lock::new();
        lock.upsert(locked("github.com/x/pkg", Version::revision_only("aaa")));
        lock.upsert(locked("github.com/x/pkg", Version::revision_only("bbb")));

        assert_eq!(lock.len(), 1);
        assert_eq!(lock.projects()[0].version().to_string(), "bbb");
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(LOCKFILE_NAME);

        let mut lock = Lock::from_projects(vec![
            locked(
                "github.com/x/pkg",
                UnpairedVersion::from_tag("v1.0.0").pair(Revision::new("ff2948a")),
            ),
            locked(
                "github.com/y/lib",
                UnpairedVersion::branch("master").pair(Revision::new("436f39d")),
            ),
            locked("github.com/z/raw", Version::revision_only("1b8edb3")),
        ]);
        lock.memo = "deadbeef".into();
        lock.save(&path).unwrap();

        let loaded = Lock::load(&path).unwrap();
        assert_eq!(loaded.memo, "deadbeef");
        assert_eq!(loaded.len(), 3);
        assert_eq!(
            loaded.get(&"github.com/x/pkg".into()).unwrap().version().to_string(),
            "v1.0.0"
        );
        assert!(loaded
            .get(&"github.com/z/raw".into())
            .unwrap()
            .version()
            .unpaired()
            .is_none());
    }

    #[test]
    fn test_duplicate_entries_rejected() {
        let err = Lock::parse(
            r#"
[[projects]]
name = "github.com/x/pkg"
revision = "a"

[[projects]]
name = "github.com/x/pkg"
revision = "b"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
