//! Manifest - the declared desired dependency state (Wharf.toml).
//!
//! The manifest maps project roots to a constraint and an optional source
//! override, and carries the ignore and required package lists.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::constraint::Constraint;
use crate::core::project::ProjectRoot;
use crate::core::version::Revision;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "Wharf.toml";

/// Constraint and source override declared for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectProperties {
    pub source: Option<String>,
    pub constraint: Constraint,
}

impl ProjectProperties {
    pub fn new(constraint: Constraint) -> Self {
        ProjectProperties {
            source: None,
            constraint,
        }
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source.filter(|s| !s.is_empty());
        self
    }
}

/// The declared desired state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Constraints on direct dependencies
    pub constraints: BTreeMap<ProjectRoot, ProjectProperties>,

    /// Constraints that apply to every occurrence of a project in the graph
    pub overrides: BTreeMap<ProjectRoot, ProjectProperties>,

    /// Package paths excluded from solving; a trailing `*` is a prefix match
    pub ignored: Vec<String>,

    /// Packages that must be importable even if nothing imports them
    pub required: Vec<String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
            && self.overrides.is_empty()
            && self.ignored.is_empty()
            && self.required.is_empty()
    }

    /// Check whether a package path is ignored.
    pub fn is_ignored(&self, pkg: &str) -> bool {
        self.ignored.iter().any(|pattern| match pattern.strip_suffix('*') {
            Some(prefix) => pkg.starts_with(prefix),
            None => pkg == pattern,
        })
    }

    /// Load a manifest from a path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Parse manifest TOML.
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content)?;

        let mut manifest = Manifest {
            ignored: raw.ignored,
            required: raw.required,
            ..Default::default()
        };

        for entry in raw.constraint {
            let (root, props) = entry.into_properties()?;
            if manifest.constraints.insert(root.clone(), props).is_some() {
                bail!("multiple constraints declared for `{}`", root);
            }
        }

        for entry in raw.overrides {
            let (root, props) = entry.into_properties()?;
            if manifest.overrides.insert(root.clone(), props).is_some() {
                bail!("multiple overrides declared for `{}`", root);
            }
        }

        Ok(manifest)
    }

    /// Encode to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        let raw = RawManifest {
            required: self.required.clone(),
            ignored: self.ignored.clone(),
            constraint: self
                .constraints
                .iter()
                .map(|(root, props)| RawProject::from_properties(root, props))
                .collect(),
            overrides: self
                .overrides
                .iter()
                .map(|(root, props)| RawProject::from_properties(root, props))
                .collect(),
        };

        Ok(toml::to_string_pretty(&raw)?)
    }

    /// Save the manifest to a path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write manifest: {}", path.display()))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawManifest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ignored: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    constraint: Vec<RawProject>,

    #[serde(rename = "override", default, skip_serializing_if = "Vec::is_empty")]
    overrides: Vec<RawProject>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawProject {
    name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision: Option<String>,
}

impl RawProject {
    fn from_properties(root: &ProjectRoot, props: &ProjectProperties) -> Self {
        let mut raw = RawProject {
            name: root.to_string(),
            source: props.source.clone(),
            ..Default::default()
        };

        match &props.constraint {
            Constraint::Any => {}
            Constraint::Semver(_) | Constraint::Plain(_) => {
                raw.version = Some(props.constraint.to_string())
            }
            Constraint::Branch(name) => raw.branch = Some(name.clone()),
            Constraint::Revision(rev) => raw.revision = Some(rev.to_string()),
        }

        raw
    }

    fn into_properties(self) -> Result<(ProjectRoot, ProjectProperties)> {
        if self.name.is_empty() {
            bail!("constraint entry is missing `name`");
        }

        let set = [&self.version, &self.branch, &self.revision]
            .iter()
            .filter(|f| f.is_some())
            .count();
        if set > 1 {
            bail!(
                "`{}` may declare only one of `version`, `branch` or `revision`",
                self.name
            );
        }

        let constraint = if let Some(version) = self.version {
            Constraint::semver_implied_caret(&version).unwrap_or(Constraint::Plain(version))
        } else if let Some(branch) = self.branch {
            Constraint::Branch(branch)
        } else if let Some(revision) = self.revision {
            Constraint::Revision(Revision::new(revision))
        } else {
            Constraint::Any
        };

        Ok((
            ProjectRoot::new(self.name),
            ProjectProperties::new(constraint).with_source(self.source),
        ))
    }
}
