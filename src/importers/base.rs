//! Shared conversion from foreign dependency entries to a manifest and lock.

use std::collections::BTreeMap;

use crate::core::constraint::Constraint;
use crate::core::feedback::{DependencyType, Feedback};
use crate::core::lock::{Lock, LockedProject};
use crate::core::manifest::{Manifest, ProjectProperties};
use crate::core::project::{ProjectIdentifier, ProjectRoot};
use crate::core::version::{Revision, Version, VersionType};
use crate::importers::ImportError;
use crate::resolver::infer::{constraint_for_version, lookup_version_for_revision};
use crate::sources::source::SourceManager;
use crate::util::GlobalContext;

/// A dependency as a foreign tool describes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedPackage {
    /// Import path; may be a sub-package of the project
    pub name: String,
    /// Alternate repository location
    pub source: String,
    /// Revision or tag to lock to
    pub lock_hint: String,
    /// Free-form version string to constrain with
    pub constraint_hint: String,
}

impl ImportedPackage {
    pub fn new(name: impl Into<String>) -> Self {
        ImportedPackage {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn lock_hint(mut self, hint: impl Into<String>) -> Self {
        self.lock_hint = hint.into();
        self
    }

    pub fn constraint_hint(mut self, hint: impl Into<String>) -> Self {
        self.constraint_hint = hint.into();
        self
    }
}

/// Accumulates the manifest and lock produced by one converter.
pub struct Converter<'a> {
    ctx: &'a GlobalContext,
    sm: &'a dyn SourceManager,
    pub manifest: Manifest,
    pub lock: Lock,
}

impl<'a> Converter<'a> {
    pub fn new(ctx: &'a GlobalContext, sm: &'a dyn SourceManager) -> Self {
        Converter {
            ctx,
            sm,
            manifest: Manifest::new(),
            lock: Lock::new(),
        }
    }

    pub fn ctx(&self) -> &'a GlobalContext {
        self.ctx
    }

    pub fn source_manager(&self) -> &'a dyn SourceManager {
        self.sm
    }

    pub fn finish(self) -> (Manifest, Lock) {
        (self.manifest, self.lock)
    }

    /// Group packages by project root.
    ///
    /// The first entry seen for a root wins, but an empty field is filled in
    /// by later entries. Output is sorted by root.
    fn consolidate(
        &self,
        packages: Vec<ImportedPackage>,
    ) -> Result<Vec<(ProjectRoot, ImportedPackage)>, ImportError> {
        let mut projects: BTreeMap<ProjectRoot, ImportedPackage> = BTreeMap::new();

        for pkg in packages {
            let root = self
                .sm
                .deduce_project_root(&pkg.name)
                .map_err(|source| ImportError::DeduceRoot {
                    import_path: pkg.name.clone(),
                    source,
                })?;

            match projects.get_mut(&root) {
                None => {
                    projects.insert(root, pkg);
                }
                Some(existing) => {
                    fill(&mut existing.source, pkg.source);
                    fill(&mut existing.constraint_hint, pkg.constraint_hint);
                    fill(&mut existing.lock_hint, pkg.lock_hint);
                }
            }
        }

        Ok(projects.into_iter().collect())
    }

    /// Tag the hint names, paired with its revision, if there is one.
    fn tagged_version(&self, id: &ProjectIdentifier, hint: &str) -> Option<Version> {
        let versions = match self.sm.list_versions(id) {
            Ok(versions) => versions,
            Err(e) => {
                tracing::warn!("Unable to list versions for {}: {}", id, e);
                return None;
            }
        };

        versions.into_iter().find(|v| {
            matches!(v.version_type(), VersionType::Semver | VersionType::Plain)
                && v.unpaired().is_some_and(|u| u.as_str() == hint)
        })
    }

    /// Convert foreign entries into manifest constraints and locked projects.
    ///
    /// With `default_constraint_from_lock`, an entry without a version hint
    /// is constrained by what its locked version implies.
    pub fn import_packages(
        &mut self,
        packages: Vec<ImportedPackage>,
        default_constraint_from_lock: bool,
    ) -> Result<(), ImportError> {
        let ctx = self.ctx;
        let shell = ctx.shell();

        for (root, pkg) in self.consolidate(packages)? {
            let source = if pkg.source.is_empty() || is_default_source(&root, &pkg.source) {
                None
            } else {
                Some(pkg.source.clone())
            };
            let id = ProjectIdentifier::with_source(root.clone(), source);

            let mut constraint = match self.sm.infer_constraint(&pkg.constraint_hint, &id) {
                Ok(c) => c,
                Err(e) => {
                    shell.warn(format!(
                        "Unable to infer a constraint for {} from `{}`: {}",
                        id, pkg.constraint_hint, e
                    ));
                    Constraint::Any
                }
            };

            let mut version = None;
            if !pkg.lock_hint.is_empty() {
                let found = match self.tagged_version(&id, &pkg.lock_hint) {
                    Some(tagged) => tagged,
                    None => lookup_version_for_revision(
                        self.sm,
                        &id,
                        Some(&constraint),
                        &Revision::new(pkg.lock_hint.as_str()),
                    ),
                };

                if constraint.matches(&found) {
                    let lp = LockedProject::new(id.clone(), found.clone(), vec![]);
                    Feedback::locked(&lp, DependencyType::Imported).log(shell);
                    self.lock.upsert(lp);
                    version = Some(found);
                } else {
                    shell.warn(format!(
                        "Ignoring imported lock {} for {}: it does not satisfy {}",
                        found, id, constraint
                    ));
                }
            }

            if default_constraint_from_lock && constraint.is_any() {
                if let Some(c) = version.as_ref().and_then(constraint_for_version) {
                    constraint = c;
                }
            }

            // A pinned revision belongs in the lock, not the manifest.
            if constraint.is_hint() {
                constraint = Constraint::Any;
            }

            if !constraint.is_any() || id.source.is_some() {
                Feedback::constraint(&root, &constraint, DependencyType::Imported).log(shell);
                self.manifest.constraints.insert(
                    root,
                    ProjectProperties::new(constraint).with_source(id.source.clone()),
                );
            }
        }

        Ok(())
    }
}

fn fill(slot: &mut String, value: String) {
    if slot.is_empty() {
        *slot = value;
    }
}

/// Whether `source` is just the default location of `root`.
pub fn is_default_source(root: &ProjectRoot, source: &str) -> bool {
    let source = source.trim_end_matches('/');
    let source = source.strip_suffix(".git").unwrap_or(source);
    let bare = source
        .strip_prefix("https://")
        .or_else(|| source.strip_prefix("http://"))
        .unwrap_or(source);
    bare == root.as_str()
}
