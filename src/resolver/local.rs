//! Local-first solver.
//!
//! Walks the root project's required projects breadth-first. Each project
//! keeps its locked version when that still satisfies every constraint on
//! it; otherwise the most preferred upstream version that does is chosen.
//! Constraints declared by dependencies checked out in the workspace are
//! followed transitively, and so are the imports of the packages used from
//! them when the solver has a package lister. There is no backtracking: a
//! constraint that arrives after its project was settled, and rejects the
//! settled version, fails the solve.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::Path;

use crate::core::constraint::Constraint;
use crate::core::lock::{Lock, LockedProject};
use crate::core::manifest::ProjectProperties;
use crate::core::package_tree::ReachMap;
use crate::core::project::{is_standard_import_path, ProjectIdentifier, ProjectRoot};
use crate::core::version::{sort_for_upgrade, Version};
use crate::core::workspace::WorkspaceInspector;
use crate::resolver::errors::SolveError;
use crate::resolver::infer::lookup_version_for_revision;
use crate::resolver::{SolveParameters, Solution, Solver};
use crate::sources::source::{PackageLister, SourceManager};

/// What the graph asks of one project.
#[derive(Debug, Default)]
struct Requirement {
    source: Option<String>,
    /// (required by, constraint)
    constraints: Vec<(String, Constraint)>,
    packages: BTreeSet<String>,
}

impl Requirement {
    fn add(&mut self, by: &str, props: &ProjectProperties) {
        if self.source.is_none() {
            self.source = props.source.clone();
        }
        if !props.constraint.is_any() {
            self.constraints.push((by.to_string(), props.constraint.clone()));
        }
    }
}

/// Solver that prefers what is already locked.
pub struct LocalFirstSolver<'a> {
    sm: &'a dyn SourceManager,
    workspace: &'a dyn WorkspaceInspector,
    lister: Option<&'a dyn PackageLister>,
}

impl<'a> LocalFirstSolver<'a> {
    pub fn new(sm: &'a dyn SourceManager, workspace: &'a dyn WorkspaceInspector) -> Self {
        LocalFirstSolver {
            sm,
            workspace,
            lister: None,
        }
    }

    /// Also follow the imports of packages used from checked-out projects.
    pub fn with_lister(mut self, lister: &'a dyn PackageLister) -> Self {
        self.lister = Some(lister);
        self
    }

    fn select(
        &self,
        id: &ProjectIdentifier,
        constraints: &[(String, Constraint)],
        lock: &Lock,
    ) -> Result<Version, SolveError> {
        let satisfies = |v: &Version| constraints.iter().all(|(_, c)| c.matches(v));

        if let Some(locked) = lock.get(&id.root) {
            if satisfies(locked.version()) {
                return Ok(locked.version().clone());
            }
        }

        let pinned = constraints.iter().find_map(|(_, c)| match c {
            Constraint::Revision(rev) => Some(rev),
            _ => None,
        });
        if let Some(rev) = pinned {
            let version = lookup_version_for_revision(self.sm, id, None, rev);
            if satisfies(&version) {
                return Ok(version);
            }
            return Err(no_match(id, constraints, vec![version.to_string()]));
        }

        let mut versions = self.sm.list_versions(id).map_err(|source| SolveError::Source {
            project: id.root.to_string(),
            source,
        })?;
        sort_for_upgrade(&mut versions);

        match versions.iter().find(|v| satisfies(v)) {
            Some(v) => Ok(v.clone()),
            None => Err(no_match(
                id,
                constraints,
                versions.iter().map(|v| v.to_string()).collect(),
            )),
        }
    }
}

fn no_match(
    id: &ProjectIdentifier,
    constraints: &[(String, Constraint)],
    available: Vec<String>,
) -> SolveError {
    SolveError::NoMatchingVersion {
        project: id.root.to_string(),
        constraints: constraints
            .iter()
            .map(|(by, c)| (by.clone(), c.to_string()))
            .collect(),
        available,
    }
}

impl Solver for LocalFirstSolver<'_> {
    fn solve(&self, params: &SolveParameters<'_>) -> Result<Solution, SolveError> {
        let root = params.import_root();
        let manifest = params.manifest;
        let mut state = SolveState::default();

        for ip in params.external_imports() {
            if root.contains_package(&ip) {
                continue;
            }
            let pr = self
                .sm
                .deduce_project_root(&ip)
                .map_err(|source| SolveError::DeduceRoot {
                    import_path: ip.clone(),
                    source,
                })?;
            state.require(&pr).packages.insert(pr.relative_package(&ip));
        }

        // Locked projects reached only through other projects stay solved.
        for lp in params.lock.projects() {
            if !state.requirements.contains_key(lp.root()) {
                state.require(lp.root()).source = lp.ident().source.clone();
            }
        }

        // Constraints on projects nothing imports have no effect.
        for (pr, props) in &manifest.constraints {
            if let Some(req) = state.requirements.get_mut(pr) {
                req.add(root.as_str(), props);
            }
        }

        while let Some(pr) = state.queue.pop_front() {
            let Some(req) = state.requirements.get(&pr) else {
                continue;
            };

            if !state.chosen.contains_key(&pr) {
                let (source, constraints) = match manifest.overrides.get(&pr) {
                    Some(o) => (
                        o.source.clone().or_else(|| req.source.clone()),
                        if o.constraint.is_any() {
                            vec![]
                        } else {
                            vec![(root.to_string(), o.constraint.clone())]
                        },
                    ),
                    None => (req.source.clone(), req.constraints.clone()),
                };

                let id = ProjectIdentifier::with_source(pr.clone(), source);
                let version = self.select(&id, &constraints, params.lock)?;
                tracing::debug!("selected {} {}", id, version);
                state.chosen.insert(pr.clone(), (id, version));

                if let Some(dir) = self.workspace.project_dir(&pr) {
                    self.follow_manifest(params, &pr, &dir, &mut state)?;
                }
            }

            if let Some(lister) = self.lister {
                if let Some(dir) = self.workspace.project_dir(&pr) {
                    self.follow_imports(lister, params, &pr, &dir, &mut state)?;
                }
            }
        }

        let projects = state
            .chosen
            .iter()
            .map(|(pr, (id, version))| {
                LockedProject::new(id.clone(), version.clone(), state.used_packages(pr, params.lock))
            })
            .collect();
        Ok(Solution::new(projects))
    }
}

impl LocalFirstSolver<'_> {
    /// Require what a checked-out dependency's own manifest declares.
    fn follow_manifest(
        &self,
        params: &SolveParameters<'_>,
        pr: &ProjectRoot,
        dir: &Path,
        state: &mut SolveState,
    ) -> Result<(), SolveError> {
        let root = params.import_root();
        let manifest = params.manifest;

        let dep_manifest = match params.analyzer.derive_manifest_and_lock(dir, pr) {
            Ok(Some((m, _))) => m,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::warn!("Unable to analyze {}: {:#}", pr, e);
                return Ok(());
            }
        };

        for (dep, props) in dep_manifest.constraints {
            if dep == root || &dep == pr {
                continue;
            }

            if let Some((id, version)) = state.chosen.get(&dep) {
                if !manifest.overrides.contains_key(&dep) && !props.constraint.matches(version) {
                    let mut constraints = state
                        .requirements
                        .get(&dep)
                        .map(|r| r.constraints.clone())
                        .unwrap_or_default();
                    constraints.push((pr.to_string(), props.constraint.clone()));
                    return Err(no_match(id, &constraints, vec![version.to_string()]));
                }
                continue;
            }

            state.require(&dep).add(pr.as_str(), &props);
        }

        Ok(())
    }

    /// Require the projects imported by the packages used from a
    /// checked-out dependency.
    fn follow_imports(
        &self,
        lister: &dyn PackageLister,
        params: &SolveParameters<'_>,
        pr: &ProjectRoot,
        dir: &Path,
        state: &mut SolveState,
    ) -> Result<(), SolveError> {
        if !state.trees.contains_key(pr) {
            let reach = match lister.list_packages(dir, pr.as_str()) {
                Ok(tree) => tree.to_reach_map(true, false, false, &[]).0,
                Err(e) => {
                    tracing::warn!("Unable to list packages of {}: {}", pr, e);
                    ReachMap::default()
                }
            };
            state.trees.insert(pr.clone(), reach);
        }

        let mut imports = BTreeSet::new();
        for rel in state.used_packages(pr, params.lock) {
            let ip = pr.absolute_package(&rel);
            if !state.followed.insert(ip.clone()) {
                continue;
            }
            if let Some(entry) = state.trees.get(pr).and_then(|reach| reach.get(&ip)) {
                imports.extend(
                    entry
                        .external
                        .iter()
                        .filter(|i| !is_standard_import_path(i))
                        .cloned(),
                );
            }
        }

        let root = params.import_root();
        for ip in imports {
            if root.contains_package(&ip) || pr.contains_package(&ip) {
                continue;
            }
            let dep = self
                .sm
                .deduce_project_root(&ip)
                .map_err(|source| SolveError::DeduceRoot {
                    import_path: ip.clone(),
                    source,
                })?;

            // A settled project using a new package needs that package followed.
            let settled = state.chosen.contains_key(&dep);
            if state.require(&dep).packages.insert(dep.relative_package(&ip)) && settled {
                state.queue.push_back(dep);
            }
        }

        Ok(())
    }
}

/// Working state of one solve.
#[derive(Default)]
struct SolveState {
    requirements: BTreeMap<ProjectRoot, Requirement>,
    queue: VecDeque<ProjectRoot>,
    chosen: BTreeMap<ProjectRoot, (ProjectIdentifier, Version)>,
    /// Packages whose imports were already required
    followed: BTreeSet<String>,
    trees: HashMap<ProjectRoot, ReachMap>,
}

impl SolveState {
    /// The requirement on `pr`, queued the first time it is seen.
    fn require(&mut self, pr: &ProjectRoot) -> &mut Requirement {
        let queue = &mut self.queue;
        self.requirements.entry(pr.clone()).or_insert_with(|| {
            queue.push_back(pr.clone());
            Requirement::default()
        })
    }

    /// Packages used from `pr`, falling back to what the lock recorded.
    fn used_packages(&self, pr: &ProjectRoot, lock: &Lock) -> Vec<String> {
        let packages: Vec<String> = self
            .requirements
            .get(pr)
            .map(|r| r.packages.iter().cloned().collect())
            .unwrap_or_default();
        if packages.is_empty() {
            if let Some(locked) = lock.get(pr) {
                return locked.packages().to_vec();
            }
        }
        packages
    }
}
