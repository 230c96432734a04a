//! The discovery walk.
//!
//! Direct imports are classified first, then each is followed depth-first
//! through the packages of checked-out projects. Packages are colored while
//! on the walk stack so an import cycle is reported rather than looped on.
//! Every newly seen project root gets a background source sync; all syncs
//! finish before discovery returns.

use std::collections::{BTreeMap, HashMap, HashSet};

use rayon::Scope;

use crate::core::manifest::ProjectProperties;
use crate::core::package_tree::{PackageError, PackageTree, ReachMap};
use crate::core::project::{is_standard_import_path, ProjectIdentifier, ProjectRoot};
use crate::core::version::Version;
use crate::core::workspace::{OnDiskVersion, WorkspaceInspector};
use crate::discovery::{DiscoveryError, ProjectData};
use crate::resolver::infer::constraint_for_version;
use crate::sources::source::{PackageLister, SourceManager};
use crate::util::shell::{Shell, Status};
use crate::util::GlobalContext;

/// Discovers the dependency graph of a root project.
pub struct Discovery<'a> {
    ctx: &'a GlobalContext,
    sm: &'a dyn SourceManager,
    lister: &'a dyn PackageLister,
    workspace: &'a dyn WorkspaceInspector,
}

impl<'a> Discovery<'a> {
    pub fn new(
        ctx: &'a GlobalContext,
        sm: &'a dyn SourceManager,
        lister: &'a dyn PackageLister,
        workspace: &'a dyn WorkspaceInspector,
    ) -> Self {
        Discovery {
            ctx,
            sm,
            lister,
            workspace,
        }
    }

    /// Discover everything reachable from `root_tree`.
    ///
    /// Order of the root's imports does not affect the result. Failing to
    /// sync a source only logs a warning; failing to deduce a root or
    /// finding an import cycle is fatal.
    pub fn discover(&self, root_tree: &PackageTree) -> Result<ProjectData, DiscoveryError> {
        let (reach, _) = root_tree.to_reach_map(true, true, false, &[]);
        if reach.is_empty() {
            return Ok(ProjectData::default());
        }

        let direct = reach.flatten_external(true);
        let root = ProjectRoot::new(root_tree.import_root.as_str());
        let shell = self.ctx.shell();

        shell.status(
            Status::Searching,
            format!("workspace for {} direct imports", direct.len()),
        );
        let spinner = shell.spinner("Searching workspace");

        let result: Result<ProjectData, DiscoveryError> = rayon::scope(|scope| {
            let mut walk = Walk {
                scope,
                root,
                sm: self.sm,
                lister: self.lister,
                workspace: self.workspace,
                shell,
                data: ProjectData::default(),
                colors: HashMap::new(),
                trees: HashMap::new(),
                synced: HashSet::new(),
            };
            walk.run(&direct)?;
            Ok(walk.data)
        });

        spinner.finish_and_clear();

        let mut data = result?;
        for imports in data.dependencies.values_mut() {
            imports.sort();
            imports.dedup();
        }

        tracing::debug!(
            "discovered {} projects ({} on disk, {} not on disk)",
            data.dependencies.len(),
            data.ondisk.len(),
            data.notondisk.len()
        );
        Ok(data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// On the walk stack
    Grey,
    /// Fully visited
    Black,
}

/// A checked-out project's version and parsed packages.
struct Checkout {
    version: Version,
    reach: ReachMap,
    errors: BTreeMap<String, PackageError>,
}

struct Walk<'r, 'scope> {
    scope: &'r Scope<'scope>,
    root: ProjectRoot,
    sm: &'scope dyn SourceManager,
    lister: &'scope dyn PackageLister,
    workspace: &'scope dyn WorkspaceInspector,
    shell: &'scope Shell,
    data: ProjectData,
    colors: HashMap<String, Color>,
    trees: HashMap<ProjectRoot, Checkout>,
    synced: HashSet<ProjectRoot>,
}

impl<'scope> Walk<'_, 'scope> {
    fn run(&mut self, direct: &[String]) -> Result<(), DiscoveryError> {
        for ip in direct {
            self.classify_direct(ip)?;
        }
        for ip in direct {
            self.visit(ip)?;
        }
        Ok(())
    }

    fn deduce(&self, import_path: &str) -> Result<ProjectRoot, DiscoveryError> {
        self.sm
            .deduce_project_root(import_path)
            .map_err(|source| DiscoveryError::DeduceRoot {
                import_path: import_path.to_string(),
                source,
            })
    }

    /// Dispatch a background sync the first time a root is seen.
    fn sync(&mut self, root: &ProjectRoot) {
        if !self.synced.insert(root.clone()) {
            return;
        }

        let sm = self.sm;
        let shell = self.shell;
        let id = ProjectIdentifier::new(root.clone());
        self.scope.spawn(move |_| {
            if let Err(e) = sm.sync_source_for(&id) {
                shell.warn(format!("Unable to cache {}: {}", id, e));
            }
        });
    }

    fn mark_not_on_disk(&mut self, root: &ProjectRoot) {
        self.data.ondisk.remove(root);
        self.data.constraints.remove(root);
        self.data.notondisk.insert(root.clone());
    }

    /// Record an import path used from `root`.
    fn record(&mut self, root: &ProjectRoot, pkg: &str) {
        self.data
            .dependencies
            .entry(root.clone())
            .or_default()
            .push(pkg.to_string());
    }

    fn classify_direct(&mut self, ip: &str) -> Result<(), DiscoveryError> {
        let root = self.deduce(ip)?;
        self.data.direct.insert(root.clone());

        if let Some(imports) = self.data.dependencies.get_mut(&root) {
            imports.push(ip.to_string());
            return Ok(());
        }

        self.sync(&root);
        self.record(&root, ip);

        match self.workspace.version_in_workspace(&root) {
            OnDiskVersion::Resolved(version) => {
                if let Some(c) = constraint_for_version(&version) {
                    self.data
                        .constraints
                        .insert(root.clone(), ProjectProperties::new(c));
                }
                self.shell
                    .verbose(Status::Info, format!("found {} at {} in workspace", root, version));
                self.data.ondisk.insert(root, version);
            }
            OnDiskVersion::Absent => {
                self.shell
                    .verbose(Status::Info, format!("{} not found in workspace", root));
                self.data.notondisk.insert(root);
            }
            OnDiskVersion::Unknown(reason) => {
                self.shell.verbose(
                    Status::Info,
                    format!("could not determine version of {}: {}", root, reason),
                );
                self.data.notondisk.insert(root);
            }
        }

        Ok(())
    }

    /// Parse and cache the package tree of a checked-out root.
    ///
    /// Returns false, and moves the root to not-on-disk, when there is no
    /// usable checkout. A transitive root only becomes on-disk once one of
    /// its packages is used.
    fn load_tree(&mut self, root: &ProjectRoot) -> bool {
        let Some(dir) = self.workspace.project_dir(root) else {
            self.mark_not_on_disk(root);
            return false;
        };

        let version = match self.data.ondisk.get(root) {
            Some(version) => version.clone(),
            None => match self.workspace.version_in_workspace(root) {
                OnDiskVersion::Resolved(version) => version,
                _ => {
                    self.mark_not_on_disk(root);
                    return false;
                }
            },
        };

        match self.lister.list_packages(&dir, root.as_str()) {
            Ok(tree) => {
                let (reach, errors) = tree.to_reach_map(true, false, false, &[]);
                self.trees.insert(
                    root.clone(),
                    Checkout {
                        version,
                        reach,
                        errors,
                    },
                );
                true
            }
            Err(e) => {
                self.shell
                    .warn(format!("Unable to list packages of {}: {}", root, e));
                self.mark_not_on_disk(root);
                false
            }
        }
    }

    fn visit(&mut self, pkg: &str) -> Result<(), DiscoveryError> {
        match self.colors.get(pkg) {
            Some(Color::Black) => return Ok(()),
            Some(Color::Grey) => {
                return Err(DiscoveryError::ImportCycle {
                    package: pkg.to_string(),
                })
            }
            None => {}
        }

        if self.root.contains_package(pkg) {
            self.colors.insert(pkg.to_string(), Color::Black);
            return Ok(());
        }

        self.colors.insert(pkg.to_string(), Color::Grey);
        let root = self.deduce(pkg)?;
        self.sync(&root);

        if self.data.notondisk.contains(&root)
            || (!self.trees.contains_key(&root) && !self.load_tree(&root))
        {
            self.record(&root, pkg);
            self.colors.insert(pkg.to_string(), Color::Black);
            return Ok(());
        }

        let checkout = &self.trees[&root];
        // A package missing from its project, or one with errors, ends
        // the walk here without reclassifying the project.
        let externals = match checkout.reach.get(pkg) {
            Some(entry) if !checkout.errors.contains_key(pkg) => entry.external.clone(),
            _ => {
                tracing::debug!("{} not usable in {}", pkg, root);
                self.colors.insert(pkg.to_string(), Color::Black);
                return Ok(());
            }
        };

        let version = checkout.version.clone();
        self.data.ondisk.entry(root.clone()).or_insert(version);
        self.record(&root, pkg);

        for ext in externals.iter().filter(|ip| !is_standard_import_path(ip)) {
            self.visit(ext)?;
        }

        self.colors.insert(pkg.to_string(), Color::Black);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::core::package_tree::PackageOrErr;
    use crate::core::version::{Revision, UnpairedVersion};
    use crate::test_support::{package, tree, MockPackageLister, MockSourceManager, MockWorkspace};

    const REV: &str = "ff2948a2ac8f538c4ecd55962e919d1e13e74baf";

    fn v1() -> Version {
        UnpairedVersion::from_tag("v1.0.0").pair(Revision::new(REV))
    }

    fn root_tree(imports: &[&str]) -> PackageTree {
        tree("github.com/me/app", vec![package("github.com/me/app", imports)])
    }

    fn ctx() -> GlobalContext {
        GlobalContext::with_cwd(std::env::temp_dir())
    }

    #[test]
    fn test_empty_tree_yields_empty_data() {
        let (ctx, sm, lister, ws) = (ctx(), MockSourceManager::new(), MockPackageLister::new(), MockWorkspace::new());
        let data = Discovery::new(&ctx, &sm, &lister, &ws)
            .discover(&PackageTree::new("github.com/me/app"))
            .unwrap();
        assert_eq!(data, ProjectData::default());
        assert!(sm.synced().is_empty());
    }

    #[test]
    fn test_direct_and_transitive_classification() {
        let ctx = ctx();
        let sm = MockSourceManager::new();
        let ws = MockWorkspace::new()
            .with_checkout("github.com/x/a", v1())
            .with_checkout(
                "github.com/y/b",
                UnpairedVersion::branch("master").pair(Revision::new(REV)),
            );
        let lister = MockPackageLister::new()
            .with_tree(
                MockWorkspace::checkout_dir("github.com/x/a"),
                tree(
                    "github.com/x/a",
                    vec![package("github.com/x/a", &["github.com/y/b/sub", "github.com/z/gone"])],
                ),
            )
            .with_tree(
                MockWorkspace::checkout_dir("github.com/y/b"),
                tree("github.com/y/b", vec![package("github.com/y/b/sub", &["os"])]),
            );

        let data = Discovery::new(&ctx, &sm, &lister, &ws)
            .discover(&root_tree(&["fmt", "github.com/x/a", "github.com/q/missing/pkg"]))
            .unwrap();

        assert_eq!(
            data.constraints[&ProjectRoot::from("github.com/x/a")].constraint.to_string(),
            "^1.0.0"
        );
        // Transitive dependencies get no constraint.
        assert!(!data.constraints.contains_key(&ProjectRoot::from("github.com/y/b")));
        assert!(data.ondisk.contains_key(&ProjectRoot::from("github.com/y/b")));

        assert!(data.notondisk.contains(&ProjectRoot::from("github.com/q/missing")));
        assert!(data.notondisk.contains(&ProjectRoot::from("github.com/z/gone")));
        assert!(data.ondisk.keys().all(|r| !data.notondisk.contains(r)));

        assert_eq!(data.dependencies[&ProjectRoot::from("github.com/y/b")], vec!["github.com/y/b/sub"]);
        assert_eq!(data.dependencies[&ProjectRoot::from("github.com/z/gone")], vec!["github.com/z/gone"]);
        assert_eq!(
            data.direct.iter().map(ProjectRoot::as_str).collect::<Vec<_>>(),
            vec!["github.com/q/missing", "github.com/x/a"]
        );
        assert_eq!(
            sm.synced(),
            vec![
                ProjectRoot::from("github.com/q/missing"),
                ProjectRoot::from("github.com/x/a"),
                ProjectRoot::from("github.com/y/b"),
                ProjectRoot::from("github.com/z/gone"),
            ]
        );
    }

    #[test]
    fn test_import_order_does_not_matter() {
        let ctx = ctx();
        let sm = MockSourceManager::new();
        let ws = MockWorkspace::new().with_checkout("github.com/x/a", v1());
        let lister = MockPackageLister::new().with_tree(
            MockWorkspace::checkout_dir("github.com/x/a"),
            tree(
                "github.com/x/a",
                vec![
                    package("github.com/x/a", &[]),
                    package("github.com/x/a/sub", &[]),
                ],
            ),
        );
        let discovery = Discovery::new(&ctx, &sm, &lister, &ws);

        let forward = discovery
            .discover(&root_tree(&["github.com/x/a", "github.com/x/a/sub", "github.com/q/b"]))
            .unwrap();
        let backward = discovery
            .discover(&root_tree(&["github.com/q/b", "github.com/x/a/sub", "github.com/x/a"]))
            .unwrap();

        assert_eq!(forward, backward);
        assert_eq!(
            forward.dependencies[&ProjectRoot::from("github.com/x/a")],
            vec!["github.com/x/a", "github.com/x/a/sub"]
        );
    }

    #[test]
    fn test_import_cycle_is_fatal() {
        let ctx = ctx();
        let sm = MockSourceManager::new();
        let ws = MockWorkspace::new()
            .with_checkout("github.com/x/a", v1())
            .with_checkout("github.com/y/b", v1());
        let lister = MockPackageLister::new()
            .with_tree(
                MockWorkspace::checkout_dir("github.com/x/a"),
                tree("github.com/x/a", vec![package("github.com/x/a", &["github.com/y/b"])]),
            )
            .with_tree(
                MockWorkspace::checkout_dir("github.com/y/b"),
                tree("github.com/y/b", vec![package("github.com/y/b", &["github.com/x/a"])]),
            );

        let err = Discovery::new(&ctx, &sm, &lister, &ws)
            .discover(&root_tree(&["github.com/x/a"]))
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::ImportCycle { .. }));
    }

    #[test]
    fn test_missing_package_keeps_root_on_disk() {
        let ctx = ctx();
        let sm = MockSourceManager::new();
        let ws = MockWorkspace::new().with_checkout("github.com/x/a", v1());
        let lister = MockPackageLister::new().with_tree(
            MockWorkspace::checkout_dir("github.com/x/a"),
            tree("github.com/x/a", vec![package("github.com/x/a", &[])]),
        );

        let data = Discovery::new(&ctx, &sm, &lister, &ws)
            .discover(&root_tree(&["github.com/x/a/removed"]))
            .unwrap();

        assert!(data.ondisk.contains_key(&ProjectRoot::from("github.com/x/a")));
        assert!(data.notondisk.is_empty());
    }

    #[test]
    fn test_unlistable_checkout_moves_to_not_on_disk() {
        let ctx = ctx();
        let sm = MockSourceManager::new();
        let ws = MockWorkspace::new().with_checkout("github.com/x/a", v1());
        let lister = MockPackageLister::new();

        let data = Discovery::new(&ctx, &sm, &lister, &ws)
            .discover(&root_tree(&["github.com/x/a"]))
            .unwrap();

        let a = ProjectRoot::from("github.com/x/a");
        assert!(data.notondisk.contains(&a));
        assert!(!data.ondisk.contains_key(&a));
        assert!(!data.constraints.contains_key(&a));
    }

    #[test]
    fn test_waits_for_every_sync() {
        let ctx = ctx();
        let sm = MockSourceManager::new()
            .with_sync_delay(Duration::from_millis(50))
            .with_failing_sync("github.com/q/flaky");
        let (lister, ws) = (MockPackageLister::new(), MockWorkspace::new());

        let data = Discovery::new(&ctx, &sm, &lister, &ws)
            .discover(&root_tree(&["github.com/q/a", "github.com/q/b", "github.com/q/flaky"]))
            .unwrap();

        assert_eq!(data.notondisk.len(), 3);
        assert_eq!(
            sm.synced(),
            vec![ProjectRoot::from("github.com/q/a"), ProjectRoot::from("github.com/q/b")]
        );
    }

    #[test]
    fn test_undeducible_import_is_fatal() {
        let ctx = ctx();
        let (sm, lister, ws) = (MockSourceManager::new(), MockPackageLister::new(), MockWorkspace::new());

        let err = Discovery::new(&ctx, &sm, &lister, &ws)
            .discover(&root_tree(&["example.com/unknown"]))
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::DeduceRoot { .. }));
    }

    #[test]
    fn test_unused_transitive_checkout_is_not_locked() {
        let ctx = ctx();
        let sm = MockSourceManager::new();
        let ws = MockWorkspace::new()
            .with_checkout("github.com/x/a", v1())
            .with_checkout("github.com/y/b", v1());
        let lister = MockPackageLister::new()
            .with_tree(
                MockWorkspace::checkout_dir("github.com/x/a"),
                tree(
                    "github.com/x/a",
                    vec![package("github.com/x/a", &["github.com/y/b/gone", "github.com/z/away"])],
                ),
            )
            .with_tree(
                MockWorkspace::checkout_dir("github.com/y/b"),
                tree("github.com/y/b", vec![package("github.com/y/b", &[])]),
            );

        let data = Discovery::new(&ctx, &sm, &lister, &ws)
            .discover(&root_tree(&["github.com/x/a"]))
            .unwrap();

        let (b, away) = (ProjectRoot::from("github.com/y/b"), ProjectRoot::from("github.com/z/away"));
        assert_eq!(data.ondisk.keys().collect::<Vec<_>>(), vec![&ProjectRoot::from("github.com/x/a")]);
        assert!(!data.notondisk.contains(&b));
        assert!(!data.dependencies.contains_key(&b));
        assert_eq!(data.notondisk.iter().collect::<Vec<_>>(), vec![&away]);
        assert_eq!(data.dependencies[&away], vec!["github.com/z/away"]);
        assert!(!data.direct.contains(&away));

        let lock = data.lock();
        assert_eq!(lock.len(), 1);
        assert!(lock.projects().iter().all(|lp| !lp.packages().is_empty()));
    }

    #[test]
    fn test_errored_package_stops_descent() {
        let ctx = ctx();
        let sm = MockSourceManager::new();
        let ws = MockWorkspace::new()
            .with_checkout("github.com/x/a", v1())
            .with_checkout("github.com/y/b", v1());
        let mut b_tree = tree("github.com/y/b", vec![package("github.com/y/b/ok", &["github.com/z/c"])]);
        b_tree.packages.insert(
            "github.com/y/b".to_string(),
            PackageOrErr::Err(PackageError::Unreadable {
                path: "github.com/y/b/b.go".into(),
                message: "permission denied".into(),
            }),
        );
        let lister = MockPackageLister::new()
            .with_tree(
                MockWorkspace::checkout_dir("github.com/x/a"),
                tree("github.com/x/a", vec![package("github.com/x/a", &["github.com/y/b"])]),
            )
            .with_tree(MockWorkspace::checkout_dir("github.com/y/b"), b_tree);

        let data = Discovery::new(&ctx, &sm, &lister, &ws)
            .discover(&root_tree(&["github.com/x/a"]))
            .unwrap();

        let b = ProjectRoot::from("github.com/y/b");
        assert!(!data.ondisk.contains_key(&b));
        assert!(!data.notondisk.contains(&b));
        assert!(!data.dependencies.contains_key(&ProjectRoot::from("github.com/z/c")));
        assert!(data.ondisk.contains_key(&ProjectRoot::from("github.com/x/a")));
    }

    #[test]
    fn test_undeducible_transitive_import_is_fatal() {
        let ctx = ctx();
        let sm = MockSourceManager::new();
        let ws = MockWorkspace::new().with_checkout("github.com/x/a", v1());
        let lister = MockPackageLister::new().with_tree(
            MockWorkspace::checkout_dir("github.com/x/a"),
            tree("github.com/x/a", vec![package("github.com/x/a", &["example.com/unknown"])]),
        );

        let err = Discovery::new(&ctx, &sm, &lister, &ws)
            .discover(&root_tree(&["github.com/x/a"]))
            .unwrap_err();
        match err {
            DiscoveryError::DeduceRoot { import_path, .. } => {
                assert_eq!(import_path, "example.com/unknown")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
