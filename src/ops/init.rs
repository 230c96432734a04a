//! `wharf init`: build a manifest and lock for an existing project.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::feedback::{DependencyType, Feedback};
use crate::core::lock::{Lock, LOCKFILE_NAME};
use crate::core::manifest::{Manifest, ProjectProperties, MANIFEST_NAME};
use crate::core::package_tree::PackageTree;
use crate::core::project::ProjectRoot;
use crate::core::workspace::WorkspaceInspector;
use crate::discovery::{Discovery, ProjectData};
use crate::importers::{import_legacy, merge_locks, merge_manifests, RootAnalyzer};
use crate::resolver::infer::constraint_for_version;
use crate::resolver::{SolveParameters, Solution, Solver};
use crate::sources::source::{PackageLister, SourceManager};
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::shell::Status;
use crate::util::GlobalContext;

/// Options for `init`.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Project directory
    pub path: PathBuf,
    /// Import path of the project; computed from the search roots when unset
    pub root_import_path: Option<String>,
    /// Do not import configuration from other tools
    pub skip_tools: bool,
}

/// Collaborators `init` drives.
pub struct InitBackend<'a> {
    pub sm: &'a dyn SourceManager,
    pub lister: &'a dyn PackageLister,
    pub workspace: &'a dyn WorkspaceInspector,
    pub solver: &'a dyn Solver,
}

/// Discover, import, solve and write `Wharf.toml` and `Wharf.lock`.
pub fn init(ctx: &GlobalContext, opts: &InitOptions, backend: &InitBackend<'_>) -> Result<(Manifest, Lock)> {
    let shell = ctx.shell();
    let dir = opts
        .path
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", opts.path.display()))?;

    let manifest_path = dir.join(MANIFEST_NAME);
    let lock_path = dir.join(LOCKFILE_NAME);
    for existing in [&manifest_path, &lock_path] {
        if existing.exists() {
            Diagnostic::error(format!("{} already exists", existing.display()))
                .with_suggestion(suggestions::EXISTING_MANIFEST)
                .emit(shell);
            bail!("refusing to overwrite {}", existing.display());
        }
    }

    let import_root = root_import_path(ctx, opts, &dir)?;
    let root = ProjectRoot::new(import_root.as_str());

    let tree = backend
        .lister
        .list_packages(&dir, &import_root)
        .with_context(|| format!("failed to list packages in {}", dir.display()))?;

    let pd = Discovery::new(ctx, backend.sm, backend.lister, backend.workspace)
        .discover(&tree)
        .context("failed to discover dependencies")?;

    let mut manifest = pd.manifest();
    let mut lock = pd.lock();
    log_discovered(ctx, &pd, &lock);

    if !opts.skip_tools {
        if let Some((m, l)) = import_legacy(ctx, backend.sm, &dir, &root)
            .context("failed to import legacy configuration")?
        {
            manifest = merge_manifests(manifest, m);
            lock = merge_locks(lock, l);
        }
    }

    let analyzer = RootAnalyzer::new(ctx, backend.sm);
    let solution = {
        let params = SolveParameters {
            root_dir: &dir,
            root_package_tree: &tree,
            manifest: &manifest,
            lock: &lock,
            analyzer: &analyzer,
        };

        shell.status(Status::Resolving, "dependencies");
        match backend.solver.solve(&params) {
            Ok(solution) => solution,
            Err(e) => {
                e.to_diagnostic().emit(shell);
                return Err(e).context("failed to solve dependencies");
            }
        }
    };

    reconcile(ctx, &pd, &lock, &mut manifest, &solution);

    let mut lock = solution.into_lock();
    // Hashed from the reconciled manifest so hash-inputs agrees with the lock.
    lock.memo = memo(&dir, &tree, &manifest, &lock, &analyzer, backend.solver);

    manifest.save(&manifest_path)?;
    lock.save(&lock_path)?;

    shell.status(
        Status::Created,
        format!("{} and {} in {}", MANIFEST_NAME, LOCKFILE_NAME, dir.display()),
    );

    Ok((manifest, lock))
}

fn root_import_path(ctx: &GlobalContext, opts: &InitOptions, dir: &Path) -> Result<String> {
    if let Some(root) = &opts.root_import_path {
        let root = root.trim_matches('/');
        if root.is_empty() {
            bail!("the root import path must not be empty");
        }
        return Ok(root.to_string());
    }

    match ctx.import_path_for_dir(dir) {
        Some(ip) => Ok(ip),
        None => {
            Diagnostic::error(format!(
                "{} is not inside any workspace search root",
                dir.display()
            ))
            .with_suggestion(suggestions::OUTSIDE_SEARCH_PATH)
            .emit(ctx.shell());
            bail!("unable to determine the import path of {}", dir.display())
        }
    }
}

/// Report what discovery found checked out.
fn log_discovered(ctx: &GlobalContext, pd: &ProjectData, lock: &Lock) {
    let shell = ctx.shell();
    for (root, props) in &pd.constraints {
        Feedback::constraint(root, &props.constraint, DependencyType::Direct).log(shell);
    }
    for lp in lock.projects() {
        let dep_type = if pd.constraints.contains_key(lp.root()) {
            DependencyType::Direct
        } else {
            DependencyType::Transitive
        };
        Feedback::locked(lp, dep_type).log(shell);
    }
}

/// Fold the solution back into the manifest.
///
/// Projects the solver added that the root imports directly, and that
/// discovery could not find on disk, become direct dependencies with a
/// constraint inferred from the chosen version. Other additions are
/// reported as transitive. Constraints on projects the
/// solution no longer contains are dropped.
fn reconcile(
    ctx: &GlobalContext,
    pd: &ProjectData,
    pre_solve: &Lock,
    manifest: &mut Manifest,
    solution: &Solution,
) {
    let shell = ctx.shell();

    for lp in solution.projects() {
        let root = lp.root();
        if pre_solve.has_project_with_root(root) {
            continue;
        }

        if pd.notondisk.contains(root) && pd.direct.contains(root) {
            if let Some(constraint) = constraint_for_version(lp.version()) {
                if !manifest.constraints.contains_key(root) {
                    Feedback::constraint(root, &constraint, DependencyType::Direct).log(shell);
                    manifest.constraints.insert(
                        root.clone(),
                        ProjectProperties::new(constraint).with_source(lp.ident().source.clone()),
                    );
                }
            }
            Feedback::locked(lp, DependencyType::Direct).log(shell);
        } else {
            Feedback::locked(lp, DependencyType::Transitive).log(shell);
        }
    }

    let solved: BTreeSet<&ProjectRoot> = solution.projects().iter().map(|lp| lp.root()).collect();
    manifest.constraints.retain(|root, _| {
        let keep = solved.contains(root);
        if !keep {
            tracing::debug!("dropping constraint on unused project {}", root);
        }
        keep
    });
}

/// Digest of the final solve inputs, stored in the lock.
fn memo(
    dir: &Path,
    tree: &PackageTree,
    manifest: &Manifest,
    lock: &Lock,
    analyzer: &RootAnalyzer<'_>,
    solver: &dyn Solver,
) -> String {
    let params = SolveParameters {
        root_dir: dir,
        root_package_tree: tree,
        manifest,
        lock,
        analyzer,
    };
    solver.hash_inputs(&params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constraint::Constraint;
    use crate::core::lock::LockedProject;
    use crate::core::project::ProjectIdentifier;
    use crate::core::version::{Revision, UnpairedVersion, Version};
    use crate::resolver::LocalFirstSolver;
    use crate::test_support::{package, tree, MockPackageLister, MockSourceManager, MockWorkspace};
    use crate::util::shell::{captured, Shell, Verbosity};
    use tempfile::TempDir;

    const REV_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const REV_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const REV_C: &str = "cccccccccccccccccccccccccccccccccccccccc";

    fn tag(t: &str, rev: &str) -> Version {
        UnpairedVersion::from_tag(t).pair(Revision::new(rev))
    }

    /// `me/app` imports `x/a` (checked out at v1.0.0, itself importing
    /// `y/c`, also checked out) and `x/b` (not on disk).
    struct Fixture {
        tmp: TempDir,
        sm: MockSourceManager,
        lister: MockPackageLister,
        ws: MockWorkspace,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().canonicalize().unwrap();

        let sm = MockSourceManager::new()
            .with_versions("github.com/x/a", vec![tag("v1.0.0", REV_A)])
            .with_versions("github.com/x/b", vec![tag("v1.2.0", REV_B), tag("v2.1.0", REV_C)])
            .with_versions("github.com/y/c", vec![tag("v0.1.0", REV_C)]);

        let lister = MockPackageLister::new()
            .with_tree(
                &dir,
                tree(
                    "github.com/me/app",
                    vec![package("github.com/me/app", &["fmt", "github.com/x/a", "github.com/x/b/sub"])],
                ),
            )
            .with_tree(
                MockWorkspace::checkout_dir("github.com/x/a"),
                tree("github.com/x/a", vec![package("github.com/x/a", &["github.com/y/c"])]),
            )
            .with_tree(
                MockWorkspace::checkout_dir("github.com/y/c"),
                tree("github.com/y/c", vec![package("github.com/y/c", &["strings"])]),
            );

        let ws = MockWorkspace::new()
            .with_checkout("github.com/x/a", tag("v1.0.0", REV_A))
            .with_checkout("github.com/y/c", tag("v0.1.0", REV_C));

        Fixture { tmp, sm, lister, ws }
    }

    fn run(f: &Fixture, ctx: &GlobalContext) -> Result<(Manifest, Lock)> {
        let solver = LocalFirstSolver::new(&f.sm, &f.ws).with_lister(&f.lister);
        let backend = InitBackend {
            sm: &f.sm,
            lister: &f.lister,
            workspace: &f.ws,
            solver: &solver,
        };
        let opts = InitOptions {
            path: f.tmp.path().to_path_buf(),
            root_import_path: Some("github.com/me/app".into()),
            skip_tools: false,
        };
        init(ctx, &opts, &backend)
    }

    #[test]
    fn test_init_writes_manifest_and_lock() {
        let f = fixture();
        let (shell, buf) = Shell::capture(Verbosity::Normal);
        let ctx = GlobalContext::with_cwd(f.tmp.path().to_path_buf()).with_shell(shell);

        let (manifest, lock) = run(&f, &ctx).unwrap();

        let a = ProjectRoot::from("github.com/x/a");
        let b = ProjectRoot::from("github.com/x/b");
        let c = ProjectRoot::from("github.com/y/c");

        assert_eq!(manifest.constraints[&a].constraint.to_string(), "^1.0.0");
        assert_eq!(manifest.constraints[&b].constraint.to_string(), "^2.1.0");
        assert!(!manifest.constraints.contains_key(&c));

        let roots: Vec<&str> = lock.projects().iter().map(|p| p.root().as_str()).collect();
        assert_eq!(roots, vec!["github.com/x/a", "github.com/x/b", "github.com/y/c"]);
        assert_eq!(lock.get(&b).unwrap().packages(), ["sub"]);
        assert_eq!(lock.memo.len(), 64);

        assert!(f.tmp.path().join(MANIFEST_NAME).is_file());
        assert!(f.tmp.path().join(LOCKFILE_NAME).is_file());

        let out = captured(&buf);
        assert!(out.contains("^1.0.0 as constraint for direct dep github.com/x/a"));
        assert!(out.contains("v0.1.0 (ccccccc) for transitive dep github.com/y/c"));
        assert!(out.contains("^2.1.0 as constraint for direct dep github.com/x/b"));
    }

    #[test]
    fn test_init_refuses_existing_manifest() {
        let f = fixture();
        std::fs::write(f.tmp.path().join(MANIFEST_NAME), "").unwrap();
        let (shell, buf) = Shell::capture(Verbosity::Normal);
        let ctx = GlobalContext::with_cwd(f.tmp.path().to_path_buf()).with_shell(shell);

        let err = run(&f, &ctx).unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
        assert!(captured(&buf).contains("Remove the existing Wharf.toml"));
    }

    #[test]
    fn test_init_overlays_legacy_configuration() {
        let f = fixture();
        std::fs::write(
            f.tmp.path().join("glide.yaml"),
            "import:\n- package: github.com/x/b\n  version: ^1.0.0\n",
        )
        .unwrap();
        let ctx = GlobalContext::with_cwd(f.tmp.path().to_path_buf());

        let (manifest, lock) = run(&f, &ctx).unwrap();
        let b = ProjectRoot::from("github.com/x/b");
        assert_eq!(manifest.constraints[&b].constraint.to_string(), "^1.0.0");
        assert_eq!(lock.get(&b).unwrap().version().to_string(), "v1.2.0");
    }

    #[test]
    fn test_reconcile_prunes_and_classifies() {
        let (shell, buf) = Shell::capture(Verbosity::Normal);
        let ctx = GlobalContext::with_cwd(std::env::temp_dir()).with_shell(shell);

        let mut pd = ProjectData::default();
        pd.notondisk.insert("github.com/x/new".into());
        pd.notondisk.insert("github.com/z/far".into());
        pd.direct.insert("github.com/x/new".into());

        let mut manifest = Manifest::new();
        manifest.constraints.insert(
            "github.com/x/dead".into(),
            ProjectProperties::new(Constraint::Branch("master".into())),
        );

        let locked = |root: &str, v: Version| {
            LockedProject::new(ProjectIdentifier::new(root.into()), v, vec![".".into()])
        };
        let solution = Solution::new(vec![
            locked("github.com/x/new", tag("v1.4.0", REV_A)),
            locked("github.com/x/other", Version::revision_only(REV_B)),
            locked("github.com/z/far", tag("v0.2.0", REV_C)),
        ]);

        reconcile(&ctx, &pd, &Lock::new(), &mut manifest, &solution);

        assert_eq!(manifest.constraints.len(), 1);
        assert_eq!(
            manifest.constraints[&ProjectRoot::from("github.com/x/new")]
                .constraint
                .to_string(),
            "^1.4.0"
        );
        let out = captured(&buf);
        assert!(out.contains("v1.4.0 (aaaaaaa) for direct dep github.com/x/new"));
        assert!(out.contains("bbbbbbb for transitive dep github.com/x/other"));
        assert!(out.contains("v0.2.0 (ccccccc) for transitive dep github.com/z/far"));
    }
}
