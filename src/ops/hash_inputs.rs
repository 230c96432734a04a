//! `wharf hash-inputs`: the memo of the current project's solve inputs.

use anyhow::{bail, Context, Result};

use crate::core::lock::{Lock, LOCKFILE_NAME};
use crate::core::manifest::{Manifest, MANIFEST_NAME};
use crate::importers::RootAnalyzer;
use crate::resolver::{SolveParameters, Solver};
use crate::sources::source::{PackageLister, SourceManager};
use crate::util::GlobalContext;

/// Compute the input hash for the project containing the working directory.
///
/// `root_import_path` overrides the import path computed from the search
/// roots.
pub fn hash_inputs(
    ctx: &GlobalContext,
    root_import_path: Option<&str>,
    sm: &dyn SourceManager,
    lister: &dyn PackageLister,
    solver: &dyn Solver,
) -> Result<String> {
    let Some(dir) = ctx.find_project_root() else {
        bail!(
            "could not find {} in {} or any parent directory",
            MANIFEST_NAME,
            ctx.cwd().display()
        );
    };

    let import_root = match root_import_path {
        Some(root) => root.trim_matches('/').to_string(),
        None => ctx.import_path_for_dir(&dir).with_context(|| {
            format!(
                "unable to determine the import path of {}; pass `--root`",
                dir.display()
            )
        })?,
    };

    let manifest = Manifest::load(&dir.join(MANIFEST_NAME))?;
    let lock_path = dir.join(LOCKFILE_NAME);
    let lock = if lock_path.is_file() {
        Lock::load(&lock_path)?
    } else {
        Lock::new()
    };

    let tree = lister
        .list_packages(&dir, &import_root)
        .with_context(|| format!("failed to list packages in {}", dir.display()))?;

    let analyzer = RootAnalyzer::new(ctx, sm);
    let params = SolveParameters {
        root_dir: &dir,
        root_package_tree: &tree,
        manifest: &manifest,
        lock: &lock,
        analyzer: &analyzer,
    };

    let memo = solver.hash_inputs(&params);
    if !lock.memo.is_empty() && lock.memo != memo {
        tracing::info!("{} is out of date with {}", LOCKFILE_NAME, MANIFEST_NAME);
    }
    Ok(memo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constraint::Constraint;
    use crate::core::manifest::ProjectProperties;
    use crate::resolver::LocalFirstSolver;
    use crate::test_support::{package, tree, MockPackageLister, MockSourceManager, MockWorkspace};
    use tempfile::TempDir;

    #[test]
    fn test_hash_changes_with_constraints() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().canonicalize().unwrap();

        let sm = MockSourceManager::new();
        let ws = MockWorkspace::new();
        let solver = LocalFirstSolver::new(&sm, &ws);
        let lister = MockPackageLister::new().with_tree(
            &dir,
            tree(
                "github.com/me/app",
                vec![package("github.com/me/app", &["github.com/x/a"])],
            ),
        );

        let mut manifest = Manifest::new();
        manifest.save(&dir.join(MANIFEST_NAME)).unwrap();
        let ctx = GlobalContext::with_cwd(dir.clone());
        let first = hash_inputs(&ctx, Some("github.com/me/app"), &sm, &lister, &solver).unwrap();
        let again = hash_inputs(&ctx, Some("github.com/me/app"), &sm, &lister, &solver).unwrap();
        assert_eq!(first, again);

        manifest.constraints.insert(
            "github.com/x/a".into(),
            ProjectProperties::new(Constraint::Branch("master".into())),
        );
        manifest.save(&dir.join(MANIFEST_NAME)).unwrap();
        let changed = hash_inputs(&ctx, Some("github.com/me/app"), &sm, &lister, &solver).unwrap();
        assert_ne!(first, changed);
    }

    #[test]
    fn test_requires_manifest() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let sm = MockSourceManager::new();
        let ws = MockWorkspace::new();
        let solver = LocalFirstSolver::new(&sm, &ws);

        let err = hash_inputs(&ctx, None, &sm, &MockPackageLister::new(), &solver).unwrap_err();
        assert!(err.to_string().contains("could not find Wharf.toml"));
    }
}
