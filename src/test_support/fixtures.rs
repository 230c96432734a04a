//! Test fixtures: git repositories and package trees.

use std::path::Path;

use git2::{Oid, Repository, Signature};

use crate::core::package_tree::{Package, PackageOrErr, PackageTree};

/// Initialize a git repository with one source file in it.
pub fn init_repo(dir: &Path) -> Repository {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("doc.go"), "package fixture\n").unwrap();
    Repository::init(dir).unwrap()
}

/// Stage every file in the worktree and commit it on the current branch.
pub fn commit_all(repo: &Repository, message: &str) -> Oid {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = Signature::now("Wharf Test", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// A parsed package entry for building trees by hand.
pub fn package(import_path: &str, imports: &[&str]) -> (String, PackageOrErr) {
    let name = import_path.rsplit('/').next().unwrap_or(import_path);
    (
        import_path.to_string(),
        PackageOrErr::Package(Package {
            name: name.to_string(),
            import_path: import_path.to_string(),
            imports: imports.iter().map(|s| s.to_string()).collect(),
            test_imports: vec![],
        }),
    )
}

/// A package tree rooted at `import_root` containing `packages`.
pub fn tree(import_root: &str, packages: Vec<(String, PackageOrErr)>) -> PackageTree {
    let mut tree = PackageTree::new(import_root);
    tree.packages.extend(packages);
    tree
}
