//! Solve-input memo hashing.
//!
//! Two solves over the same manifest and the same set of external imports
//! hash identically, whatever order they were declared in. The lock is not
//! an input: it records the output.

use crate::core::manifest::ProjectProperties;
use crate::resolver::SolveParameters;
use crate::util::hash::InputsHasher;

fn properties_line(root: &str, props: &ProjectProperties) -> String {
    format!(
        "{} {} {}",
        root,
        props.source.as_deref().unwrap_or(""),
        props.constraint
    )
}

/// Hex SHA-256 digest of the solve inputs.
pub fn hash_inputs(params: &SolveParameters<'_>) -> String {
    let manifest = params.manifest;
    let mut hasher = InputsHasher::new();

    let constraints: Vec<String> = manifest
        .constraints
        .iter()
        .map(|(root, props)| properties_line(root.as_str(), props))
        .collect();
    hasher
        .section("constraints")
        .update_sorted(constraints.iter().map(String::as_str));

    let overrides: Vec<String> = manifest
        .overrides
        .iter()
        .map(|(root, props)| properties_line(root.as_str(), props))
        .collect();
    hasher
        .section("overrides")
        .update_sorted(overrides.iter().map(String::as_str));

    hasher
        .section("ignored")
        .update_sorted(manifest.ignored.iter().map(String::as_str));

    let imports = params.external_imports();
    hasher
        .section("imports")
        .update_sorted(imports.iter().map(String::as_str));

    let (name, version) = params.analyzer.info();
    hasher
        .section("analyzer")
        .update_str(name)
        .update_str(&version.to_string());

    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::core::constraint::Constraint;
    use crate::core::lock::Lock;
    use crate::core::manifest::Manifest;
    use crate::core::project::ProjectRoot;
    use crate::resolver::ProjectAnalyzer;
    use crate::test_support::{package, tree};

    struct NoAnalyzer;

    impl ProjectAnalyzer for NoAnalyzer {
        fn info(&self) -> (&'static str, u32) {
            ("none", 1)
        }

        fn derive_manifest_and_lock(
            &self,
            _dir: &Path,
            _root: &ProjectRoot,
        ) -> anyhow::Result<Option<(Manifest, Lock)>> {
            Ok(None)
        }
    }

    fn digest(manifest: &Manifest, imports: &[&str]) -> String {
        let tree = tree("github.com/me/app", vec![package("github.com/me/app", imports)]);
        let lock = Lock::new();
        let params = SolveParameters {
            root_dir: Path::new("/work/app"),
            root_package_tree: &tree,
            manifest,
            lock: &lock,
            analyzer: &NoAnalyzer,
        };
        hash_inputs(&params)
    }

    #[test]
    fn test_hash_is_stable_across_import_order() {
        let m = Manifest::new();
        assert_eq!(
            digest(&m, &["github.com/x/a", "github.com/y/b"]),
            digest(&m, &["github.com/y/b", "github.com/x/a"])
        );
    }

    #[test]
    fn test_hash_changes_with_constraints_and_imports() {
        let base = Manifest::new();
        let mut constrained = Manifest::new();
        constrained.constraints.insert(
            "github.com/x/a".into(),
            ProjectProperties::new(Constraint::Branch("master".into())),
        );

        let h = digest(&base, &["github.com/x/a"]);
        assert_eq!(h.len(), 64);
        assert_ne!(h, digest(&constrained, &["github.com/x/a"]));
        assert_ne!(h, digest(&base, &["github.com/x/a", "github.com/z/c"]));
    }

    #[test]
    fn test_stdlib_imports_do_not_affect_hash() {
        let m = Manifest::new();
        assert_eq!(
            digest(&m, &["github.com/x/a"]),
            digest(&m, &["github.com/x/a", "fmt"])
        );
    }
}
