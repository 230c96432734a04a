//! Go package lister - parses `.go` sources into a [`PackageTree`].
//!
//! Only package clauses and import declarations are read. Directories named
//! `vendor` or `testdata`, and anything starting with `.` or `_`, are
//! skipped, matching the go tool.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::core::package_tree::{Package, PackageError, PackageOrErr, PackageTree};
use crate::sources::source::{ListError, PackageLister};

static PACKAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*package\s+([A-Za-z_][A-Za-z0-9_]*)").expect("valid package regex")
});

static IMPORT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\bimport\s*\((.*?)\)").expect("valid import block regex"));

static IMPORT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[A-Za-z_.][A-Za-z0-9_]*\s+)?"([^"]+)""#)
        .expect("valid import regex")
});

static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("valid quoted regex"));

static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid comment regex"));

/// Lists Go packages found on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoPackageLister;

/// Package clause and imports of one source file.
#[derive(Debug, Default, PartialEq, Eq)]
struct SourceFile {
    package: String,
    imports: Vec<String>,
}

impl PackageLister for GoPackageLister {
    fn list_packages(&self, dir: &Path, import_root: &str) -> Result<PackageTree, ListError> {
        if !dir.is_dir() {
            return Err(ListError::NotFound(dir.to_path_buf()));
        }

        let mut files_by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped(e));

        for entry in walker {
            let entry = entry.map_err(|source| ListError::Walk {
                path: dir.to_path_buf(),
                source,
            })?;
            if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == "go") {
                if let Some(parent) = entry.path().parent() {
                    files_by_dir
                        .entry(parent.to_path_buf())
                        .or_default()
                        .push(entry.path().to_path_buf());
                }
            }
        }

        let mut tree = PackageTree::new(import_root);
        for (pkg_dir, files) in files_by_dir {
            let import_path = import_path_for(dir, &pkg_dir, import_root);
            let entry = parse_package(&import_path, &files);
            tree.packages.insert(import_path, entry);
        }

        tracing::debug!("listed {} packages under {}", tree.packages.len(), import_root);
        Ok(tree)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') || name.starts_with('_') {
        return true;
    }
    entry.file_type().is_dir() && (name == "vendor" || name == "testdata")
}

fn import_path_for(base: &Path, pkg_dir: &Path, import_root: &str) -> String {
    let rel = pkg_dir.strip_prefix(base).unwrap_or(pkg_dir);
    let rel: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if rel.is_empty() {
        import_root.to_string()
    } else {
        format!("{}/{}", import_root, rel.join("/"))
    }
}

fn parse_package(import_path: &str, files: &[PathBuf]) -> PackageOrErr {
    let mut name: Option<String> = None;
    let mut imports = BTreeSet::new();
    let mut test_imports = BTreeSet::new();

    for file in files {
        let content = match std::fs::read_to_string(file) {
            Ok(c) => c,
            Err(e) => {
                return PackageOrErr::Err(PackageError::Unreadable {
                    path: file.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        let parsed = parse_source(&content);
        let is_test = file
            .file_name()
            .is_some_and(|f| f.to_string_lossy().ends_with("_test.go"));

        if is_test {
            test_imports.extend(parsed.imports);
            continue;
        }

        match &name {
            Some(existing) if *existing != parsed.package => {
                return PackageOrErr::Err(PackageError::ConflictingNames {
                    path: import_path.to_string(),
                    first: existing.clone(),
                    second: parsed.package,
                });
            }
            Some(_) => {}
            None => name = Some(parsed.package),
        }
        imports.extend(parsed.imports);
    }

    // A directory with only test files still names a package.
    let name = name.unwrap_or_else(|| {
        import_path
            .rsplit('/')
            .next()
            .unwrap_or(import_path)
            .to_string()
    });

    let test_imports = test_imports
        .into_iter()
        .filter(|ip| !imports.contains(ip) && ip != import_path)
        .collect();

    PackageOrErr::Package(Package {
        name,
        import_path: import_path.to_string(),
        imports: imports.into_iter().collect(),
        test_imports,
    })
}

fn parse_source(content: &str) -> SourceFile {
    let stripped = BLOCK_COMMENT_RE.replace_all(content, "");

    // Imports must precede all declarations.
    let header: String = stripped
        .lines()
        .take_while(|line| {
            let t = line.trim_start();
            !(t.starts_with("func ")
                || t.starts_with("type ")
                || t.starts_with("var ")
                || t.starts_with("const "))
        })
        .map(|line| line.split("//").next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n");

    let package = PACKAGE_RE
        .captures(&header)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let mut imports: Vec<String> = IMPORT_LINE_RE
        .captures_iter(&header)
        .map(|c| c[1].to_string())
        .collect();
    for block in IMPORT_BLOCK_RE.captures_iter(&header) {
        imports.extend(QUOTED_RE.captures_iter(&block[1]).map(|c| c[1].to_string()));
    }

    SourceFile { package, imports }
}
