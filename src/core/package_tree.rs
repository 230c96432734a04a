//! Package trees and import reachability.
//!
//! A [`PackageTree`] is the parsed view of one project directory: every
//! package found under it, keyed by import path, or the error that made the
//! package unreadable. [`PackageTree::to_reach_map`] turns it into a
//! [`ReachMap`]: for each package, the internal packages it transitively
//! imports and the union of external imports reachable through them.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::core::project::{is_standard_import_path, ProjectRoot};

/// A single parsed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Package clause name (`main` for commands)
    pub name: String,
    pub import_path: String,
    pub imports: Vec<String>,
    pub test_imports: Vec<String>,
}

/// Why a package could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageError {
    #[error("found packages `{first}` and `{second}` in {path}")]
    ConflictingNames {
        path: String,
        first: String,
        second: String,
    },

    #[error("failed to read {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("import path `{0}` has no package in this tree")]
    MissingInternal(String),

    #[error("imports package `{0}`, which has errors")]
    Propagated(String),
}

/// A package or the error encountered while parsing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOrErr {
    Package(Package),
    Err(PackageError),
}

/// Every package under one import root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageTree {
    pub import_root: String,
    pub packages: BTreeMap<String, PackageOrErr>,
}

/// Imports reachable from one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachEntry {
    pub internal: Vec<String>,
    pub external: Vec<String>,
}

/// Per-package reachability, keyed by import path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachMap(BTreeMap<String, ReachEntry>);

impl ReachMap {
    pub fn get(&self, pkg: &str) -> Option<&ReachEntry> {
        self.0.get(pkg)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ReachEntry)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Union of all external imports, sorted, optionally without standard
    /// library paths.
    pub fn flatten_external(&self, skip_stdlib: bool) -> Vec<String> {
        let set: BTreeSet<&String> = self
            .0
            .values()
            .flat_map(|e| e.external.iter())
            .filter(|ip| !(skip_stdlib && is_standard_import_path(ip)))
            .collect();
        set.into_iter().cloned().collect()
    }
}

impl FromIterator<(String, ReachEntry)> for ReachMap {
    fn from_iter<T: IntoIterator<Item = (String, ReachEntry)>>(iter: T) -> Self {
        ReachMap(iter.into_iter().collect())
    }
}

impl PackageTree {
    pub fn new(import_root: impl Into<String>) -> Self {
        PackageTree {
            import_root: import_root.into(),
            packages: BTreeMap::new(),
        }
    }

    fn is_internal(&self, ip: &str) -> bool {
        ProjectRoot::new(self.import_root.as_str()).contains_package(ip)
    }

    /// Compute reachability for every usable package.
    ///
    /// - `include_main`: keep `main` packages
    /// - `include_tests`: follow test imports too
    /// - `backprop_errors`: a package that reaches an errored (or missing)
    ///   internal package is itself moved into the error map
    /// - `ignored`: import paths (or `prefix*` patterns) to drop entirely
    pub fn to_reach_map(
        &self,
        include_main: bool,
        include_tests: bool,
        backprop_errors: bool,
        ignored: &[String],
    ) -> (ReachMap, BTreeMap<String, PackageError>) {
        let is_ignored = |ip: &str| {
            ignored.iter().any(|pattern| match pattern.strip_suffix('*') {
                Some(prefix) => ip.starts_with(prefix),
                None => ip == pattern,
            })
        };

        let mut errors = BTreeMap::new();
        // Direct internal/external edges for every usable package.
        let mut direct: BTreeMap<&str, (Vec<&str>, Vec<&str>)> = BTreeMap::new();

        for (ip, entry) in &self.packages {
            if is_ignored(ip) {
                continue;
            }

            let pkg = match entry {
                PackageOrErr::Package(pkg) => pkg,
                PackageOrErr::Err(err) => {
                    errors.insert(ip.clone(), err.clone());
                    continue;
                }
            };

            if pkg.name == "main" && !include_main {
                continue;
            }

            let mut internal = Vec::new();
            let mut external = Vec::new();
            let tests = include_tests.then_some(&pkg.test_imports);
            for import in pkg.imports.iter().chain(tests.into_iter().flatten()) {
                if is_ignored(import) || import == ip {
                    continue;
                }
                if self.is_internal(import) {
                    internal.push(import.as_str());
                } else {
                    external.push(import.as_str());
                }
            }

            direct.insert(ip.as_str(), (internal, external));
        }

        let mut reach = BTreeMap::new();
        'pkgs: for &start in direct.keys() {
            let mut seen_internal = BTreeSet::new();
            let mut external = BTreeSet::new();
            let mut stack = vec![start];
            let mut visited = BTreeSet::from([start]);

            while let Some(current) = stack.pop() {
                let Some((internal, ext)) = direct.get(current) else {
                    // Errored, missing, or filtered out (main/ignored).
                    let problem = match self.packages.get(current) {
                        Some(PackageOrErr::Err(_)) => {
                            Some(PackageError::Propagated(current.to_string()))
                        }
                        None => Some(PackageError::MissingInternal(current.to_string())),
                        Some(PackageOrErr::Package(_)) => None,
                    };
                    if let (Some(problem), true) = (problem, backprop_errors) {
                        errors.insert(start.to_string(), problem);
                        continue 'pkgs;
                    }
                    continue;
                };

                external.extend(ext.iter().copied());
                for &next in internal {
                    if visited.insert(next) {
                        seen_internal.insert(next);
                        stack.push(next);
                    }
                }
            }

            reach.insert(
                start.to_string(),
                ReachEntry {
                    internal: seen_internal.into_iter().map(String::from).collect(),
                    external: external.into_iter().map(String::from).collect(),
                },
            );
        }

        (ReachMap(reach), errors)
    }
}
