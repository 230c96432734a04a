//! govendor: `vendor/vendor.json`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::project::ProjectRoot;
use crate::importers::base::{Converter, ImportedPackage};
use crate::importers::{read_file, ImportError};

fn config_path(dir: &Path) -> PathBuf {
    dir.join("vendor").join("vendor.json")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GovendorConfig {
    ignore: String,
    package: Vec<GovendorPackage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GovendorPackage {
    path: String,
    revision: String,
    origin: String,
}

pub(super) fn has_metadata(dir: &Path) -> bool {
    config_path(dir).is_file()
}

pub(super) fn import(conv: &mut Converter<'_>, dir: &Path, root: &ProjectRoot) -> Result<(), ImportError> {
    let path = config_path(dir);
    let content = read_file(&path)?;
    let config: GovendorConfig = serde_json::from_str(&content).map_err(|e| ImportError::Parse {
        path: path.clone(),
        message: e.to_string(),
    })?;

    let mut packages = Vec::with_capacity(config.package.len());
    for pkg in config.package {
        if pkg.path.is_empty() {
            return Err(ImportError::invalid("govendor", "configuration", "Path is required"));
        }
        packages.push(
            ImportedPackage::new(pkg.path)
                .source(pkg.origin)
                .lock_hint(pkg.revision),
        );
    }

    conv.import_packages(packages, true)?;

    let ignored = ignore_patterns(conv, &config.ignore, root);
    conv.manifest.ignored.extend(ignored);
    Ok(())
}

/// Turn govendor's space-separated ignore list into ignored import paths.
///
/// Words without a `/` are build tags and cannot be expressed.
fn ignore_patterns(conv: &Converter<'_>, ignore: &str, root: &ProjectRoot) -> Vec<String> {
    let shell = conv.ctx().shell();
    let mut patterns = Vec::new();

    for word in ignore.split_whitespace() {
        if !word.contains('/') {
            shell.warn(format!(
                "govendor ignores the `{}` build tag; build tags are not supported and it will be dropped",
                word
            ));
            continue;
        }

        let word = word.trim_end_matches('/');
        let pattern = if conv.source_manager().deduce_project_root(word).is_ok() {
            word.to_string()
        } else {
            format!("{}/{}", root, word.trim_start_matches('/'))
        };
        patterns.push(format!("{}*", pattern));
    }

    patterns
}
