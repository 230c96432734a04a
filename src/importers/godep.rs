//! godep: `Godeps/Godeps.json`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::importers::base::{Converter, ImportedPackage};
use crate::importers::{read_file, ImportError};

fn config_path(dir: &Path) -> PathBuf {
    dir.join("Godeps").join("Godeps.json")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct GodepsJson {
    import_path: String,
    deps: Vec<GodepPackage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct GodepPackage {
    import_path: String,
    rev: String,
    comment: String,
}

pub(super) fn has_metadata(dir: &Path) -> bool {
    config_path(dir).is_file()
}

pub(super) fn import(conv: &mut Converter<'_>, dir: &Path) -> Result<(), ImportError> {
    let path = config_path(dir);
    let content = read_file(&path)?;
    let json: GodepsJson = serde_json::from_str(&content).map_err(|e| ImportError::Parse {
        path: path.clone(),
        message: e.to_string(),
    })?;
    tracing::debug!("godep project {}", json.import_path);

    let mut packages = Vec::with_capacity(json.deps.len());
    for dep in json.deps {
        if dep.import_path.is_empty() {
            return Err(ImportError::invalid("godep", "configuration", "ImportPath is required"));
        }
        if dep.rev.is_empty() {
            return Err(ImportError::invalid("godep", "configuration", "Rev is required"));
        }

        packages.push(
            ImportedPackage::new(dep.import_path)
                .lock_hint(dep.rev)
                .constraint_hint(dep.comment),
        );
    }

    conv.import_packages(packages, true)
}
