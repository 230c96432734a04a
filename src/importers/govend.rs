//! govend: `vendor.yml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::importers::base::{Converter, ImportedPackage};
use crate::importers::{read_file, ImportError};

fn config_path(dir: &Path) -> PathBuf {
    dir.join("vendor.yml")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GovendConfig {
    vendors: Vec<GovendPackage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GovendPackage {
    path: String,
    rev: String,
}

pub(super) fn has_metadata(dir: &Path) -> bool {
    config_path(dir).is_file()
}

pub(super) fn import(conv: &mut Converter<'_>, dir: &Path) -> Result<(), ImportError> {
    let path = config_path(dir);
    let content = read_file(&path)?;
    let config: GovendConfig = if content.trim().is_empty() {
        GovendConfig::default()
    } else {
        serde_yaml::from_str(&content).map_err(|e| ImportError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?
    };

    let mut packages = Vec::with_capacity(config.vendors.len());
    for vendor in config.vendors {
        if vendor.path.is_empty() {
            return Err(ImportError::invalid("govend", "configuration", "Path is required"));
        }
        if vendor.rev.is_empty() {
            return Err(ImportError::invalid("govend", "configuration", "Revision is required"));
        }
        packages.push(ImportedPackage::new(vendor.path).lock_hint(vendor.rev));
    }

    conv.import_packages(packages, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::ProjectRoot;
    use crate::core::version::{Revision, UnpairedVersion};
    use crate::test_support::MockSourceManager;
    use crate::util::GlobalContext;
    use tempfile::TempDir;

    const V1_REV: &str = "ff2948a2ac8f538c4ecd55962e919d1e13e74baf";

    fn sm() -> MockSourceManager {
        MockSourceManager::new().with_versions(
            "github.com/sdboyer/deptest",
            vec![UnpairedVersion::from_tag("v1.0.0").pair(Revision::new(V1_REV))],
        )
    }

    #[test]
    fn test_convert() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            config_path(tmp.path()),
            format!("vendors:\n- path: github.com/sdboyer/deptest\n  rev: {V1_REV}\n"),
        )
        .unwrap();
        assert!(has_metadata(tmp.path()));

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let sm = sm();
        let mut conv = Converter::new(&ctx, &sm);
        import(&mut conv, tmp.path()).unwrap();
        let (manifest, lock) = conv.finish();

        let root = ProjectRoot::from("github.com/sdboyer/deptest");
        assert_eq!(manifest.constraints[&root].constraint.to_string(), "^1.0.0");
        let locked = lock.get(&root).unwrap();
        assert_eq!(locked.version().revision().unwrap().as_str(), V1_REV);
    }

    #[test]
    fn test_missing_fields() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let sm = sm();

        std::fs::write(config_path(tmp.path()), "vendors:\n- rev: abc\n").unwrap();
        let mut conv = Converter::new(&ctx, &sm);
        let err = import(&mut conv, tmp.path()).unwrap_err();
        assert_eq!(err.to_string(), "invalid govend configuration: Path is required");

        std::fs::write(config_path(tmp.path()), "vendors:\n- path: github.com/sdboyer/deptest\n").unwrap();
        let mut conv = Converter::new(&ctx, &sm);
        let err = import(&mut conv, tmp.path()).unwrap_err();
        assert_eq!(err.to_string(), "invalid govend configuration: Revision is required");
    }
}
