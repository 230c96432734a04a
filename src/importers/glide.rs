//! glide: `glide.yaml` and `glide.lock`.

use std::path::Path;

use serde::Deserialize;

use crate::core::project::ProjectRoot;
use crate::importers::base::{Converter, ImportedPackage};
use crate::importers::{read_file, ImportError};
use crate::util::shell::Status;

const CONFIG_NAME: &str = "glide.yaml";
const LOCK_NAME: &str = "glide.lock";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GlideConfig {
    package: String,
    ignore: Vec<String>,
    exclude_dirs: Vec<String>,
    import: Vec<GlidePackage>,
    test_import: Vec<GlidePackage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GlidePackage {
    package: String,
    repo: String,
    version: String,
    subpackages: Vec<String>,
    os: Vec<String>,
    arch: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GlideLock {
    imports: Vec<GlideLockedPackage>,
    test_imports: Vec<GlideLockedPackage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GlideLockedPackage {
    name: String,
    repo: String,
    version: String,
}

pub(super) fn has_metadata(dir: &Path) -> bool {
    dir.join(CONFIG_NAME).is_file()
}

fn parse<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> Result<T, ImportError> {
    let content = read_file(path)?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(&content).map_err(|e| ImportError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

pub(super) fn import(conv: &mut Converter<'_>, dir: &Path, root: &ProjectRoot) -> Result<(), ImportError> {
    let config: GlideConfig = parse(&dir.join(CONFIG_NAME))?;
    let lock_path = dir.join(LOCK_NAME);
    let lock: Option<GlideLock> = if lock_path.is_file() {
        Some(parse(&lock_path)?)
    } else {
        None
    };

    let shell = conv.ctx().shell();
    let mut packages = Vec::new();

    for pkg in config.import.iter().chain(&config.test_import) {
        if pkg.package.is_empty() {
            return Err(ImportError::invalid("glide", "configuration", "Name is required"));
        }
        if !pkg.os.is_empty() {
            shell.warn(format!(
                "The {} package specified an os, but that is not supported; ignoring os",
                pkg.package
            ));
        }
        if !pkg.arch.is_empty() {
            shell.warn(format!(
                "The {} package specified an arch, but that is not supported; ignoring arch",
                pkg.package
            ));
        }
        if !pkg.subpackages.is_empty() {
            shell.verbose(
                Status::Skipped,
                format!("subpackages of {}; imports decide which are used", pkg.package),
            );
        }

        packages.push(
            ImportedPackage::new(pkg.package.as_str())
                .source(pkg.repo.as_str())
                .constraint_hint(pkg.version.as_str()),
        );
    }

    if let Some(lock) = &lock {
        for pkg in lock.imports.iter().chain(&lock.test_imports) {
            if pkg.name.is_empty() {
                return Err(ImportError::invalid("glide", "lock", "Name is required"));
            }
            packages.push(
                ImportedPackage::new(pkg.name.as_str())
                    .source(pkg.repo.as_str())
                    .lock_hint(pkg.version.as_str()),
            );
        }
    }

    conv.import_packages(packages, false)?;

    conv.manifest.ignored.extend(config.ignore);

    if !config.exclude_dirs.is_empty() && !config.package.is_empty() && config.package != root.as_str() {
        shell.warn(format!(
            "Glide thinks the package is '{}' but the project root is '{}'; using '{}' for excluded directories",
            config.package, root, root
        ));
    }
    for excluded in &config.exclude_dirs {
        let excluded = excluded.trim_matches('/');
        conv.manifest.ignored.push(format!("{}/{}", root, excluded));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::{Revision, UnpairedVersion};
    use crate::test_support::MockSourceManager;
    use crate::util::shell::{captured, Shell, Verbosity};
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
    fn test_convert_config_and_lock() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_NAME),
            r#"
package: github.com/old/name
ignore:
- github.com/sdboyer/dep-test
excludeDirs:
- samples
import:
- package: github.com/sdboyer/deptest
  repo: https://github.com/sdboyer/deptest.git
  version: v1.0.0
  os: [linux]
"#,
        )
        .unwrap();
        std::fs::write(
            tmp.path().join(LOCK_NAME),
            format!("imports:\n- name: github.com/sdboyer/deptest\n  version: {V1_REV}\n"),
        )
        .unwrap();

        let (shell, buf) = Shell::capture(Verbosity::Normal);
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf()).with_shell(shell);
        let sm = sm();
        let mut conv = Converter::new(&ctx, &sm);
        import(&mut conv, tmp.path(), &"github.com/me/app".into()).unwrap();
        let (manifest, lock) = conv.finish();

        let root = ProjectRoot::from("github.com/sdboyer/deptest");
        assert_eq!(manifest.constraints[&root].constraint.to_string(), "^1.0.0");
        assert_eq!(manifest.constraints[&root].source, None);
        assert_eq!(lock.get(&root).unwrap().version().to_string(), "v1.0.0");
        assert_eq!(
            manifest.ignored,
            vec!["github.com/sdboyer/dep-test", "github.com/me/app/samples"]
        );

        let out = captured(&buf);
        assert!(out.contains("ignoring os"));
        assert!(out.contains("github.com/old/name"));
    }

    #[test]
    fn test_lock_without_version_in_config() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_NAME),
            "import:\n- package: github.com/sdboyer/deptest\n",
        )
        .unwrap();
        std::fs::write(
            tmp.path().join(LOCK_NAME),
            format!("imports:\n- name: github.com/sdboyer/deptest\n  version: {V1_REV}\n"),
        )
        .unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let sm = sm();
        let mut conv = Converter::new(&ctx, &sm);
        import(&mut conv, tmp.path(), &"github.com/me/app".into()).unwrap();
        let (manifest, lock) = conv.finish();

        assert!(manifest.constraints.is_empty());
        assert_eq!(lock.len(), 1);
    }

    #[test]
    fn test_empty_name_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_NAME), "import:\n- version: v1.0.0\n").unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let sm = sm();
        let mut conv = Converter::new(&ctx, &sm);
        let err = import(&mut conv, tmp.path(), &"github.com/me/app".into()).unwrap_err();
        assert_eq!(err.to_string(), "invalid glide configuration: Name is required");
    }

    #[test]
    fn test_empty_lock_name_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_NAME), "package: github.com/me/app\n").unwrap();
        std::fs::write(tmp.path().join(LOCK_NAME), "imports:\n- version: abc\n").unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let sm = sm();
        let mut conv = Converter::new(&ctx, &sm);
        let err = import(&mut conv, tmp.path(), &"github.com/me/app".into()).unwrap_err();
        assert_eq!(err.to_string(), "invalid glide lock: Name is required");
    }
}
