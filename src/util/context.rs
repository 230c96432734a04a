//! Global context for Wharf operations.
//!
//! Provides centralized access to configuration, paths, and the output shell.
//! Every component that logs feedback or needs workspace locations takes a
//! `&GlobalContext`; there is no ambient global state.
//!
//! ## Search roots
//!
//! Dependencies already checked out on disk are looked up under
//! `<search root>/src/<import path>`. Search roots come from, in order:
//! 1. `WHARF_PATH` (colon separated)
//! 2. `[workspace] paths` in the configuration
//! 3. `GOPATH`
//! 4. `~/go`

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};

use crate::core::manifest::MANIFEST_NAME;
use crate::util::config::{self, Config};
use crate::util::shell::Shell;

/// Environment variable overriding the search roots.
pub const SEARCH_PATH_ENV: &str = "WHARF_PATH";

/// Project directories for Wharf
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("com", "wharf", "wharf"));

/// Global context containing configuration, paths and the output shell.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global Wharf data
    home: PathBuf,

    /// Workspace search roots
    search_paths: Vec<PathBuf>,

    /// Merged configuration
    config: Config,

    /// User-facing output
    shell: Shell,
}

impl GlobalContext {
    /// Create a new GlobalContext from the process environment.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext rooted at a specific working directory.
    ///
    /// Configuration is loaded from the global and project locations.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let home = if let Some(dirs) = PROJECT_DIRS.as_ref() {
            dirs.cache_dir().to_path_buf()
        } else {
            BaseDirs::new()
                .map(|b| b.home_dir().join(".wharf"))
                .unwrap_or_else(|| PathBuf::from(".wharf"))
        };

        let global = config::global_config_path();
        let config = config::load_config(global.as_deref(), &config::project_config_path(&cwd));
        let search_paths = search_paths_from_env(&config);

        GlobalContext {
            cwd,
            home,
            search_paths,
            config,
            shell: Shell::default(),
        }
    }

    /// Replace the shell.
    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    /// Replace the search roots.
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Force offline mode.
    pub fn set_offline(&mut self, offline: bool) {
        self.config.net.offline = offline;
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the Wharf home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the source cache directory used by the git source manager.
    pub fn source_cache_dir(&self) -> PathBuf {
        self.config
            .sources
            .cache_dir
            .clone()
            .unwrap_or_else(|| self.home.join("sources"))
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn is_offline(&self) -> bool {
        self.config.net.offline
    }

    /// Find the project directory: the closest ancestor of the working
    /// directory holding a `Wharf.toml`.
    pub fn find_project_root(&self) -> Option<PathBuf> {
        let mut current = self.cwd.clone();
        loop {
            if current.join(MANIFEST_NAME).is_file() {
                return Some(current);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Compute the import path of a directory from the search roots.
    ///
    /// Returns `None` when the directory is not below any `<root>/src`.
    pub fn import_path_for_dir(&self, dir: &Path) -> Option<String> {
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        self.search_paths.iter().find_map(|root| {
            let src = root.join("src");
            let src = src.canonicalize().unwrap_or(src);
            let rel = dir.strip_prefix(&src).ok()?;
            let ip = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (!ip.is_empty()).then_some(ip)
        })
    }
}

fn search_paths_from_env(config: &Config) -> Vec<PathBuf> {
    if let Ok(value) = std::env::var(SEARCH_PATH_ENV) {
        let paths: Vec<_> = std::env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if !paths.is_empty() {
            return paths;
        }
    }

    if !config.workspace.paths.is_empty() {
        return config.workspace.paths.clone();
    }

    if let Ok(value) = std::env::var("GOPATH") {
        let paths: Vec<_> = std::env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if !paths.is_empty() {
            return paths;
        }
    }

    BaseDirs::new()
        .map(|b| vec![b.home_dir().join("go")])
        .unwrap_or_default()
}
