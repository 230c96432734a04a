//! Configuration file support for Wharf.
//!
//! Wharf reads two configuration files:
//! - Global: `~/.wharf/config.toml` - User-wide defaults
//! - Project: `.wharf/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Wharf configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace search roots
    pub workspace: WorkspaceConfig,

    /// Network settings
    pub net: NetConfig,

    /// Legacy tool import settings
    pub import: ImportConfig,

    /// Source cache settings
    pub sources: SourcesConfig,
}

/// Where on-disk dependency checkouts are searched for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Search roots; each contains a `src/` tree laid out by import path.
    pub paths: Vec<PathBuf>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Never touch the network: syncs are skipped, version lists come
    /// from the local cache only.
    pub offline: bool,
}

/// Which legacy converters run during `wharf init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Converter names: glide, godep, govend, govendor
    pub enabled: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            enabled: ["glide", "godep", "govend", "govendor"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Source cache configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Override for the source cache directory
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
            Self::default()
        })
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if !other.workspace.paths.is_empty() {
            self.workspace.paths = other.workspace.paths;
        }
        if other.net.offline {
            self.net.offline = true;
        }
        if other.import != ImportConfig::default() {
            self.import = other.import;
        }
        if other.sources.cache_dir.is_some() {
            self.sources.cache_dir = other.sources.cache_dir;
        }
    }

    /// Check whether a named converter is enabled.
    pub fn import_enabled(&self, name: &str) -> bool {
        self.import.enabled.iter().any(|n| n == name)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.wharf/config.toml)
/// 2. Global config (~/.wharf/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));
    config
}

/// Get the global wharf config directory (~/.wharf).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".wharf"))
}

/// Get the global config path (~/.wharf/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.wharf/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".wharf").join("config.toml")
}
