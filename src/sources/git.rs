//! Git source manager - bare mirrors of upstream repositories in the cache.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use git2::{BranchType, Repository};
use url::Url;

use crate::core::project::{ProjectIdentifier, ProjectRoot};
use crate::core::version::{Revision, UnpairedVersion, Version};
use crate::sources::deduce::deduce_root;
use crate::sources::source::{SourceError, SourceManager};
use crate::util::hash::sha256_str;
use crate::util::GlobalContext;

/// Source manager that mirrors projects with git.
pub struct GitSourceManager {
    cache_dir: PathBuf,
    offline: bool,
    /// Versions listed per mirror; cleared when the mirror is fetched again
    versions: Mutex<BTreeMap<PathBuf, Vec<Version>>>,
}

impl GitSourceManager {
    pub fn new(cache_dir: PathBuf, offline: bool) -> Self {
        GitSourceManager {
            cache_dir,
            offline,
            versions: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn from_context(ctx: &GlobalContext) -> Self {
        Self::new(ctx.source_cache_dir(), ctx.is_offline())
    }

    /// Mirror directory for a project.
    pub fn mirror_path(&self, id: &ProjectIdentifier) -> PathBuf {
        let url = remote_url(id);
        let dir_name = match Url::parse(&url) {
            Ok(parsed) => format!("{}-{}", sanitize_url_for_path(&parsed), &sha256_str(&url)[..8]),
            Err(_) => sha256_str(&url),
        };
        self.cache_dir.join("git").join(dir_name)
    }

    fn clone_mirror(&self, url: &str, path: &Path, id: &ProjectIdentifier) -> Result<(), SourceError> {
        tracing::info!("Cloning {}", url);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SourceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        git2::build::RepoBuilder::new()
            .bare(true)
            .clone(url, path)
            .map_err(|source| git_err(id, source))?;

        Ok(())
    }

    fn fetch_mirror(&self, path: &Path, id: &ProjectIdentifier) -> Result<(), SourceError> {
        tracing::info!("Updating {}", id);

        let repo = Repository::open_bare(path).map_err(|source| git_err(id, source))?;
        let mut remote = repo
            .find_remote("origin")
            .map_err(|source| git_err(id, source))?;
        remote
            .fetch(
                &[
                    "+refs/heads/*:refs/remotes/origin/*",
                    "+refs/tags/*:refs/tags/*",
                ],
                None,
                None,
            )
            .map_err(|source| git_err(id, source))?;

        Ok(())
    }

    fn read_versions(&self, path: &Path, id: &ProjectIdentifier) -> Result<Vec<Version>, SourceError> {
        let repo = Repository::open_bare(path).map_err(|source| git_err(id, source))?;
        let default_branch = repo
            .head()
            .ok()
            .and_then(|h| h.shorthand().map(String::from));

        let mut versions = Vec::new();

        let tags = repo.tag_names(None).map_err(|source| git_err(id, source))?;
        for name in tags.iter().flatten() {
            let commit = repo
                .find_reference(&format!("refs/tags/{}", name))
                .and_then(|r| r.peel_to_commit());
            match commit {
                Ok(commit) => versions.push(
                    UnpairedVersion::from_tag(name).pair(Revision::new(commit.id().to_string())),
                ),
                Err(e) => tracing::debug!("skipping tag {} of {}: {}", name, id, e.message()),
            }
        }

        let mut branches: BTreeMap<String, Revision> = BTreeMap::new();
        for kind in [BranchType::Local, BranchType::Remote] {
            let iter = repo.branches(Some(kind)).map_err(|source| git_err(id, source))?;
            for entry in iter {
                let (branch, _) = entry.map_err(|source| git_err(id, source))?;
                let Ok(Some(name)) = branch.name() else {
                    continue;
                };
                let name = match kind {
                    BranchType::Remote => match name.strip_prefix("origin/") {
                        Some("HEAD") | None => continue,
                        Some(short) => short.to_string(),
                    },
                    BranchType::Local => name.to_string(),
                };
                if let Ok(commit) = branch.get().peel_to_commit() {
                    branches
                        .entry(name)
                        .or_insert_with(|| Revision::new(commit.id().to_string()));
                }
            }
        }

        for (name, rev) in branches {
            let unpaired = if default_branch.as_deref() == Some(name.as_str()) {
                UnpairedVersion::default_branch(name)
            } else {
                UnpairedVersion::branch(name)
            };
            versions.push(unpaired.pair(rev));
        }

        Ok(versions)
    }
}

impl SourceManager for GitSourceManager {
    fn deduce_project_root(&self, import_path: &str) -> Result<ProjectRoot, SourceError> {
        deduce_root(import_path)
    }

    fn list_versions(&self, id: &ProjectIdentifier) -> Result<Vec<Version>, SourceError> {
        let path = self.mirror_path(id);

        if let Ok(cache) = self.versions.lock() {
            if let Some(versions) = cache.get(&path) {
                return Ok(versions.clone());
            }
        }

        if !path.exists() {
            self.sync_source_for(id)?;
            if !path.exists() {
                return Err(SourceError::Offline {
                    project: id.to_string(),
                });
            }
        }

        let versions = self.read_versions(&path, id)?;
        if let Ok(mut cache) = self.versions.lock() {
            cache.insert(path, versions.clone());
        }
        Ok(versions)
    }

    fn sync_source_for(&self, id: &ProjectIdentifier) -> Result<(), SourceError> {
        if self.offline {
            tracing::debug!("offline; not syncing {}", id);
            return Ok(());
        }

        let path = self.mirror_path(id);
        if path.exists() {
            self.fetch_mirror(&path, id)?;
        } else {
            self.clone_mirror(&remote_url(id), &path, id)?;
        }

        if let Ok(mut cache) = self.versions.lock() {
            cache.remove(&path);
        }
        Ok(())
    }
}

fn git_err(id: &ProjectIdentifier, source: git2::Error) -> SourceError {
    SourceError::Git {
        project: id.to_string(),
        source,
    }
}

/// Remote URL for a project: its explicit source, or `https://<root>`.
pub fn remote_url(id: &ProjectIdentifier) -> String {
    let source = id.normalized_source();
    if source.contains("://") || source.starts_with("git@") {
        source.to_string()
    } else {
        format!("https://{}", source)
    }
}

/// Sanitize a URL for use as a directory name.
fn sanitize_url_for_path(url: &Url) -> String {
    let mut name = String::new();

    if let Some(host) = url.host_str() {
        name.push_str(host);
    }

    let path = url.path().trim_matches('/');
    if !path.is_empty() {
        name.push('-');
        name.push_str(&path.replace('/', "-"));
    }

    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}
