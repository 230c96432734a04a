//! Manifest and lock derivation for checked-out dependencies.

use std::path::Path;

use anyhow::Result;

use crate::core::lock::{Lock, LOCKFILE_NAME};
use crate::core::manifest::{Manifest, MANIFEST_NAME};
use crate::core::project::ProjectRoot;
use crate::importers::import_legacy;
use crate::resolver::ProjectAnalyzer;
use crate::sources::source::SourceManager;
use crate::util::GlobalContext;

/// Reads a dependency's own Wharf files, falling back to its legacy tool
/// configuration.
pub struct RootAnalyzer<'a> {
    ctx: &'a GlobalContext,
    sm: &'a dyn SourceManager,
}

impl<'a> RootAnalyzer<'a> {
    pub fn new(ctx: &'a GlobalContext, sm: &'a dyn SourceManager) -> Self {
        RootAnalyzer { ctx, sm }
    }
}

impl ProjectAnalyzer for RootAnalyzer<'_> {
    fn info(&self) -> (&'static str, u32) {
        ("wharf", 1)
    }

    fn derive_manifest_and_lock(
        &self,
        dir: &Path,
        root: &ProjectRoot,
    ) -> Result<Option<(Manifest, Lock)>> {
        let manifest_path = dir.join(MANIFEST_NAME);
        if manifest_path.is_file() {
            let manifest = Manifest::load(&manifest_path)?;
            let lock_path = dir.join(LOCKFILE_NAME);
            let lock = if lock_path.is_file() {
                Lock::load(&lock_path)?
            } else {
                Lock::new()
            };
            return Ok(Some((manifest, lock)));
        }

        tracing::debug!("no {} in {}, trying legacy tools", MANIFEST_NAME, dir.display());
        Ok(import_legacy(self.ctx, self.sm, dir, root)?)
    }
}
