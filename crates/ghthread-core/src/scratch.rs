// SPDX-License-Identifier: Apache-2.0

//! Per-thread scratch directory for downloaded images.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::Result;
use crate::github::ResourceRef;

/// Returns an empty directory `<base>/<owner>-<repo>-<number>`.
///
/// Content left by an earlier run for the same thread is removed.
///
/// # Errors
///
/// Returns `ThreadError::Io` if the directory cannot be cleared or created.
pub fn prepare_scratch_dir(base: &Path, resource: &ResourceRef) -> Result<PathBuf> {
    let dir = base.join(format!(
        "{}-{}-{}",
        resource.owner, resource.repo, resource.number
    ));

    if dir.exists() {
        debug!(dir = %dir.display(), "Clearing stale scratch directory");
        std::fs::remove_dir_all(&dir)?;
    }
    std::fs::create_dir_all(&dir)?;

    Ok(dir)
}
