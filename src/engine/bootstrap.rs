//! engine::bootstrap
//!
//! Make sure a current mirror exists before any update is classified.
//!
//! A missing mirror is cloned from the clone source. An existing one is
//! fetched from `origin` (heads per its refspecs, plus all tags) unless
//! fetching is disabled. A repository without an `origin` remote is used
//! as it is, which is the case when running as a hook inside the pushed
//! repository itself.
//!
//! Failures here are fatal: nothing can be classified without the mirror.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::git::{Git, GitError};

/// Remote fetched on every invocation.
pub const ORIGIN: &str = "origin";

/// Errors from preparing the mirror.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("repository '{path}' does not exist and no clone source is configured")]
    NoCloneSource { path: PathBuf },

    #[error(transparent)]
    Git(#[from] GitError),
}

/// How to obtain the mirror.
#[derive(Debug, Clone, Copy)]
pub struct MirrorOptions<'a> {
    pub path: &'a Path,
    pub clone_url: Option<&'a str>,
    pub fetch: bool,
}

/// Open, clone or refresh the mirror at `options.path`.
pub fn prepare_mirror(options: &MirrorOptions<'_>) -> Result<Git, BootstrapError> {
    if !options.path.exists() {
        let url = options.clone_url.ok_or_else(|| BootstrapError::NoCloneSource {
            path: options.path.to_path_buf(),
        })?;
        return Ok(Git::clone_mirror(url, options.path)?);
    }

    let git = Git::open(options.path)?;
    if !options.fetch {
        tracing::debug!("fetch disabled");
    } else if git.has_remote(ORIGIN) {
        git.fetch(ORIGIN)?;
    } else {
        tracing::debug!(path = %options.path.display(), "no origin remote, using repository as is");
    }
    Ok(git)
}
