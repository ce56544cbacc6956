//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to the object store. All
//! reachability walks, object lookups and the mirror bootstrap flow
//! through the [`Git`] struct, which returns strong types and normalizes
//! errors into typed failure categories.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Path is not a repository
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::ObjectNotFound`]: An id does not resolve to an object
//! - [`GitError::CloneFailed`] / [`GitError::FetchFailed`]: Bootstrap failures
//!
//! # Example
//!
//! ```ignore
//! use refnotify::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("/srv/mirrors/widgets.git"))?;
//! let tips = git.list_refs_by_prefix("refs/heads/")?;
//! let new = git.rev_list(&[tip], &[old])?;
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use thiserror::Error;

use crate::core::types::{Oid, RefName, TypeError};

/// Refspec fetched on every invocation so annotated tag lookups are current.
const TAGS_REFSPEC: &str = "+refs/tags/*:refs/tags/*";

/// Refspec a mirror uses so remote branches land under `refs/heads/`.
const MIRROR_HEADS_REFSPEC: &str = "+refs/heads/*:refs/heads/*";

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Path is not a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Object exists but has an unexpected type.
    #[error("object {oid} is a {actual}, expected {expected}")]
    WrongObjectType {
        oid: String,
        expected: &'static str,
        actual: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Cloning the mirror failed.
    #[error("failed to clone {url}: {message}")]
    CloneFailed { url: String, message: String },

    /// Fetching into the mirror failed.
    #[error("failed to fetch from {remote}: {message}")]
    FetchFailed { remote: String, message: String },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    fn internal(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) | TypeError::InvalidUpdate(msg) => {
                GitError::InvalidRefName { message: msg }
            }
        }
    }
}

/// Type of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Commit,
    Tree,
    Blob,
    Tag,
}

impl ObjectKind {
    fn from_git2(kind: git2::ObjectType) -> Option<Self> {
        match kind {
            git2::ObjectType::Commit => Some(ObjectKind::Commit),
            git2::ObjectType::Tree => Some(ObjectKind::Tree),
            git2::ObjectType::Blob => Some(ObjectKind::Blob),
            git2::ObjectType::Tag => Some(ObjectKind::Tag),
            git2::ObjectType::Any => None,
        }
    }

    /// Git's name for the type, as printed by `git cat-file -t`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Commit => "commit",
            ObjectKind::Tree => "tree",
            ObjectKind::Blob => "blob",
            ObjectKind::Tag => "tag",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ref with its name and the commit it peels to.
///
/// Used when enumerating refs in a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    /// The full ref name
    pub name: RefName,
    /// The commit the ref peels to
    pub oid: Oid,
}

/// A name, address and timestamp from a commit or tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
    /// Timestamp in the signer's own offset
    pub time: DateTime<FixedOffset>,
}

impl Identity {
    fn from_signature(sig: &git2::Signature<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
            email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
            time: signature_time(sig.when()),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Information about a commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// Parent OIDs, first parent first
    pub parents: Vec<Oid>,
    /// First line of the commit message
    pub summary: String,
    /// Full commit message
    pub message: String,
    /// Author identity and time
    pub author: Identity,
}

impl CommitInfo {
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Information about an annotated tag object.
#[derive(Debug, Clone)]
pub struct TagInfo {
    /// Tag name as recorded in the tag object
    pub name: String,
    /// The object the tag points at
    pub target: Oid,
    /// Type of the tagged object
    pub target_kind: ObjectKind,
    /// Tagger, absent for some very old tags
    pub tagger: Option<Identity>,
    /// Tag message
    pub message: String,
}

/// The Git interface.
///
/// This is the **single point of interaction** with the object store.
/// The repository is only ever written by [`Git::clone_mirror`] and
/// [`Git::fetch`]; everything else is a read.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Bootstrap
    // =========================================================================

    /// Open the repository at `path`.
    ///
    /// Both bare mirrors and repositories with a working tree are accepted;
    /// `path` must be the repository itself, not a subdirectory.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    /// Create a bare mirror of `url` at `path`.
    ///
    /// The `origin` remote maps remote branches straight onto
    /// `refs/heads/*` so every pushed branch is a local ref of the mirror,
    /// and `HEAD` follows the remote's default branch.
    ///
    /// # Errors
    ///
    /// - [`GitError::CloneFailed`] if the repository cannot be created or
    ///   the initial fetch fails
    pub fn clone_mirror(url: &str, path: &Path) -> Result<Self, GitError> {
        let clone_err = |e: git2::Error| GitError::CloneFailed {
            url: url.to_string(),
            message: e.message().to_string(),
        };

        let repo = git2::Repository::init_bare(path).map_err(clone_err)?;
        {
            let mut remote = repo
                .remote_with_fetch("origin", url, MIRROR_HEADS_REFSPEC)
                .map_err(clone_err)?;

            remote
                .connect(git2::Direction::Fetch)
                .map_err(clone_err)?;
            let default_branch = remote
                .default_branch()
                .ok()
                .and_then(|buf| buf.as_str().map(String::from));
            remote.disconnect().map_err(clone_err)?;

            remote
                .fetch(&[MIRROR_HEADS_REFSPEC, TAGS_REFSPEC], None, None)
                .map_err(clone_err)?;

            if let Some(branch) = default_branch {
                repo.set_head(&branch).map_err(clone_err)?;
            }
        }

        tracing::info!(url, path = %path.display(), "cloned mirror");
        Ok(Self { repo })
    }

    /// Fetch the remote's configured refspecs plus all tags.
    ///
    /// Refs deleted on the remote are pruned so they stop taking part in
    /// exclusion.
    ///
    /// # Errors
    ///
    /// - [`GitError::FetchFailed`] if the remote is missing or the fetch fails
    pub fn fetch(&self, remote_name: &str) -> Result<(), GitError> {
        let fetch_err = |e: git2::Error| GitError::FetchFailed {
            remote: remote_name.to_string(),
            message: e.message().to_string(),
        };

        let mut remote = self.repo.find_remote(remote_name).map_err(fetch_err)?;
        let mut options = git2::FetchOptions::new();
        options.prune(git2::FetchPrune::On);
        let mut refspecs: Vec<String> = remote
            .fetch_refspecs()
            .map_err(fetch_err)?
            .iter()
            .flatten()
            .map(String::from)
            .collect();
        if !refspecs.iter().any(|s| s == TAGS_REFSPEC) {
            refspecs.push(TAGS_REFSPEC.to_string());
        }

        remote
            .fetch(&refspecs, Some(&mut options), None)
            .map_err(fetch_err)?;
        tracing::debug!(remote = remote_name, ?refspecs, "fetched");
        Ok(())
    }

    /// Check whether a remote with this name is configured.
    pub fn has_remote(&self, name: &str) -> bool {
        self.repo.find_remote(name).is_ok()
    }

    /// Get direct access to the git directory path.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Best-effort project name derived from the repository path.
    ///
    /// `/srv/widgets.git` and `/src/widgets/.git` both yield `widgets`.
    pub fn default_project_name(&self) -> Option<String> {
        let base = match self.repo.workdir() {
            Some(workdir) => workdir,
            None => self.repo.path(),
        };
        let name = base.file_name()?.to_str()?;
        let name = name.strip_suffix(".git").unwrap_or(name);
        (!name.is_empty()).then(|| name.to_string())
    }

    // =========================================================================
    // Ref Resolution
    // =========================================================================

    /// Name of the branch `HEAD` points at, without `refs/heads/`.
    ///
    /// Returns `None` if `HEAD` is detached or not a branch.
    pub fn head_branch(&self) -> Option<String> {
        let head = self.repo.find_reference("HEAD").ok()?;
        let target = head.symbolic_target()?;
        target.strip_prefix(RefName::HEADS).map(String::from)
    }

    /// Resolve a ref to the commit it peels to.
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.repo.find_reference(refname) {
            Ok(reference) => {
                let commit = reference
                    .peel_to_commit()
                    .map_err(|e| GitError::from_git2(e, refname))?;
                Ok(Some(to_oid(commit.id())?))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    /// List all refs under a prefix, peeled to commits.
    ///
    /// Refs that do not peel to a commit (e.g. a tag of a tree) are skipped.
    pub fn list_refs_by_prefix(&self, prefix: &str) -> Result<Vec<RefEntry>, GitError> {
        let refs = self.repo.references().map_err(GitError::internal)?;

        let mut entries = Vec::new();
        for reference in refs {
            let reference = reference.map_err(GitError::internal)?;

            // Skip refs with non-UTF8 names
            let name = match reference.name() {
                Some(n) if n.starts_with(prefix) => n,
                _ => continue,
            };

            let ref_name = match RefName::new(name) {
                Ok(r) => r,
                Err(_) => continue,
            };

            let oid = match reference.peel_to_commit() {
                Ok(commit) => to_oid(commit.id())?,
                Err(_) => {
                    tracing::trace!(refname = name, "ref does not peel to a commit");
                    continue;
                }
            };

            entries.push(RefEntry {
                name: ref_name,
                oid,
            });
        }

        entries.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        Ok(entries)
    }

    // =========================================================================
    // Object Queries
    // =========================================================================

    /// Get the type of an object.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the id does not resolve
    pub fn object_kind(&self, oid: &Oid) -> Result<ObjectKind, GitError> {
        let (_, kind) = self.read_header(oid)?;
        Ok(kind)
    }

    /// Get the size of an object in bytes.
    pub fn object_size(&self, oid: &Oid) -> Result<usize, GitError> {
        let (size, _) = self.read_header(oid)?;
        Ok(size)
    }

    fn read_header(&self, oid: &Oid) -> Result<(usize, ObjectKind), GitError> {
        let odb = self.repo.odb().map_err(GitError::internal)?;
        let (size, kind) = odb
            .read_header(git_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        let kind = ObjectKind::from_git2(kind).ok_or_else(|| GitError::Internal {
            message: format!("object {} has no concrete type", oid),
        })?;
        Ok((size, kind))
    }

    /// Peel an object (commit or tag chain) to the commit it names.
    pub fn peel_to_commit(&self, oid: &Oid) -> Result<Oid, GitError> {
        let commit = self.find_commit_like(oid)?;
        to_oid(commit.id())
    }

    fn find_commit_like(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        let object = self
            .repo
            .find_object(git_oid(oid)?, None)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        let actual = object
            .kind()
            .map(|k| k.str().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        object
            .peel_to_commit()
            .map_err(|_| GitError::WrongObjectType {
                oid: oid.to_string(),
                expected: "commit",
                actual,
            })
    }

    // =========================================================================
    // Ancestry Queries
    // =========================================================================

    /// List commits reachable from any of `include` but from none of
    /// `exclude`, oldest first.
    ///
    /// Parents always precede their children in the result.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // Equivalent of `git rev-list --reverse --topo-order new ^old`
    /// let added = git.rev_list(&[new], &[old])?;
    /// ```
    pub fn rev_list(&self, include: &[Oid], exclude: &[Oid]) -> Result<Vec<Oid>, GitError> {
        let mut revwalk = self.repo.revwalk().map_err(GitError::internal)?;
        revwalk
            .set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)
            .map_err(GitError::internal)?;

        for oid in include {
            revwalk
                .push(git_oid(oid)?)
                .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        }
        for oid in exclude {
            revwalk
                .hide(git_oid(oid)?)
                .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid.map_err(GitError::internal)?;
            commits.push(to_oid(oid)?);
        }
        Ok(commits)
    }

    /// Find the merge base (common ancestor) of two commits.
    ///
    /// Returns `None` if there is no common ancestor. When several merge
    /// bases exist, libgit2's choice is taken as-is.
    pub fn merge_base(&self, oid1: &Oid, oid2: &Oid) -> Result<Option<Oid>, GitError> {
        match self.repo.merge_base(git_oid(oid1)?, git_oid(oid2)?) {
            Ok(oid) => Ok(Some(to_oid(oid)?)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::internal(e)),
        }
    }

    // =========================================================================
    // Commit and Tag Information
    // =========================================================================

    /// Get information about a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the commit doesn't exist
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self
            .repo
            .find_commit(git_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let parents = commit
            .parent_ids()
            .map(to_oid)
            .collect::<Result<Vec<_>, _>>()?;

        let message = String::from_utf8_lossy(commit.message_bytes()).into_owned();
        let author = commit.author();
        let info = CommitInfo {
            oid: oid.clone(),
            parents,
            summary: summary_line(&message),
            message,
            author: Identity::from_signature(&author),
        };
        Ok(info)
    }

    /// Get information about an annotated tag object.
    ///
    /// # Errors
    ///
    /// - [`GitError::WrongObjectType`] if `oid` is not a tag object
    pub fn tag_info(&self, oid: &Oid) -> Result<TagInfo, GitError> {
        let object = self
            .repo
            .find_object(git_oid(oid)?, None)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        let actual = object
            .kind()
            .map(|k| k.str().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let tag = object.into_tag().map_err(|_| GitError::WrongObjectType {
            oid: oid.to_string(),
            expected: "tag",
            actual,
        })?;

        let target_kind = tag
            .target_type()
            .and_then(ObjectKind::from_git2)
            .ok_or_else(|| GitError::Internal {
                message: format!("tag {} points at an object of unknown type", oid),
            })?;

        let tagger = tag.tagger();
        let info = TagInfo {
            name: String::from_utf8_lossy(tag.name_bytes()).into_owned(),
            target: to_oid(tag.target_id())?,
            target_kind,
            tagger: tagger.as_ref().map(Identity::from_signature),
            message: tag
                .message_bytes()
                .map(|m| String::from_utf8_lossy(m).into_owned())
                .unwrap_or_default(),
        };
        Ok(info)
    }

    /// Describe an object relative to the nearest annotated tag.
    ///
    /// Falls back to the abbreviated commit id when no tag is reachable,
    /// like `git describe --always`. Tag objects are peeled first; an
    /// object that peels to no commit (a tag of a tree or blob) is
    /// described by its own abbreviated id, since libgit2 cannot describe
    /// it.
    pub fn describe(&self, oid: &Oid) -> Result<String, GitError> {
        let commit = match self.find_commit_like(oid) {
            Ok(commit) => commit,
            Err(GitError::WrongObjectType { .. }) => {
                return Ok(oid.short(Oid::SHORT_LEN).to_string())
            }
            Err(e) => return Err(e),
        };

        let mut opts = git2::DescribeOptions::new();
        opts.show_commit_oid_as_fallback(true);

        let describe = commit.as_object().describe(&opts).map_err(GitError::internal)?;
        describe.format(None).map_err(GitError::internal)
    }

    /// Name of the nearest annotated tag reachable from the first parent
    /// of the commit `oid` peels to (`git describe --abbrev=0 <oid>^`).
    ///
    /// Returns `None` for root commits and when no tag is reachable.
    pub fn previous_tag(&self, oid: &Oid) -> Result<Option<String>, GitError> {
        let commit = self.find_commit_like(oid)?;
        let parent = match commit.parent(0) {
            Ok(parent) => parent,
            Err(_) => return Ok(None),
        };

        let describe = match parent.as_object().describe(&git2::DescribeOptions::new()) {
            Ok(d) => d,
            Err(e) => {
                tracing::trace!(commit = %parent.id(), error = e.message(), "no previous tag");
                return Ok(None);
            }
        };

        let mut format = git2::DescribeFormatOptions::new();
        format.abbreviated_size(0);
        describe
            .format(Some(&format))
            .map(Some)
            .map_err(GitError::internal)
    }

    // =========================================================================
    // Diffs
    // =========================================================================

    /// Render a `--stat --summary` style diffstat.
    ///
    /// With `from`, compares its tree against `to`'s tree. Without, compares
    /// `to` against its first parent, or the empty tree for a root commit.
    pub fn diffstat(&self, from: Option<&Oid>, to: &Oid) -> Result<String, GitError> {
        let to_commit = self.find_commit_like(to)?;
        let to_tree = to_commit.tree().map_err(GitError::internal)?;

        let from_tree = match from {
            Some(from) => Some(
                self.find_commit_like(from)?
                    .tree()
                    .map_err(GitError::internal)?,
            ),
            None => match to_commit.parent(0) {
                Ok(parent) => Some(parent.tree().map_err(GitError::internal)?),
                Err(_) => None,
            },
        };

        let diff = self
            .repo
            .diff_tree_to_tree(from_tree.as_ref(), Some(&to_tree), None)
            .map_err(GitError::internal)?;
        let stats = diff.stats().map_err(GitError::internal)?;
        let buf = stats
            .to_buf(
                git2::DiffStatsFormat::FULL | git2::DiffStatsFormat::INCLUDE_SUMMARY,
                72,
            )
            .map_err(GitError::internal)?;

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Convert a strong OID into a git2 OID.
fn git_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}

/// Convert a git2 OID into a strong OID.
fn to_oid(oid: git2::Oid) -> Result<Oid, GitError> {
    Oid::new(oid.to_string()).map_err(GitError::from)
}

/// First paragraph of a commit message joined onto one line, as
/// `git log --format=%s` shows it.
fn summary_line(message: &str) -> String {
    message
        .trim_start()
        .lines()
        .take_while(|line| !line.trim().is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert a git2 timestamp into a chrono datetime in its own offset.
fn signature_time(time: git2::Time) -> DateTime<FixedOffset> {
    let offset =
        FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(time.seconds(), 0)
        .unwrap_or_default()
        .with_timezone(&offset)
}
