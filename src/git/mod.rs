//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to the object store. Reachability
//! walks, object lookups and the mirror bootstrap all flow through
//! [`Git`]. No other module should import `git2`.
//!
//! # Responsibilities
//!
//! - Opening a mirror, or cloning one and fetching into it
//! - Ref enumeration by namespace
//! - Object metadata (type, size, tag contents, commit contents)
//! - Ancestry queries (rev-list, merge-base, describe)
//! - Diffstat rendering
//!
//! # Invariants
//!
//! - Apart from clone and fetch, the repository is only read
//! - All operations return strong types (Oid, RefName)

mod interface;

pub use interface::{CommitInfo, Git, GitError, Identity, ObjectKind, RefEntry, TagInfo};
