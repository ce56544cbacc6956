//! engine::divergence
//!
//! Fast-forward versus rewind analysis for branch updates.
//!
//! ```text
//! fast-forward      * -- O -- N -- N
//! rewind only       * -- N -- O -- O
//! rewind + replay   * -- B -- O -- O
//!                          \
//!                           N -- N
//! ```

use crate::core::types::Oid;
use crate::git::{Git, GitError};

/// How the new tip relates to the old one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivergenceReport {
    pub is_fast_forward: bool,
    /// Commits reachable from old but not new, oldest first
    pub discarded: Vec<Oid>,
    /// Commits reachable from new but not old, oldest first. May include
    /// commits already reported through another reference.
    pub introduced: Vec<Oid>,
    /// `old` for fast-forwards, otherwise the merge base. `None` when the
    /// histories are unrelated.
    pub common_ancestor: Option<Oid>,
    /// The update only dropped history: the new tip is an ancestor of the
    /// old one.
    pub rewind_only: bool,
}

/// Analyze an update of a branch from `old` to `new`.
pub fn analyze(git: &Git, old: &Oid, new: &Oid) -> Result<DivergenceReport, GitError> {
    let discarded = git.rev_list(std::slice::from_ref(old), std::slice::from_ref(new))?;
    let introduced = git.rev_list(std::slice::from_ref(new), std::slice::from_ref(old))?;

    if discarded.is_empty() {
        return Ok(DivergenceReport {
            is_fast_forward: true,
            discarded,
            introduced,
            common_ancestor: Some(old.clone()),
            rewind_only: false,
        });
    }

    let common_ancestor = git.merge_base(old, new)?;
    let rewind_only = common_ancestor.as_ref() == Some(new);

    tracing::debug!(
        discarded = discarded.len(),
        introduced = introduced.len(),
        base = ?common_ancestor.as_ref().map(|o| o.short(Oid::SHORT_LEN).to_string()),
        rewind_only,
        "non-fast-forward update"
    );

    Ok(DivergenceReport {
        is_fast_forward: false,
        discarded,
        introduced,
        common_ancestor,
        rewind_only,
    })
}
