//! engine::novel
//!
//! Compute the commits an update introduces to the repository as a whole.
//!
//! A commit is reported by exactly one update: the first one that makes it
//! reachable. Everything already reachable from some *other* reference in
//! the exclusion namespaces was reported when that reference moved, so it
//! is subtracted from the update's range.
//!
//! # Algorithm
//!
//! ```text
//! range     = ancestors(new) - ancestors(base)
//! exclusion = ancestors(every other ref in the exclusion namespaces)
//!           + ancestors(primary branch)
//! novel     = range - exclusion        (oldest first)
//! ```
//!
//! `base` is nothing for a creation, `old` for a fast-forward and the
//! merge base for a rewind. A rewind that only dropped history has no
//! novel commits and the walk is skipped.
//!
//! The ref snapshot is read fresh on every call, so within one batch an
//! update processed earlier is already visible to later ones. Refs whose
//! updates come later in the same batch are taken at their old value;
//! otherwise two refs pushed to the same new commit would each subtract
//! the other and neither would report it.

use std::collections::HashSet;

use crate::core::types::{ChangeKind, Oid, RefName, RefUpdate};
use crate::git::{Git, GitError};

use super::divergence::DivergenceReport;
use super::NotifyError;

/// Which references contribute to exclusion sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionPolicy {
    /// Ref prefixes whose refs are subtracted, each ending in `/`
    pub namespaces: Vec<String>,
    /// Always subtracted from other refs' ranges, wherever it lives
    pub primary: Option<RefName>,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self {
            namespaces: vec![RefName::HEADS.to_string()],
            primary: None,
        }
    }
}

/// Input to [`resolve`].
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub update: &'a RefUpdate,
    /// Required for updates; ignored otherwise
    pub divergence: Option<&'a DivergenceReport>,
    pub policy: &'a ExclusionPolicy,
    /// Updates still waiting their turn in the same batch
    pub pending: &'a [RefUpdate],
}

/// Resolve the novel commits of an update, oldest first.
///
/// Deletions never introduce commits.
///
/// # Errors
///
/// - [`NotifyError::ObjectResolution`] if an id cannot be resolved or a
///   walk fails
pub fn resolve(git: &Git, request: &ResolveRequest<'_>) -> Result<Vec<Oid>, NotifyError> {
    let update = request.update;
    let resolution = |source: GitError| NotifyError::ObjectResolution {
        refname: update.refname.to_string(),
        source,
    };

    let base = match update.change_kind() {
        ChangeKind::Delete => return Ok(Vec::new()),
        ChangeKind::Create => {
            if request.policy.primary.as_ref() == Some(&update.refname) {
                tracing::debug!(refname = %update.refname, "primary branch created, reporting full history");
                return git
                    .rev_list(std::slice::from_ref(&update.new), &[])
                    .map_err(resolution);
            }
            None
        }
        ChangeKind::Update => match request.divergence {
            Some(report) if report.rewind_only => return Ok(Vec::new()),
            Some(report) if report.is_fast_forward => Some(update.old.clone()),
            Some(report) => report.common_ancestor.clone(),
            None => Some(update.old.clone()),
        },
    };

    let mut hidden = exclusion_set(git, &update.refname, request.policy, request.pending)
        .map_err(resolution)?;
    if let Some(base) = base {
        if !hidden.contains(&base) {
            hidden.push(base);
        }
    }

    let novel = git
        .rev_list(std::slice::from_ref(&update.new), &hidden)
        .map_err(resolution)?;

    tracing::debug!(
        refname = %update.refname,
        excluded_tips = hidden.len(),
        novel = novel.len(),
        "resolved novel commits"
    );
    Ok(novel)
}

/// Tips of every reference except `current` that contributes to exclusion.
///
/// The current reference is matched by exact name, so `refs/heads/x` does
/// not shield `refs/heads/x/y` or vice versa. A reference named in
/// `pending` contributes the commit its pending update moves it from, or
/// nothing when that update creates it.
pub fn exclusion_set(
    git: &Git,
    current: &RefName,
    policy: &ExclusionPolicy,
    pending: &[RefUpdate],
) -> Result<Vec<Oid>, GitError> {
    let mut seen_refs = HashSet::new();
    let mut tips = Vec::new();

    for namespace in &policy.namespaces {
        for entry in git.list_refs_by_prefix(namespace)? {
            if &entry.name == current || !seen_refs.insert(entry.name.clone()) {
                continue;
            }
            if let Some(tip) = pre_batch_tip(git, &entry.name, Some(entry.oid), pending)? {
                push_tip(&mut tips, tip);
            }
        }
    }

    if let Some(primary) = &policy.primary {
        if primary != current && !seen_refs.contains(primary) {
            let live = git.try_resolve_ref(primary.as_str())?;
            if let Some(tip) = pre_batch_tip(git, primary, live, pending)? {
                push_tip(&mut tips, tip);
            }
        }
    }

    Ok(tips)
}

/// The tip `name` had before the batch, if a pending update moves it.
fn pre_batch_tip(
    git: &Git,
    name: &RefName,
    live: Option<Oid>,
    pending: &[RefUpdate],
) -> Result<Option<Oid>, GitError> {
    let Some(update) = pending.iter().find(|u| &u.refname == name) else {
        return Ok(live);
    };
    if update.old.is_zero() {
        return Ok(None);
    }
    // the old value may be a tag object; exclusion needs its commit
    match git.peel_to_commit(&update.old) {
        Ok(commit) => Ok(Some(commit)),
        Err(e) => {
            tracing::debug!(refname = %name, error = %e, "pending ref has no old commit");
            Ok(None)
        }
    }
}

fn push_tip(tips: &mut Vec<Oid>, tip: Oid) {
    if !tips.contains(&tip) {
        tips.push(tip);
    }
}
