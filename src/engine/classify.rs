//! engine::classify
//!
//! Decide what sort of change an update is and which reference kind it
//! touched.
//!
//! # Rules
//!
//! | Namespace        | Object | Kind                          |
//! |------------------|--------|-------------------------------|
//! | `refs/tags/`     | commit | [`RefKind::Tag`]              |
//! | `refs/tags/`     | tag    | [`RefKind::AnnotatedTag`]     |
//! | `refs/heads/`    | commit | [`RefKind::Branch`]           |
//! | `refs/remotes/`  | commit | tracking branch, rejected     |
//! | anything else    | commit or tag | [`RefKind::Other`]     |
//!
//! Every other combination (a tree under `refs/heads/`, a blob tag) is an
//! anomaly and is rejected as well.

use crate::core::types::{ChangeKind, Oid, RefKind, RefName, RefUpdate};
use crate::git::{Git, ObjectKind};

use super::NotifyError;

/// The outcome of classifying one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub change: ChangeKind,
    pub kind: RefKind,
    /// `new` for creates and updates, `old` for deletes
    pub representative: Oid,
    pub representative_type: ObjectKind,
}

/// Why a reference cannot be reported on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    /// A remote-tracking branch. Expected traffic, never reported.
    TrackingBranch,
    /// A namespace/object pairing that should not occur.
    Anomaly(ObjectKind),
}

/// Classify a reference update.
///
/// # Errors
///
/// - [`NotifyError::ObjectResolution`] if the representative object is missing
/// - [`NotifyError::UnsupportedReference`] for tracking branches and anomalies
pub fn classify(git: &Git, update: &RefUpdate) -> Result<Classification, NotifyError> {
    let change = update.change_kind();
    let representative = update.representative().clone();

    let representative_type =
        git.object_kind(&representative)
            .map_err(|source| NotifyError::ObjectResolution {
                refname: update.refname.to_string(),
                source,
            })?;

    let kind = ref_kind(&update.refname, representative_type).map_err(|reason| {
        NotifyError::UnsupportedReference {
            refname: update.refname.to_string(),
            reason,
        }
    })?;

    tracing::debug!(
        refname = %update.refname,
        change = %change,
        kind = %kind,
        object = %representative_type,
        "classified update"
    );

    Ok(Classification {
        change,
        kind,
        representative,
        representative_type,
    })
}

/// Derive the reference kind from the name prefix and object type.
pub fn ref_kind(refname: &RefName, object: ObjectKind) -> Result<RefKind, Unsupported> {
    if refname.is_tag_ref() {
        match object {
            ObjectKind::Commit => Ok(RefKind::Tag),
            ObjectKind::Tag => Ok(RefKind::AnnotatedTag),
            other => Err(Unsupported::Anomaly(other)),
        }
    } else if refname.is_branch_ref() {
        match object {
            ObjectKind::Commit => Ok(RefKind::Branch),
            other => Err(Unsupported::Anomaly(other)),
        }
    } else if refname.is_remote_ref() {
        match object {
            ObjectKind::Commit => Err(Unsupported::TrackingBranch),
            other => Err(Unsupported::Anomaly(other)),
        }
    } else {
        match object {
            ObjectKind::Commit | ObjectKind::Tag => Ok(RefKind::Other),
            other => Err(Unsupported::Anomaly(other)),
        }
    }
}

impl std::fmt::Display for Unsupported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unsupported::TrackingBranch => f.write_str("tracking branches are not reported"),
            Unsupported::Anomaly(kind) => write!(f, "unexpected {} object", kind),
        }
    }
}
