//! engine
//!
//! The notification pipeline for reference updates.
//!
//! # Pipeline
//!
//! ```text
//! (old, new, ref) -> classify -> analyze (updates) -> resolve (branches)
//!                 -> render -> dispatch
//! ```
//!
//! 1. **Classify**: change kind from the zero sentinels, reference kind
//!    from the namespace and the representative object's type
//! 2. **Analyze**: fast-forward, rewind or rewind-and-replay
//! 3. **Resolve**: the commits no other reference has reported yet
//! 4. **Render**: subject and body, see [`crate::render`]
//! 5. **Dispatch**: hand the message to a [`crate::notify::Transport`]
//!
//! # Invariants
//!
//! - Each commit is listed by exactly one report across all branches
//! - The repository is never written during the pipeline
//! - Updates are processed sequentially in input order
//!
//! # Example
//!
//! ```ignore
//! use refnotify::engine::{Mode, Runner};
//!
//! let runner = Runner::new(&git, &config, &transport);
//! let summary = runner.run(&updates, Mode::Batch)?;
//! ```

pub mod bootstrap;
pub mod classify;
pub mod divergence;
pub mod novel;
pub mod runner;

pub use classify::{classify, Classification, Unsupported};
pub use divergence::{analyze, DivergenceReport};
pub use novel::{resolve, ExclusionPolicy, ResolveRequest};
pub use runner::{Mode, RunSummary, Runner};

use thiserror::Error;

use crate::git::GitError;
use crate::notify::TransportError;

/// Reasons a single update produced no notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The reference is not reported on.
    #[error("skipping {refname}: {reason}")]
    UnsupportedReference { refname: String, reason: Unsupported },

    /// Nobody is configured to receive the report.
    #[error("no recipients for {refname}: set '{key}'")]
    MissingRecipients { refname: String, key: &'static str },

    /// An id did not resolve or an ancestry query failed.
    #[error("cannot resolve objects for {refname}: {source}")]
    ObjectResolution {
        refname: String,
        #[source]
        source: GitError,
    },

    /// The transport refused the message.
    #[error("failed to deliver report for {refname}: {source}")]
    Transport {
        refname: String,
        #[source]
        source: TransportError,
    },
}

impl NotifyError {
    /// Whether this is routine traffic rather than a problem.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            NotifyError::UnsupportedReference {
                reason: Unsupported::TrackingBranch,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::ObjectKind;

    #[test]
    fn only_tracking_branches_are_expected() {
        let tracking = NotifyError::UnsupportedReference {
            refname: "refs/remotes/origin/main".to_string(),
            reason: Unsupported::TrackingBranch,
        };
        assert!(tracking.is_expected());
        assert_eq!(
            tracking.to_string(),
            "skipping refs/remotes/origin/main: tracking branches are not reported"
        );

        let anomaly = NotifyError::UnsupportedReference {
            refname: "refs/heads/odd".to_string(),
            reason: Unsupported::Anomaly(ObjectKind::Tree),
        };
        assert!(!anomaly.is_expected());

        let missing = NotifyError::MissingRecipients {
            refname: "refs/heads/main".to_string(),
            key: "recipients",
        };
        assert!(!missing.is_expected());
        assert_eq!(
            missing.to_string(),
            "no recipients for refs/heads/main: set 'recipients'"
        );
    }
}
