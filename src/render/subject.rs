//! render::subject
//!
//! Subject line composition.
//!
//! - A branch push that introduces exactly one commit is titled by that
//!   commit's summary line.
//! - A branch update that introduces several states the count.
//! - Deletions name the id the reference used to have.
//! - Everything else states the reference kind and the disposition,
//!   followed by a `git describe` of the new object.

use crate::core::types::{ChangeKind, Oid, RefKind};
use crate::git::GitError;

use super::{describe_or_short, ReportContext};

/// Compose the full subject, prefix included.
pub fn compose(ctx: &ReportContext<'_>) -> Result<String, GitError> {
    let kind = ctx.classification.kind;
    let change = ctx.classification.change;
    let name = ctx.short_refname();
    let is_branch = matches!(kind, RefKind::Branch | RefKind::TrackingBranch);

    let text = match (change, ctx.novel) {
        (ChangeKind::Delete, _) => {
            format!(
                "{} {} deleted. was {}",
                kind,
                name,
                ctx.update.old.short(Oid::SHORT_LEN)
            )
        }
        (_, [only]) if is_branch => ctx.git.commit_info(only)?.summary,
        (ChangeKind::Update, novel) if is_branch && novel.len() > 1 => format!(
            "{} {} {} revs updated. {}",
            kind,
            name,
            novel.len(),
            describe_or_short(ctx.git, &ctx.update.new)
        ),
        _ => format!(
            "{} {} {}. {}",
            kind,
            name,
            change.past_tense(),
            describe_or_short(ctx.git, &ctx.classification.representative)
        ),
    };

    Ok(format!("{}{}", ctx.meta.subject_prefix, text))
}
