//! render::general
//!
//! Templates for lightweight tags and references outside the well-known
//! namespaces. These mark a point rather than announce a release, so the
//! report just shows what the reference points at.

use crate::git::{GitError, ObjectKind};

use super::{commit, deletion, disposition, typed_id, ReportContext, LOG_BEGIN, LOG_END};

/// A new lightweight tag or other reference.
pub fn created(ctx: &ReportContext<'_>) -> Result<String, GitError> {
    let mut out = String::new();
    disposition(&mut out, "at", &typed_id(ctx.git, &ctx.update.new)?);
    out.push_str(&target(ctx)?);
    Ok(out)
}

/// A moved lightweight tag or other reference.
pub fn updated(ctx: &ReportContext<'_>) -> Result<String, GitError> {
    let mut out = String::new();
    disposition(&mut out, "to", &typed_id(ctx.git, &ctx.update.new)?);
    disposition(&mut out, "from", ctx.update.old.as_str());
    out.push_str(&target(ctx)?);
    Ok(out)
}

/// A removed lightweight tag or other reference.
pub fn deleted(ctx: &ReportContext<'_>) -> Result<String, GitError> {
    deletion(ctx)
}

fn target(ctx: &ReportContext<'_>) -> Result<String, GitError> {
    let new = &ctx.update.new;
    let mut out = String::from("\n");

    match ctx.classification.representative_type {
        ObjectKind::Commit => {
            let info = ctx.git.commit_info(new)?;
            out.push_str(LOG_BEGIN);
            out.push('\n');
            out.push_str(&commit::block(&info, ctx.meta));
            out.push_str(LOG_END);
            out.push('\n');
        }
        kind => {
            let size = ctx.git.object_size(new)?;
            out.push_str(&format!("{} is a {}, and is {} bytes long.\n", new, kind, size));
        }
    }
    Ok(out)
}
