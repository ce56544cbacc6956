//! render::tag
//!
//! Annotated tag templates.
//!
//! An annotated tag of a commit is treated as a release: the report names
//! the tag it replaces and summarizes the changes since then by author.

use std::fmt::Write as _;

use crate::core::types::{Oid, RefName};
use crate::git::{Git, GitError, ObjectKind, TagInfo};

use super::commit::{self, GIT_DATE_FORMAT};
use super::{deletion, disposition, typed_id, ReportContext, LOG_BEGIN, LOG_END};

/// A new annotated tag.
pub fn created(ctx: &ReportContext<'_>) -> Result<String, GitError> {
    let mut out = String::new();
    disposition(&mut out, "at", &typed_id(ctx.git, &ctx.update.new)?);
    out.push_str(&annotation(ctx.git, &ctx.update.new)?);
    Ok(out)
}

/// An annotated tag moved to a different tag object.
pub fn updated(ctx: &ReportContext<'_>) -> Result<String, GitError> {
    let mut out = String::new();
    disposition(&mut out, "to", &typed_id(ctx.git, &ctx.update.new)?);
    disposition(
        &mut out,
        "from",
        &format!("{} (which is now obsolete)", ctx.update.old),
    );
    out.push_str(&annotation(ctx.git, &ctx.update.new)?);
    Ok(out)
}

/// A removed annotated tag.
pub fn deleted(ctx: &ReportContext<'_>) -> Result<String, GitError> {
    deletion(ctx)
}

/// What the tag object says, followed by the release shortlog.
fn annotation(git: &Git, tag_oid: &Oid) -> Result<String, GitError> {
    let tag = git.tag_info(tag_oid)?;
    let mut out = String::new();

    disposition(
        &mut out,
        "tagging",
        &format!("{} ({})", tag.target, tag.target_kind),
    );

    let previous = match tag.target_kind {
        ObjectKind::Commit => {
            let previous = git.previous_tag(tag_oid)?;
            if let Some(name) = &previous {
                disposition(&mut out, "replaces", name);
            }
            previous
        }
        _ => {
            let size = git.object_size(&tag.target)?;
            disposition(&mut out, "length", &format!("{} bytes", size));
            None
        }
    };

    if let Some(tagger) = &tag.tagger {
        disposition(&mut out, "tagged by", &tagger.to_string());
        disposition(&mut out, "on", &tagger.time.format(GIT_DATE_FORMAT).to_string());
    }

    out.push('\n');
    out.push_str(LOG_BEGIN);
    out.push('\n');
    let message = tag.message.trim_end();
    if !message.is_empty() {
        let _ = writeln!(out, "{}", message);
    }
    out.push('\n');

    if tag.target_kind == ObjectKind::Commit {
        out.push_str(&release_shortlog(git, &tag, previous.as_deref())?);
    }

    out.push_str(LOG_END);
    out.push('\n');
    Ok(out)
}

/// Shortlog of `previous..tag`, or of the whole history without a
/// previous tag.
fn release_shortlog(git: &Git, tag: &TagInfo, previous: Option<&str>) -> Result<String, GitError> {
    let mut hidden = Vec::new();
    if let Some(name) = previous {
        let refname = RefName::new(format!("{}{}", RefName::TAGS, name))?;
        if let Some(commit) = git.try_resolve_ref(refname.as_str())? {
            hidden.push(commit);
        }
    }

    let commits = git.rev_list(std::slice::from_ref(&tag.target), &hidden)?;
    let infos = commits
        .iter()
        .map(|oid| git.commit_info(oid))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(commit::shortlog(&infos))
}
