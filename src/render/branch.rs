//! render::branch
//!
//! Branch templates. Branch reports carry the novel commit log and the
//! diffstat; updates additionally explain how the new tip relates to the
//! old one.

use std::fmt::Write as _;

use crate::core::types::Oid;
use crate::engine::divergence::{self, DivergenceReport};
use crate::git::GitError;

use super::{commit, deletion, disposition, typed_id, ReportContext, LOG_BEGIN, LOG_END};

const NO_NEW_REVISIONS: &str = "No new revisions were added by this update.\n";

/// A new branch: where it points, its novel commits and what they change.
pub fn created(ctx: &ReportContext<'_>) -> Result<String, GitError> {
    let new = &ctx.update.new;
    let mut out = String::new();
    disposition(&mut out, "at", &typed_id(ctx.git, new)?);
    out.push('\n');
    out.push_str(&log_section(ctx)?);
    out.push_str(&diffstat_section(ctx, None)?);
    Ok(out)
}

/// A moved branch.
pub fn updated(ctx: &ReportContext<'_>) -> Result<String, GitError> {
    let (old, new) = (&ctx.update.old, &ctx.update.new);
    let computed;
    let report = match ctx.divergence {
        Some(report) => report,
        None => {
            computed = divergence::analyze(ctx.git, old, new)?;
            &computed
        }
    };

    let mut out = String::new();
    disposition(&mut out, "to", &typed_id(ctx.git, new)?);
    for oid in &report.discarded {
        disposition(&mut out, "discards", &typed_id(ctx.git, oid)?);
    }
    for oid in &report.introduced {
        disposition(&mut out, "via", &typed_id(ctx.git, oid)?);
    }

    if report.is_fast_forward {
        disposition(&mut out, "from", &typed_id(ctx.git, old)?);
    } else {
        out.push('\n');
        out.push_str(&narrative(report, old, new));
    }
    out.push('\n');

    if report.rewind_only {
        out.push_str(NO_NEW_REVISIONS);
    } else {
        if !ctx.novel.is_empty() {
            out.push_str(
                "Those revisions listed above that are new to this repository have\n\
                 not appeared on any other notification email; so we list those\n\
                 revisions in full, below.\n\n",
            );
        }
        out.push_str(&log_section(ctx)?);
    }

    out.push_str(&diffstat_section(ctx, Some(old))?);
    Ok(out)
}

/// A removed branch.
pub fn deleted(ctx: &ReportContext<'_>) -> Result<String, GitError> {
    deletion(ctx)
}

/// Explain a non-fast-forward update with a small drawing.
fn narrative(report: &DivergenceReport, old: &Oid, new: &Oid) -> String {
    let old_short = old.short(Oid::SHORT_LEN);
    let new_short = new.short(Oid::SHORT_LEN);
    let mut out = String::new();

    if report.rewind_only {
        let _ = write!(
            out,
            "This update discarded existing revisions and left the branch pointing at\n\
             a previous point in the repository history.\n\n\
             \x20* -- * -- N ({new_short})\n\
             \x20           \\\n\
             \x20            O -- O -- O ({old_short})\n\n\
             The removed revisions are not necessarily gone - if another reference\n\
             still refers to them they will stay in the repository.\n"
        );
    } else {
        let base = match &report.common_ancestor {
            Some(base) => format!("B ({})", base.short(Oid::SHORT_LEN)),
            None => "B".to_string(),
        };
        let _ = write!(
            out,
            "This update added new revisions after undoing existing revisions. That is\n\
             to say, the old revision is not a strict subset of the new revision. This\n\
             situation occurs when you --force push a change and generate a repository\n\
             containing something like this:\n\n\
             \x20* -- * -- B -- O -- O -- O ({old_short})\n\
             \x20           \\\n\
             \x20            N -- N -- N ({new_short})\n\n\
             When this happens we assume that you've already had alert emails for all\n\
             of the O revisions, and so we here report only the revisions in the N\n\
             branch from the common base, {base}.\n"
        );
    }
    out
}

/// Novel commits between the log fences, or a note that there are none.
fn log_section(ctx: &ReportContext<'_>) -> Result<String, GitError> {
    if ctx.novel.is_empty() {
        return Ok(NO_NEW_REVISIONS.to_string());
    }
    let mut out = String::new();
    out.push_str(LOG_BEGIN);
    out.push('\n');
    out.push_str(&commit::log(ctx.git, ctx.meta, ctx.novel)?);
    out.push_str(LOG_END);
    out.push('\n');
    Ok(out)
}

/// `Summary of changes:` from `from` (or the first parent) to the new tip.
fn diffstat_section(ctx: &ReportContext<'_>, from: Option<&Oid>) -> Result<String, GitError> {
    if !ctx.meta.diffstat {
        return Ok(String::new());
    }
    let stat = ctx.git.diffstat(from, &ctx.update.new)?;
    Ok(format!("\nSummary of changes:\n{}", stat))
}
