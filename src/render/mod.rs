//! render
//!
//! Turn a classified update into a subject line and message body.
//!
//! # Templates
//!
//! One template per `(change, kind)` pair, chosen by a single `match` in
//! [`render`]:
//!
//! | kind                      | create | update | delete |
//! |---------------------------|--------|--------|--------|
//! | branch, tracking branch   | [`branch::created`] | [`branch::updated`] | [`branch::deleted`] |
//! | annotated tag             | [`tag::created`] | [`tag::updated`] | [`tag::deleted`] |
//! | tag, other                | [`general::created`] | [`general::updated`] | [`general::deleted`] |
//!
//! # Body Layout
//!
//! 1. Preamble naming the project and the disposition
//! 2. Disposition lines (`at`, `to`, `from`, `was`, `discards`, `via`)
//! 3. Divergence narrative (branch updates only)
//! 4. Novel commit log between fences
//! 5. Diffstat
//! 6. Footer

pub mod branch;
pub mod commit;
pub mod general;
pub mod subject;
pub mod tag;

use std::fmt::Write as _;

use crate::core::config::Config;
use crate::core::types::{ChangeKind, Oid, RefKind, RefUpdate};
use crate::engine::classify::Classification;
use crate::engine::divergence::DivergenceReport;
use crate::git::{Git, GitError};

/// Opening fence of the commit log section.
pub const LOG_BEGIN: &str =
    "- Log -----------------------------------------------------------------";

/// Closing fence of the commit log section.
pub const LOG_END: &str =
    "-----------------------------------------------------------------------";

/// Repository metadata that shapes every report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoMeta {
    /// Display name of the project
    pub project: String,
    /// Prepended verbatim to every subject
    pub subject_prefix: String,
    /// Commit view URL, `{id}` is replaced by the full id
    pub commit_url: Option<String>,
    /// Issue URL, `{number}` is replaced by the issue number
    pub issue_url: Option<String>,
    /// Public clone URL shown in the footer
    pub clone_url: Option<String>,
    /// Replaces the default commit block when set
    pub commit_template: Option<String>,
    /// Whether to include the summary of changes
    pub diffstat: bool,
}

impl RepoMeta {
    /// Build metadata from configuration.
    ///
    /// `fallback_project` is used when no project name is configured.
    /// The subject prefix defaults to `[<project>] `.
    pub fn from_config(config: &Config, fallback_project: &str) -> Self {
        let project = config.project().unwrap_or(fallback_project).to_string();
        let subject_prefix = match config.email_prefix() {
            Some(prefix) => prefix.to_string(),
            None => format!("[{}] ", project),
        };

        Self {
            subject_prefix,
            commit_url: config.commit_url().map(String::from),
            issue_url: config.issue_url().map(String::from),
            clone_url: config.web_clone_url().map(String::from),
            commit_template: config.commit_template().map(String::from),
            diffstat: config.diffstat(),
            project,
        }
    }

    /// Web link for a commit, if a commit URL is configured.
    pub fn commit_link(&self, oid: &Oid) -> Option<String> {
        self.commit_url
            .as_ref()
            .map(|template| template.replace("{id}", oid.as_str()))
    }

    /// Web link for an issue number, if an issue URL is configured.
    pub fn issue_link(&self, number: &str) -> Option<String> {
        self.issue_url
            .as_ref()
            .map(|template| template.replace("{number}", number))
    }
}

/// Everything a template needs for one update.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub git: &'a Git,
    pub meta: &'a RepoMeta,
    pub update: &'a RefUpdate,
    pub classification: &'a Classification,
    /// Present for branch updates
    pub divergence: Option<&'a DivergenceReport>,
    /// Novel commits, oldest first
    pub novel: &'a [Oid],
}

impl ReportContext<'_> {
    /// The reference name without its namespace prefix.
    pub fn short_refname(&self) -> &str {
        self.update.refname.short_name()
    }
}

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub subject: String,
    pub body: String,
}

/// Render the report for one update.
pub fn render(ctx: &ReportContext<'_>) -> Result<RenderedReport, GitError> {
    let mut body = preamble(ctx);

    let section = match (ctx.classification.change, ctx.classification.kind) {
        (ChangeKind::Create, RefKind::Branch | RefKind::TrackingBranch) => branch::created(ctx)?,
        (ChangeKind::Update, RefKind::Branch | RefKind::TrackingBranch) => branch::updated(ctx)?,
        (ChangeKind::Delete, RefKind::Branch | RefKind::TrackingBranch) => branch::deleted(ctx)?,
        (ChangeKind::Create, RefKind::AnnotatedTag) => tag::created(ctx)?,
        (ChangeKind::Update, RefKind::AnnotatedTag) => tag::updated(ctx)?,
        (ChangeKind::Delete, RefKind::AnnotatedTag) => tag::deleted(ctx)?,
        (ChangeKind::Create, RefKind::Tag | RefKind::Other) => general::created(ctx)?,
        (ChangeKind::Update, RefKind::Tag | RefKind::Other) => general::updated(ctx)?,
        (ChangeKind::Delete, RefKind::Tag | RefKind::Other) => general::deleted(ctx)?,
    };
    body.push_str(&section);
    body.push_str(&footer(ctx.meta));

    Ok(RenderedReport {
        subject: subject::compose(ctx)?,
        body,
    })
}

fn preamble(ctx: &ReportContext<'_>) -> String {
    format!(
        "This is an automated email from the repository hooks. It was generated\n\
         because a ref change was pushed to the repository containing\n\
         the project \"{}\".\n\n\
         The {}, {} has been {}\n",
        ctx.meta.project,
        ctx.classification.kind,
        ctx.short_refname(),
        ctx.classification.change.past_tense(),
    )
}

fn footer(meta: &RepoMeta) -> String {
    let mut out = format!("\n\n-- \n{}\n", meta.project);
    if let Some(url) = &meta.clone_url {
        let _ = writeln!(out, "git clone {}", url);
    }
    out
}

/// A disposition line: label right-aligned in a ten column gutter.
pub(crate) fn disposition(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "{:>10}  {}", label, value);
}

/// `<id> (<type>)` for an object, with the type looked up in the store.
pub(crate) fn typed_id(git: &Git, oid: &Oid) -> Result<String, GitError> {
    Ok(format!("{} ({})", oid, git.object_kind(oid)?))
}

/// `git describe` output, or the abbreviated id when describing fails.
pub(crate) fn describe_or_short(git: &Git, oid: &Oid) -> String {
    match git.describe(oid) {
        Ok(description) => description,
        Err(e) => {
            tracing::debug!(oid = %oid, error = %e, "describe failed");
            oid.short(Oid::SHORT_LEN).to_string()
        }
    }
}

/// The deletion body shared by every reference kind.
///
/// Shows the old id and, inside the log fences, a one-line summary of
/// the commit the reference used to name.
pub(crate) fn deletion(ctx: &ReportContext<'_>) -> Result<String, GitError> {
    let old = &ctx.update.old;
    let mut out = String::new();
    disposition(&mut out, "was", old.as_str());
    out.push('\n');
    out.push_str(LOG_BEGIN);
    out.push('\n');
    match ctx.git.peel_to_commit(old) {
        Ok(commit) => {
            let info = ctx.git.commit_info(&commit)?;
            let _ = writeln!(out, "{} {}", info.oid, info.summary);
        }
        Err(GitError::WrongObjectType { actual, .. }) => {
            let _ = writeln!(out, "{} ({})", old, actual);
        }
        Err(e) => return Err(e),
    }
    out.push_str(LOG_END);
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod repo_meta {
        use super::*;

        #[test]
        fn prefix_defaults_to_project() {
            let mut config = Config::default();
            config.global.project = Some("widgets".to_string());

            let meta = RepoMeta::from_config(&config, "fallback");
            assert_eq!(meta.project, "widgets");
            assert_eq!(meta.subject_prefix, "[widgets] ");
            assert!(meta.diffstat);
        }

        #[test]
        fn explicit_prefix_kept_verbatim() {
            let mut config = Config::default();
            config.global.email_prefix = Some(String::new());

            let meta = RepoMeta::from_config(&config, "mirror");
            assert_eq!(meta.project, "mirror");
            assert_eq!(meta.subject_prefix, "");
        }

        #[test]
        fn links() {
            let meta = RepoMeta {
                commit_url: Some("https://example.com/c/{id}".to_string()),
                issue_url: Some("https://example.com/i/{number}".to_string()),
                ..Default::default()
            };
            let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();

            assert_eq!(
                meta.commit_link(&oid).unwrap(),
                "https://example.com/c/abc123def4567890abc123def4567890abc12345"
            );
            assert_eq!(meta.issue_link("42").unwrap(), "https://example.com/i/42");
            assert!(RepoMeta::default().commit_link(&oid).is_none());
        }
    }

    #[test]
    fn disposition_alignment() {
        let mut out = String::new();
        disposition(&mut out, "at", "abc");
        disposition(&mut out, "discards", "def");
        assert_eq!(out, "        at  abc\n  discards  def\n");
    }

    #[test]
    fn footer_with_clone_url() {
        let meta = RepoMeta {
            project: "widgets".to_string(),
            clone_url: Some("https://example.com/widgets.git".to_string()),
            ..Default::default()
        };
        assert_eq!(
            footer(&meta),
            "\n\n-- \nwidgets\ngit clone https://example.com/widgets.git\n"
        );
    }
}
