//! render::commit
//!
//! Per-commit blocks: the medium log format, the custom commit template
//! and the author-grouped shortlog used by release tags.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::core::types::Oid;
use crate::git::{CommitInfo, Git, GitError};

use super::RepoMeta;

/// Date format of `git log`'s default output.
pub(crate) const GIT_DATE_FORMAT: &str = "%a %b %-d %H:%M:%S %Y %z";

/// Render a list of commits, separated by blank lines.
pub fn log(git: &Git, meta: &RepoMeta, commits: &[Oid]) -> Result<String, GitError> {
    let mut blocks = Vec::with_capacity(commits.len());
    for oid in commits {
        let info = git.commit_info(oid)?;
        blocks.push(block(&info, meta));
    }
    Ok(blocks.join("\n"))
}

/// Render a single commit using the custom template, or the medium
/// format when none is configured.
pub fn block(info: &CommitInfo, meta: &RepoMeta) -> String {
    match &meta.commit_template {
        Some(template) => templated(info, meta, template),
        None => medium(info, meta),
    }
}

/// `git log --pretty=medium` style block, plus configured web links.
///
/// ```text
/// commit 3f2a...
/// Merge: 1a2b3c4 5d6e7f8
/// Author: Jane Doe <jane@example.com>
/// Date:   Tue Oct 13 09:12:44 2026 +0200
///
///     Fix the frobnicator (#12)
/// ```
pub fn medium(info: &CommitInfo, meta: &RepoMeta) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "commit {}", info.oid);
    if info.is_merge() {
        let parents: Vec<&str> = info
            .parents
            .iter()
            .map(|p| p.short(Oid::SHORT_LEN))
            .collect();
        let _ = writeln!(out, "Merge: {}", parents.join(" "));
    }
    let _ = writeln!(out, "Author: {}", info.author);
    let _ = writeln!(out, "Date:   {}", info.author.time.format(GIT_DATE_FORMAT));
    out.push('\n');

    for line in info.message.trim_end().lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "    {}", line);
        }
    }

    let links = links(info, meta);
    if !links.is_empty() {
        out.push('\n');
        for link in links {
            let _ = writeln!(out, "    {}", link);
        }
    }
    out
}

fn links(info: &CommitInfo, meta: &RepoMeta) -> Vec<String> {
    let mut links = Vec::new();
    if let Some(url) = meta.commit_link(&info.oid) {
        links.push(format!("Link: {}", url));
    }
    if meta.issue_url.is_some() {
        for number in issue_refs(&info.message) {
            if let Some(url) = meta.issue_link(&number) {
                links.push(format!("Issue #{}: {}", number, url));
            }
        }
    }
    links
}

/// Fill the custom commit template.
///
/// Placeholders: `{id}`, `{short}`, `{author}`, `{email}`, `{date}`,
/// `{summary}`, `{body}`, `{url}`. Unknown braces are left alone.
/// Substituted text is never scanned again, so a summary that happens to
/// contain `{body}` comes out verbatim.
pub fn templated(info: &CommitInfo, meta: &RepoMeta, template: &str) -> String {
    let body = info
        .message
        .trim_end()
        .split_once('\n')
        .map(|(_, rest)| rest.trim())
        .unwrap_or("");

    let value = |key: &str| -> Option<String> {
        Some(match key {
            "id" => info.oid.to_string(),
            "short" => info.oid.short(Oid::SHORT_LEN).to_string(),
            "author" => info.author.name.clone(),
            "email" => info.author.email.clone(),
            "date" => info.author.time.format(GIT_DATE_FORMAT).to_string(),
            "summary" => info.summary.clone(),
            "url" => meta.commit_link(&info.oid).unwrap_or_default(),
            "body" => body.to_string(),
            _ => return None,
        })
    };

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}').and_then(|close| Some((close, value(&after[..close])?))) {
            Some((close, text)) => {
                out.push_str(&text);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Issue numbers referenced as `#NNN`, in order of first appearance.
///
/// A reference must not directly follow a word character, so `abc#12`
/// and `&#39;` are ignored.
pub fn issue_refs(message: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let bytes = message.as_bytes();

    for (idx, _) in message.match_indices('#') {
        if idx > 0 {
            let prev = bytes[idx - 1];
            if prev.is_ascii_alphanumeric() || prev == b'_' || prev == b'&' {
                continue;
            }
        }
        let digits: String = message[idx + 1..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if !digits.is_empty() && !found.contains(&digits) {
            found.push(digits);
        }
    }
    found
}

/// `git shortlog` style summary: commits grouped by author name, authors
/// sorted, each author's commits oldest first.
pub fn shortlog(commits: &[CommitInfo]) -> String {
    let mut by_author: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for info in commits {
        by_author
            .entry(info.author.name.as_str())
            .or_default()
            .push(info.summary.as_str());
    }

    let mut out = String::new();
    for (author, summaries) in by_author {
        let _ = writeln!(out, "{} ({}):", author, summaries.len());
        for summary in summaries {
            let _ = writeln!(out, "      {}", summary);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Identity;
    use chrono::{DateTime, FixedOffset};

    fn info(oid: &str, author: &str, message: &str) -> CommitInfo {
        let time: DateTime<FixedOffset> =
            DateTime::parse_from_rfc3339("2026-10-13T09:12:44+02:00").unwrap();
        CommitInfo {
            oid: Oid::new(oid).unwrap(),
            parents: vec![],
            summary: message.lines().next().unwrap_or("").to_string(),
            message: message.to_string(),
            author: Identity {
                name: author.to_string(),
                email: format!("{}@example.com", author.to_lowercase()),
                time,
            },
        }
    }

    const A: &str = "abc123def4567890abc123def4567890abc12345";
    const B: &str = "def456abc7890123def456abc7890123def45678";

    mod medium {
        use super::*;

        #[test]
        fn layout() {
            let commit = info(A, "Jane", "Fix parser\n\nLonger explanation.\n");
            let text = medium(&commit, &RepoMeta::default());

            assert_eq!(
                text,
                "commit abc123def4567890abc123def4567890abc12345\n\
                 Author: Jane <jane@example.com>\n\
                 Date:   Tue Oct 13 09:12:44 2026 +0200\n\
                 \n    Fix parser\n\n    Longer explanation.\n"
            );
        }

        #[test]
        fn merge_line() {
            let mut commit = info(A, "Jane", "Merge branch 'x'\n");
            commit.parents = vec![Oid::new(A).unwrap(), Oid::new(B).unwrap()];

            let text = medium(&commit, &RepoMeta::default());
            assert!(text.contains("Merge: abc123d def456a\n"));
        }

        #[test]
        fn web_and_issue_links() {
            let meta = RepoMeta {
                commit_url: Some("https://example.com/c/{id}".to_string()),
                issue_url: Some("https://example.com/i/{number}".to_string()),
                ..Default::default()
            };
            let commit = info(A, "Jane", "Fix #12 and #7\n\nSee #12.\n");

            let text = medium(&commit, &meta);
            assert!(text.contains(&format!("    Link: https://example.com/c/{}\n", A)));
            assert!(text.contains("    Issue #12: https://example.com/i/12\n"));
            assert!(text.contains("    Issue #7: https://example.com/i/7\n"));
            assert_eq!(text.matches("Issue #12").count(), 1);
        }
    }

    #[test]
    fn custom_template() {
        let meta = RepoMeta {
            commit_template: Some("* {short} {summary} ({author} <{email}>)\n{body}".to_string()),
            ..Default::default()
        };
        let commit = info(A, "Jane", "Add widget\n\nWith details.\n");

        assert_eq!(
            block(&commit, &meta),
            "* abc123d Add widget (Jane <jane@example.com>)\nWith details.\n"
        );
    }

    #[test]
    fn template_values_are_not_expanded_again() {
        let meta = RepoMeta {
            commit_template: Some("{summary} | {body} | {nope} {".to_string()),
            ..Default::default()
        };
        let commit = info(A, "Jane", "Mention {body} and {url}\n\nReal body.\n");

        assert_eq!(
            block(&commit, &meta),
            "Mention {body} and {url} | Real body. | {nope} {\n"
        );
    }

    #[test]
    fn issue_reference_scanning() {
        assert_eq!(issue_refs("Fixes #1, refs #22"), vec!["1", "22"]);
        assert_eq!(issue_refs("(#5)"), vec!["5"]);
        assert!(issue_refs("abc#12 &#39; # nothing").is_empty());
    }

    #[test]
    fn shortlog_groups_by_author() {
        let commits = vec![
            info(A, "Zed", "Third\n"),
            info(A, "Amy", "First\n"),
            info(B, "Zed", "Fourth\n"),
        ];

        assert_eq!(
            shortlog(&commits),
            "Amy (1):\n      First\n\nZed (2):\n      Third\n      Fourth\n\n"
        );
    }
}
