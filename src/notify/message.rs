//! notify::message
//!
//! A complete mail message: headers, a blank line, the body.

use std::fmt;

use crate::core::types::{Oid, RefKind, RefName};
use crate::render::RenderedReport;

/// A fully formed notification message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub to: Vec<String>,
    /// Left to the mail transfer agent when absent
    pub from: Option<String>,
    pub subject: String,
    pub refname: RefName,
    pub reftype: RefKind,
    pub oldrev: Oid,
    pub newrev: Oid,
    pub body: String,
}

impl Message {
    /// Wrap a rendered report with its envelope.
    pub fn new(
        to: Vec<String>,
        from: Option<String>,
        refname: RefName,
        reftype: RefKind,
        oldrev: Oid,
        newrev: Oid,
        report: RenderedReport,
    ) -> Self {
        Self {
            to,
            from,
            subject: report.subject,
            refname,
            reftype,
            oldrev,
            newrev,
            body: report.body,
        }
    }

    /// Header fields in the order they are written.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::with_capacity(11);
        if let Some(from) = &self.from {
            headers.push(("From", from.clone()));
        }
        headers.push(("To", self.to.join(", ")));
        headers.push(("Subject", encode_header(&self.subject)));
        headers.push(("MIME-Version", "1.0".to_string()));
        headers.push(("Content-Type", "text/plain; charset=utf-8".to_string()));
        headers.push(("Content-Transfer-Encoding", "8bit".to_string()));
        headers.push(("X-Git-Refname", self.refname.to_string()));
        headers.push(("X-Git-Reftype", self.reftype.label().to_string()));
        headers.push(("X-Git-Oldrev", self.oldrev.to_string()));
        headers.push(("X-Git-Newrev", self.newrev.to_string()));
        headers.push(("Auto-Submitted", "auto-generated".to_string()));
        headers
    }
}

/// Longest encoded word a header may carry.
const MAX_ENCODED_WORD: usize = 75;

/// Encode a header value as RFC 2047 `Q` encoded words when it holds
/// anything outside ASCII. Long values are split across folded lines,
/// never inside a character.
fn encode_header(value: &str) -> String {
    const PREFIX: &str = "=?UTF-8?Q?";
    const SUFFIX: &str = "?=";

    if value.is_ascii() {
        return value.to_string();
    }

    let mut words = Vec::new();
    let mut word = String::new();
    for ch in value.chars() {
        let mut buf = [0u8; 4];
        let encoded = q_encode(ch.encode_utf8(&mut buf).as_bytes());
        if !word.is_empty()
            && PREFIX.len() + word.len() + encoded.len() + SUFFIX.len() > MAX_ENCODED_WORD
        {
            words.push(format!("{PREFIX}{word}{SUFFIX}"));
            word.clear();
        }
        word.push_str(&encoded);
    }
    if !word.is_empty() {
        words.push(format!("{PREFIX}{word}{SUFFIX}"));
    }
    words.join("\n ")
}

/// One character's bytes in `Q` form.
fn q_encode(bytes: &[u8]) -> String {
    match bytes {
        [b' '] => "_".to_string(),
        [b] if b.is_ascii_alphanumeric() || b"!*+-/".contains(b) => char::from(*b).to_string(),
        _ => bytes
            .iter()
            .map(|b| format!("={}", hex::encode_upper([*b])))
            .collect(),
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.headers() {
            writeln!(f, "{}: {}", name, value)?;
        }
        writeln!(f)?;
        f.write_str(&self.body)
    }
}
