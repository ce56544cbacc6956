//! core::authors
//!
//! Pusher login → mail identity mapping.
//!
//! The file holds one `login = Full Name <email>` entry per line. Blank
//! lines and lines starting with `#` are ignored. Later entries for the
//! same login replace earlier ones.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from reading an authors file.
#[derive(Debug, Error)]
pub enum AuthorsError {
    #[error("failed to read authors file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}:{line}: expected 'login = Name <email>'")]
    Malformed { path: PathBuf, line: usize },
}

/// Parsed authors mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorsMap {
    entries: HashMap<String, String>,
}

impl AuthorsMap {
    /// Load and parse an authors file.
    pub fn load(path: &Path) -> Result<Self, AuthorsError> {
        let contents = fs::read_to_string(path).map_err(|e| AuthorsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents).map_err(|line| AuthorsError::Malformed {
            path: path.to_path_buf(),
            line,
        })
    }

    /// Parse authors file contents.
    ///
    /// On failure returns the 1-based number of the offending line.
    ///
    /// # Example
    ///
    /// ```
    /// use refnotify::core::authors::AuthorsMap;
    ///
    /// let map = AuthorsMap::parse("# team\njdoe = Jane Doe <jane@example.com>\n").unwrap();
    /// assert_eq!(map.lookup("jdoe"), Some("Jane Doe <jane@example.com>"));
    /// assert_eq!(map.lookup("nobody"), None);
    /// ```
    pub fn parse(contents: &str) -> Result<Self, usize> {
        let mut entries = HashMap::new();
        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (login, identity) = line.split_once('=').ok_or(idx + 1)?;
            let (login, identity) = (login.trim(), identity.trim());
            if login.is_empty() || !is_mail_identity(identity) {
                return Err(idx + 1);
            }
            entries.insert(login.to_string(), identity.to_string());
        }
        Ok(Self { entries })
    }

    /// Find the identity for a login.
    pub fn lookup(&self, login: &str) -> Option<&str> {
        self.entries.get(login).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `Name <addr>` with something inside the brackets.
fn is_mail_identity(s: &str) -> bool {
    match (s.find('<'), s.rfind('>')) {
        (Some(open), Some(close)) => open + 1 < close && close == s.len() - 1,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_entries_and_skips_comments() {
        let map = AuthorsMap::parse(
            "\n# comment\njdoe = Jane Doe <jane@example.com>\n  rroe=Richard Roe <rr@example.com>  \n",
        )
        .unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.lookup("rroe"), Some("Richard Roe <rr@example.com>"));
    }

    #[test]
    fn later_entry_wins() {
        let map = AuthorsMap::parse("a = A <a@1>\na = A <a@2>\n").unwrap();
        assert_eq!(map.lookup("a"), Some("A <a@2>"));
    }

    #[test]
    fn malformed_lines_report_line_number() {
        assert_eq!(AuthorsMap::parse("ok = A <a@x>\nbroken line\n"), Err(2));
        assert_eq!(AuthorsMap::parse(" = A <a@x>"), Err(1));
        assert_eq!(AuthorsMap::parse("a = no brackets"), Err(1));
        assert_eq!(AuthorsMap::parse("a = Empty <>"), Err(1));
    }

    #[test]
    fn load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("authors");
        fs::write(&path, "jdoe = Jane Doe <jane@example.com>\n").unwrap();

        let map = AuthorsMap::load(&path).unwrap();
        assert!(!map.is_empty());

        let missing = AuthorsMap::load(&temp.path().join("missing"));
        assert!(matches!(missing, Err(AuthorsError::Read { .. })));
    }
}
