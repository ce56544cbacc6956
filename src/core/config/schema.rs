//! core::config::schema
//!
//! Configuration schema types.
//!
//! Every scope (global file, repository file, environment, CLI flags)
//! deserializes into the same [`FileConfig`]; scopes are layered by
//! [`super::Config`].
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., the primary branch must form a valid ref name,
//! URL templates must carry their placeholders).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::RefName;

/// One configuration scope.
///
/// # Example
///
/// ```toml
/// project = "widgets"
/// recipients = ["commits@example.com"]
/// announce_recipients = ["announce@example.com"]
/// sender = "Git Hooks <git@example.com>"
/// authors_file = "/etc/refnotify/authors"
/// email_prefix = "[widgets] "
/// primary_branch = "main"
/// exclude_namespaces = ["refs/heads/"]
///
/// [web]
/// commit_url = "https://git.example.com/widgets/commit/{id}"
/// issue_url = "https://tracker.example.com/issues/{number}"
/// clone_url = "https://git.example.com/widgets.git"
///
/// [format]
/// commit_template = "{short} {summary} ({author})"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Project name used in subjects and the body preamble
    pub project: Option<String>,

    /// Default recipient list
    pub recipients: Option<Vec<String>>,

    /// Recipients for annotated tag announcements
    pub announce_recipients: Option<Vec<String>>,

    /// `From:` identity when the pusher is not in the authors file
    pub sender: Option<String>,

    /// File mapping pusher logins to mail identities
    pub authors_file: Option<PathBuf>,

    /// Subject prefix; defaults to `[<project>] `
    pub email_prefix: Option<String>,

    /// Primary branch name (without `refs/heads/`)
    pub primary_branch: Option<String>,

    /// Ref prefixes whose refs count as "already reported"
    pub exclude_namespaces: Option<Vec<String>>,

    /// Path of the sendmail-compatible program
    pub sendmail: Option<PathBuf>,

    /// URL to clone the mirror from when it does not exist yet
    pub clone_source: Option<String>,

    /// Include the diffstat section
    pub diffstat: Option<bool>,

    /// Web UI links
    pub web: Option<WebConfig>,

    /// Output format overrides
    pub format: Option<FormatConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(primary) = &self.primary_branch {
            RefName::for_branch(primary).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid primary branch name: {}", e))
            })?;
        }

        for (key, list) in [
            ("recipients", &self.recipients),
            ("announce_recipients", &self.announce_recipients),
        ] {
            if let Some(list) = list {
                if list.iter().any(|r| r.trim().is_empty()) {
                    return Err(ConfigError::InvalidValue(format!(
                        "{} cannot contain empty addresses",
                        key
                    )));
                }
            }
        }

        if let Some(namespaces) = &self.exclude_namespaces {
            for ns in namespaces {
                if !ns.starts_with("refs/") || !ns.ends_with('/') {
                    return Err(ConfigError::InvalidValue(format!(
                        "exclude namespace '{}' must look like 'refs/<name>/'",
                        ns
                    )));
                }
            }
        }

        if let Some(web) = &self.web {
            web.validate()?;
        }

        Ok(())
    }
}

/// Web UI URL templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WebConfig {
    /// Commit view; `{id}` is replaced by the full commit id
    pub commit_url: Option<String>,

    /// Issue tracker; `{number}` is replaced by the issue number
    pub issue_url: Option<String>,

    /// Clone URL shown in the footer
    pub clone_url: Option<String>,
}

impl WebConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.commit_url {
            if !url.contains("{id}") {
                return Err(ConfigError::InvalidValue(
                    "web.commit_url must contain '{id}'".to_string(),
                ));
            }
        }
        if let Some(url) = &self.issue_url {
            if !url.contains("{number}") {
                return Err(ConfigError::InvalidValue(
                    "web.issue_url must contain '{number}'".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Output format overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FormatConfig {
    /// Replaces the per-commit block in the log section
    pub commit_template: Option<String>,
}
