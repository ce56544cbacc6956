//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repository config file
//! 4. Environment variables
//! 5. CLI flags (stored in [`Config::overrides`] by the CLI layer)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$REFNOTIFY_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/refnotify/config.toml`
//! 3. `~/.refnotify/config.toml`
//!
//! # Repository Config Location
//!
//! `<git-dir>/refnotify.toml`, which for a bare mirror sits next to
//! `HEAD` and `config`.
//!
//! # Environment
//!
//! - `REFNOTIFY_RECIPIENTS`, `REFNOTIFY_ANNOUNCE_RECIPIENTS`: comma-separated
//! - `REFNOTIFY_SENDER`
//! - `REFNOTIFY_EMAIL_PREFIX`
//!
//! # Example
//!
//! ```no_run
//! use refnotify::core::config::Config;
//! use refnotify::core::types::RefKind;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/srv/mirrors/widgets.git"))).unwrap();
//! println!("Recipients: {:?}", config.recipients_for(RefKind::Branch));
//! ```

pub mod schema;

pub use schema::{FileConfig, FormatConfig, WebConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::RefKind;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules automatically.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: FileConfig,
    /// Repository configuration (if present)
    pub repo: Option<FileConfig>,
    /// Values taken from `REFNOTIFY_*` environment variables
    pub env: FileConfig,
    /// Values set from command-line flags
    pub overrides: FileConfig,
}

impl Config {
    /// Default sendmail location.
    pub const DEFAULT_SENDMAIL: &'static str = "/usr/sbin/sendmail";

    /// Load configuration from default locations and the process environment.
    ///
    /// If `git_dir` is provided, also loads the repository config file.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(git_dir: Option<&Path>) -> Result<Config, ConfigError> {
        Self::load_with_env(git_dir, |key| std::env::var(key).ok())
    }

    /// Load configuration, reading environment variables through `env`.
    pub fn load_with_env(
        git_dir: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Config, ConfigError> {
        let (global, global_path) = Self::load_global(&env)?;

        let (repo, repo_path) = match git_dir {
            Some(dir) => {
                let path = Self::repo_config_path(dir);
                if path.exists() {
                    (Some(Self::read_config(&path)?), Some(path))
                } else {
                    (None, None)
                }
            }
            None => (None, None),
        };

        let env = Self::from_env(&env);

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }
        env.validate()?;

        tracing::debug!(
            global = ?global_path,
            repo = ?repo_path,
            "configuration loaded"
        );

        Ok(Config {
            global,
            repo,
            env,
            overrides: FileConfig::default(),
        })
    }

    /// Load global configuration from standard locations.
    fn load_global(
        env: &impl Fn(&str) -> Option<String>,
    ) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
        // 1. Check $REFNOTIFY_CONFIG
        if let Some(path) = env("REFNOTIFY_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 2. Check $XDG_CONFIG_HOME/refnotify/config.toml
        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("refnotify/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.refnotify/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".refnotify/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((FileConfig::default(), None))
    }

    /// Build the environment layer.
    fn from_env(env: &impl Fn(&str) -> Option<String>) -> FileConfig {
        let list = |key: &str| {
            env(key).map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
        };

        FileConfig {
            recipients: list("REFNOTIFY_RECIPIENTS"),
            announce_recipients: list("REFNOTIFY_ANNOUNCE_RECIPIENTS"),
            sender: env("REFNOTIFY_SENDER").filter(|s| !s.trim().is_empty()),
            email_prefix: env("REFNOTIFY_EMAIL_PREFIX"),
            ..Default::default()
        }
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the path of the repository config for a git directory.
    pub fn repo_config_path(git_dir: &Path) -> PathBuf {
        git_dir.join("refnotify.toml")
    }

    /// Layers from highest to lowest precedence.
    fn layers(&self) -> impl Iterator<Item = &FileConfig> {
        [Some(&self.overrides), Some(&self.env), self.repo.as_ref(), Some(&self.global)]
            .into_iter()
            .flatten()
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the project name, if configured.
    pub fn project(&self) -> Option<&str> {
        self.layers().find_map(|l| l.project.as_deref())
    }

    /// Get the default recipient list.
    ///
    /// Returns an empty slice if not configured.
    pub fn recipients(&self) -> &[String] {
        self.layers()
            .find_map(|l| l.recipients.as_deref())
            .unwrap_or(&[])
    }

    /// Get the recipients for an update to a reference of `kind`.
    ///
    /// Annotated tags go to the announce list when one is configured.
    pub fn recipients_for(&self, kind: RefKind) -> &[String] {
        if kind == RefKind::AnnotatedTag {
            if let Some(announce) = self
                .layers()
                .find_map(|l| l.announce_recipients.as_deref())
                .filter(|list| !list.is_empty())
            {
                return announce;
            }
        }
        self.recipients()
    }

    /// Name of the setting that supplies recipients for `kind`.
    ///
    /// Used in diagnostics when no recipients are configured.
    pub fn recipients_key(kind: RefKind) -> &'static str {
        match kind {
            RefKind::AnnotatedTag => "announce_recipients",
            _ => "recipients",
        }
    }

    /// Get the fallback sender identity.
    pub fn sender(&self) -> Option<&str> {
        self.layers().find_map(|l| l.sender.as_deref())
    }

    /// Get the authors file path.
    pub fn authors_file(&self) -> Option<&Path> {
        self.layers().find_map(|l| l.authors_file.as_deref())
    }

    /// Get the configured subject prefix.
    ///
    /// Returns `None` when unset so callers can derive it from the project.
    pub fn email_prefix(&self) -> Option<&str> {
        self.layers().find_map(|l| l.email_prefix.as_deref())
    }

    /// Get the primary branch name, if configured.
    pub fn primary_branch(&self) -> Option<&str> {
        self.layers().find_map(|l| l.primary_branch.as_deref())
    }

    /// Get the exclusion namespaces.
    ///
    /// Defaults to `["refs/heads/"]`.
    pub fn exclude_namespaces(&self) -> Vec<String> {
        self.layers()
            .find_map(|l| l.exclude_namespaces.clone())
            .unwrap_or_else(|| vec!["refs/heads/".to_string()])
    }

    /// Get the sendmail program.
    ///
    /// Defaults to `/usr/sbin/sendmail`.
    pub fn sendmail(&self) -> &Path {
        self.layers()
            .find_map(|l| l.sendmail.as_deref())
            .unwrap_or_else(|| Path::new(Self::DEFAULT_SENDMAIL))
    }

    /// Get the clone source for bootstrapping the mirror.
    pub fn clone_source(&self) -> Option<&str> {
        self.layers().find_map(|l| l.clone_source.as_deref())
    }

    /// Check if the diffstat section is enabled.
    ///
    /// Defaults to `true`.
    pub fn diffstat(&self) -> bool {
        self.layers().find_map(|l| l.diffstat).unwrap_or(true)
    }

    /// Get the commit view URL template.
    pub fn commit_url(&self) -> Option<&str> {
        self.layers()
            .find_map(|l| l.web.as_ref().and_then(|w| w.commit_url.as_deref()))
    }

    /// Get the issue tracker URL template.
    pub fn issue_url(&self) -> Option<&str> {
        self.layers()
            .find_map(|l| l.web.as_ref().and_then(|w| w.issue_url.as_deref()))
    }

    /// Get the public clone URL.
    pub fn web_clone_url(&self) -> Option<&str> {
        self.layers()
            .find_map(|l| l.web.as_ref().and_then(|w| w.clone_url.as_deref()))
    }

    /// Get the custom single-commit template.
    pub fn commit_template(&self) -> Option<&str> {
        self.layers().find_map(|l| {
            l.format
                .as_ref()
                .and_then(|f| f.commit_template.as_deref())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::default();

        assert!(config.recipients().is_empty());
        assert!(config.primary_branch().is_none());
        assert_eq!(config.exclude_namespaces(), vec!["refs/heads/".to_string()]);
        assert_eq!(config.sendmail(), Path::new("/usr/sbin/sendmail"));
        assert!(config.diffstat());
    }

    #[test]
    fn load_global_from_env_var() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("global.toml");
        fs::write(&path, "project = \"widgets\"\nrecipients = [\"a@example.com\"]").unwrap();

        let env = env_from(&[("REFNOTIFY_CONFIG", path.to_str().unwrap())]);
        let config = Config::load_with_env(None, env).unwrap();

        assert_eq!(config.project(), Some("widgets"));
        assert_eq!(config.recipients(), ["a@example.com".to_string()]);
    }

    #[test]
    fn repo_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        fs::write(&global, "project = \"global\"\nprimary_branch = \"master\"").unwrap();

        let git_dir = temp.path().join("mirror.git");
        fs::create_dir_all(&git_dir).unwrap();
        fs::write(
            Config::repo_config_path(&git_dir),
            "primary_branch = \"main\"",
        )
        .unwrap();

        let env = env_from(&[("REFNOTIFY_CONFIG", global.to_str().unwrap())]);
        let config = Config::load_with_env(Some(&git_dir), env).unwrap();

        assert_eq!(config.project(), Some("global"));
        assert_eq!(config.primary_branch(), Some("main"));
        assert!(config.repo.is_some());
    }

    #[test]
    fn env_overrides_files() {
        let temp = TempDir::new().unwrap();
        let git_dir = temp.path().join("mirror.git");
        fs::create_dir_all(&git_dir).unwrap();
        fs::write(
            Config::repo_config_path(&git_dir),
            "recipients = [\"file@example.com\"]",
        )
        .unwrap();

        let env = env_from(&[
            ("REFNOTIFY_RECIPIENTS", "a@example.com, b@example.com,"),
            ("REFNOTIFY_SENDER", "Hooks <hooks@example.com>"),
        ]);
        let config = Config::load_with_env(Some(&git_dir), env).unwrap();

        assert_eq!(
            config.recipients(),
            ["a@example.com".to_string(), "b@example.com".to_string()]
        );
        assert_eq!(config.sender(), Some("Hooks <hooks@example.com>"));
    }

    #[test]
    fn overrides_win() {
        let mut config = Config::default();
        config.env.email_prefix = Some("[env] ".to_string());
        config.overrides.email_prefix = Some("[cli] ".to_string());

        assert_eq!(config.email_prefix(), Some("[cli] "));
    }

    #[test]
    fn announce_list_for_annotated_tags() {
        let mut config = Config::default();
        config.global.recipients = Some(vec!["commits@example.com".to_string()]);

        // Falls back to the default list
        assert_eq!(
            config.recipients_for(RefKind::AnnotatedTag),
            ["commits@example.com".to_string()]
        );

        config.global.announce_recipients = Some(vec!["announce@example.com".to_string()]);
        assert_eq!(
            config.recipients_for(RefKind::AnnotatedTag),
            ["announce@example.com".to_string()]
        );
        assert_eq!(
            config.recipients_for(RefKind::Tag),
            ["commits@example.com".to_string()]
        );
    }

    #[test]
    fn invalid_repo_config_rejected() {
        let temp = TempDir::new().unwrap();
        let git_dir = temp.path().to_path_buf();
        fs::write(
            Config::repo_config_path(&git_dir),
            "primary_branch = \"invalid..name\"",
        )
        .unwrap();

        let result = Config::load_with_env(Some(&git_dir), env_from(&[]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn malformed_toml_rejected() {
        let temp = TempDir::new().unwrap();
        let git_dir = temp.path().to_path_buf();
        fs::write(Config::repo_config_path(&git_dir), "recipients = [").unwrap();

        let result = Config::load_with_env(Some(&git_dir), env_from(&[]));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }
}
