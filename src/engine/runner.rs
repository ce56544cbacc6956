//! engine::runner
//!
//! Drive a batch of updates through the pipeline.
//!
//! # Skip Contract
//!
//! | Outcome                         | batch mode      | single mode     |
//! |---------------------------------|-----------------|-----------------|
//! | tracking branch                 | skip (info)     | skip (info)     |
//! | anomalous reference             | skip (warn)     | abort           |
//! | no recipients                   | skip (warn)     | abort           |
//! | object resolution failure       | fail, continue  | abort           |
//! | transport failure               | fail, continue  | fail            |
//!
//! Failed deliveries are never retried.

use crate::core::authors::{AuthorsError, AuthorsMap};
use crate::core::config::Config;
use crate::core::types::{ChangeKind, RefKind, RefName, RefUpdate};
use crate::git::{Git, GitError};
use crate::notify::{Message, Transport};
use crate::render::{self, RepoMeta, ReportContext};

use super::classify::classify;
use super::divergence::analyze;
use super::novel::{resolve, ExclusionPolicy, ResolveRequest};
use super::NotifyError;

/// How a run reacts to per-update problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One update from the command line; problems abort the run
    Single,
    /// Many updates from a hook; problems skip only the affected update
    Batch,
}

/// Counts of what happened to each update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Runs updates against one repository, configuration and transport.
pub struct Runner<'a> {
    git: &'a Git,
    config: &'a Config,
    transport: &'a dyn Transport,
    meta: RepoMeta,
    policy: ExclusionPolicy,
    from: Option<String>,
}

impl<'a> Runner<'a> {
    /// Create a runner.
    ///
    /// The primary branch defaults to the branch the mirror's `HEAD`
    /// names, and the project name to the repository directory name.
    pub fn new(git: &'a Git, config: &'a Config, transport: &'a dyn Transport) -> Self {
        let fallback_project = git
            .default_project_name()
            .unwrap_or_else(|| "repository".to_string());
        let meta = RepoMeta::from_config(config, &fallback_project);

        let primary = config
            .primary_branch()
            .map(String::from)
            .or_else(|| git.head_branch())
            .and_then(|branch| match RefName::for_branch(&branch) {
                Ok(name) => Some(name),
                Err(e) => {
                    tracing::warn!(branch, error = %e, "ignoring invalid primary branch");
                    None
                }
            });

        let policy = ExclusionPolicy {
            namespaces: config.exclude_namespaces(),
            primary,
        };
        tracing::debug!(?policy, project = %meta.project, "runner ready");

        Self {
            git,
            config,
            transport,
            meta,
            policy,
            from: config.sender().map(String::from),
        }
    }

    /// Set the `From:` identity used for every message.
    pub fn with_sender(mut self, from: Option<String>) -> Self {
        self.from = from;
        self
    }

    pub fn meta(&self) -> &RepoMeta {
        &self.meta
    }

    pub fn policy(&self) -> &ExclusionPolicy {
        &self.policy
    }

    /// Process every update in order.
    ///
    /// # Errors
    ///
    /// In [`Mode::Single`], the first problem other than a tracking branch
    /// or a failed delivery is returned. [`Mode::Batch`] never errors.
    pub fn run(&self, updates: &[RefUpdate], mode: Mode) -> Result<RunSummary, NotifyError> {
        let mut summary = RunSummary::default();

        for (index, update) in updates.iter().enumerate() {
            let span = tracing::info_span!("update", refname = %update.refname);
            let _guard = span.enter();

            let err = match self.process(update, &updates[index + 1..]) {
                Ok(()) => {
                    summary.sent += 1;
                    continue;
                }
                Err(err) => err,
            };

            match outcome(&err, mode) {
                Outcome::Skip if err.is_expected() => {
                    tracing::info!("{}", err);
                    summary.skipped += 1;
                }
                Outcome::Skip => {
                    tracing::warn!("{}", err);
                    summary.skipped += 1;
                }
                Outcome::Fail => {
                    tracing::error!("{}", err);
                    summary.failed += 1;
                }
                Outcome::Abort => return Err(err),
            }
        }

        tracing::info!(
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            "run complete"
        );
        Ok(summary)
    }

    /// Build and send the notification for one update.
    ///
    /// `pending` holds the updates that follow it in the same batch.
    pub fn process(&self, update: &RefUpdate, pending: &[RefUpdate]) -> Result<(), NotifyError> {
        let message = self.prepare_in_batch(update, pending)?;
        self.transport
            .send(&message)
            .map_err(|source| NotifyError::Transport {
                refname: update.refname.to_string(),
                source,
            })
    }

    /// Build the notification for one update without sending it.
    pub fn prepare(&self, update: &RefUpdate) -> Result<Message, NotifyError> {
        self.prepare_in_batch(update, &[])
    }

    fn prepare_in_batch(
        &self,
        update: &RefUpdate,
        pending: &[RefUpdate],
    ) -> Result<Message, NotifyError> {
        let resolution = |source: GitError| NotifyError::ObjectResolution {
            refname: update.refname.to_string(),
            source,
        };

        let classification = classify(self.git, update)?;
        let kind = classification.kind;

        let recipients = self.config.recipients_for(kind);
        if recipients.is_empty() {
            return Err(NotifyError::MissingRecipients {
                refname: update.refname.to_string(),
                key: Config::recipients_key(kind),
            });
        }

        let divergence = match (classification.change, kind) {
            (ChangeKind::Update, RefKind::Branch) => {
                Some(analyze(self.git, &update.old, &update.new).map_err(resolution)?)
            }
            _ => None,
        };

        let novel = if kind == RefKind::Branch {
            resolve(
                self.git,
                &ResolveRequest {
                    update,
                    divergence: divergence.as_ref(),
                    policy: &self.policy,
                    pending,
                },
            )?
        } else {
            Vec::new()
        };

        let ctx = ReportContext {
            git: self.git,
            meta: &self.meta,
            update,
            classification: &classification,
            divergence: divergence.as_ref(),
            novel: &novel,
        };
        let report = render::render(&ctx).map_err(resolution)?;

        tracing::debug!(subject = %report.subject, novel = novel.len(), "rendered");

        Ok(Message::new(
            recipients.to_vec(),
            self.from.clone(),
            update.refname.clone(),
            kind,
            update.old.clone(),
            update.new.clone(),
            report,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Skip,
    Fail,
    Abort,
}

fn outcome(err: &NotifyError, mode: Mode) -> Outcome {
    match (err, mode) {
        _ if err.is_expected() => Outcome::Skip,
        (NotifyError::Transport { .. }, _) => Outcome::Fail,
        (_, Mode::Single) => Outcome::Abort,
        (NotifyError::UnsupportedReference { .. }, Mode::Batch)
        | (NotifyError::MissingRecipients { .. }, Mode::Batch) => Outcome::Skip,
        (NotifyError::ObjectResolution { .. }, Mode::Batch) => Outcome::Fail,
    }
}

/// Work out the `From:` identity for a push.
///
/// The pusher's login is looked up in the authors file; when that yields
/// nothing the configured sender is used, and failing that the header is
/// left to the mail transfer agent.
pub fn resolve_sender(
    config: &Config,
    pusher: Option<&str>,
) -> Result<Option<String>, AuthorsError> {
    if let (Some(path), Some(login)) = (config.authors_file(), pusher) {
        let authors = AuthorsMap::load(path)?;
        if let Some(identity) = authors.lookup(login) {
            return Ok(Some(identity.to_string()));
        }
        tracing::debug!(login, "pusher not listed in authors file");
    }
    Ok(config.sender().map(String::from))
}
