//! cli
//!
//! Command-line interface layer for refnotify.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and install logging
//! - Load configuration and fold flags into its override layer
//! - Prepare the mirror, read the updates and hand them to the
//!   [`crate::engine::Runner`]
//!
//! # Architecture
//!
//! The CLI layer is thin. Typed errors from the lower layers are wrapped
//! with `anyhow` context here and nowhere else.

pub mod args;

pub use args::{Cli, Shell};

use std::fs;
use std::io::{self, BufRead, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::CommandFactory;
use clap_complete::{generate, shells};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::core::event::PushEvent;
use crate::core::types::RefUpdate;
use crate::engine::bootstrap::{prepare_mirror, MirrorOptions};
use crate::engine::runner::resolve_sender;
use crate::engine::{Mode, Runner};
use crate::notify::{SendmailTransport, StdoutTransport, Transport};

/// Environment variable holding a log filter directive.
pub const LOG_ENV: &str = "REFNOTIFY_LOG";

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    if let Some(shell) = cli.completions {
        completions(shell);
        return Ok(());
    }

    init_logging(&cli);

    let input = read_input(&cli)?;

    let clone_url = cli
        .clone_url
        .clone()
        .or_else(|| input.clone_url.clone());
    let mut config = Config::load(None).context("failed to load configuration")?;
    let clone_url = clone_url.or_else(|| config.clone_source().map(String::from));

    let git = prepare_mirror(&MirrorOptions {
        path: &cli.repo,
        clone_url: clone_url.as_deref(),
        fetch: !cli.no_fetch,
    })
    .with_context(|| format!("failed to prepare repository '{}'", cli.repo.display()))?;

    // Reload now that the repository config can be found.
    config = Config::load(Some(git.git_dir())).context("failed to load configuration")?;
    apply_overrides(&mut config, &cli, input.project.as_deref());

    let pusher = cli
        .pusher
        .clone()
        .or(input.pusher)
        .or_else(|| std::env::var("USER").ok());
    let from = resolve_sender(&config, pusher.as_deref()).context("failed to read authors file")?;

    let transport: Box<dyn Transport> = if cli.dry_run {
        Box::new(StdoutTransport)
    } else {
        Box::new(SendmailTransport::new(config.sendmail()))
    };

    let runner = Runner::new(&git, &config, transport.as_ref()).with_sender(from);
    let summary = runner.run(&input.updates, input.mode)?;

    if summary.failed > 0 {
        bail!("{} of {} update(s) failed", summary.failed, input.updates.len());
    }
    Ok(())
}

/// Updates to process plus whatever the input said about the push.
#[derive(Debug)]
struct Input {
    updates: Vec<RefUpdate>,
    mode: Mode,
    pusher: Option<String>,
    project: Option<String>,
    clone_url: Option<String>,
}

fn read_input(cli: &Cli) -> Result<Input> {
    if cli.stdin {
        let updates = parse_update_lines(io::stdin().lock())?;
        return Ok(Input {
            updates,
            mode: Mode::Batch,
            pusher: None,
            project: None,
            clone_url: None,
        });
    }

    if let Some(path) = &cli.push_event {
        let event = read_push_event(path)?;
        return Ok(Input {
            updates: vec![event.update()?],
            mode: Mode::Single,
            pusher: event.pusher_name().map(String::from),
            project: Some(event.repository.full_name.clone()),
            clone_url: event.repository.clone_url.clone(),
        });
    }

    match (&cli.refname, &cli.old, &cli.new) {
        (Some(refname), Some(old), Some(new)) => Ok(Input {
            updates: vec![RefUpdate::from_parts(refname, old, new)?],
            mode: Mode::Single,
            pusher: None,
            project: None,
            clone_url: None,
        }),
        _ => bail!("expected <REFNAME> <OLD> <NEW>, --stdin or --push-event"),
    }
}

/// Parse `<old> <new> <ref>` lines, skipping blank ones.
fn parse_update_lines(reader: impl BufRead) -> Result<Vec<RefUpdate>> {
    let mut updates = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("failed to read standard input")?;
        if line.trim().is_empty() {
            continue;
        }
        let update = RefUpdate::parse_line(&line)
            .with_context(|| format!("line {}: invalid update", idx + 1))?;
        updates.push(update);
    }
    Ok(updates)
}

fn read_push_event(path: &Path) -> Result<PushEvent> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read push payload from standard input")?;
        text
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read push payload '{}'", path.display()))?
    };
    Ok(PushEvent::from_json(&text)?)
}

/// Fold command-line flags into the highest precedence layer.
///
/// `event_project` names the project when neither a flag nor any
/// configuration layer does.
fn apply_overrides(config: &mut Config, cli: &Cli, event_project: Option<&str>) {
    let overrides = &mut config.overrides;
    if !cli.recipients.is_empty() {
        overrides.recipients = Some(cli.recipients.clone());
    }
    overrides.sender = cli.sender.clone();
    overrides.email_prefix = cli.email_prefix.clone();
    overrides.primary_branch = cli.primary_branch.clone();
    overrides.project = cli.project.clone();

    if config.project().is_none() {
        config.overrides.project = event_project.map(String::from);
    }
}

/// Install the stderr log subscriber.
///
/// `REFNOTIFY_LOG` takes any `EnvFilter` directive and wins over the
/// level implied by `--debug` / `--quiet`.
fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        tracing::metadata::LevelFilter::DEBUG
    } else if cli.quiet {
        tracing::metadata::LevelFilter::ERROR
    } else {
        tracing::metadata::LevelFilter::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Generate shell completion scripts.
fn completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let mut out = io::stdout();

    match shell {
        Shell::Bash => generate(shells::Bash, &mut cmd, &name, &mut out),
        Shell::Zsh => generate(shells::Zsh, &mut cmd, &name, &mut out),
        Shell::Fish => generate(shells::Fish, &mut cmd, &name, &mut out),
        Shell::PowerShell => generate(shells::PowerShell, &mut cmd, &name, &mut out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const A: &str = "abc123def4567890abc123def4567890abc12345";
    const B: &str = "def456abc7890123def456abc7890123def45678";

    #[test]
    fn update_lines() {
        let text = format!("{A} {B} refs/heads/main\n\n{B} {A} refs/tags/v1\n");
        let updates = parse_update_lines(text.as_bytes()).unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].refname.as_str(), "refs/tags/v1");
    }

    #[test]
    fn bad_line_reports_number() {
        let text = format!("{A} {B} refs/heads/main\ngarbage\n");
        let err = parse_update_lines(text.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "line 2: invalid update");
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "refnotify",
            "--stdin",
            "--recipient",
            "cli@example.com",
            "--email-prefix",
            "[x] ",
        ])
        .unwrap();

        let mut config = Config::default();
        config.global.recipients = Some(vec!["file@example.com".to_string()]);
        config.global.sender = Some("Hooks <hooks@example.com>".to_string());
        apply_overrides(&mut config, &cli, Some("acme/widgets"));

        assert_eq!(config.recipients(), ["cli@example.com".to_string()]);
        assert_eq!(config.email_prefix(), Some("[x] "));
        assert_eq!(config.sender(), Some("Hooks <hooks@example.com>"));
        assert_eq!(config.project(), Some("acme/widgets"));
    }

    #[test]
    fn configured_project_beats_event() {
        let cli = Cli::try_parse_from(["refnotify", "--stdin"]).unwrap();
        let mut config = Config::default();
        config.global.project = Some("widgets".to_string());

        apply_overrides(&mut config, &cli, Some("acme/widgets"));
        assert_eq!(config.project(), Some("widgets"));
    }
}
