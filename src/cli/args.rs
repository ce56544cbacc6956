//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Input Modes
//!
//! Exactly one of:
//! - `<REFNAME> <OLD> <NEW>`: a single update, as passed to an `update` hook
//! - `--stdin`: `<old> <new> <ref>` lines, as fed to a `post-receive` hook
//! - `--push-event <FILE>`: a forge push webhook payload (`-` for stdin)
//!
//! # Configuration Flags
//!
//! `--project`, `--recipient`, `--sender`, `--email-prefix` and
//! `--primary-branch` override every configuration file and environment
//! variable.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// refnotify - Email notifications for pushed reference updates
#[derive(Parser, Debug)]
#[command(name = "refnotify")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
EXAMPLES:
    # As a post-receive hook inside the pushed repository
    refnotify --stdin

    # Preview the report for one update without sending it
    refnotify --dry-run refs/heads/main 1a2b3c4... 5d6e7f8...

    # Handle a forwarded push webhook against a local mirror
    refnotify --repo /srv/mirrors/widgets.git --push-event payload.json")]
pub struct Cli {
    /// Reference that changed, e.g. refs/heads/main
    #[arg(
        value_name = "REFNAME",
        requires_all = ["old", "new"],
        required_unless_present_any = ["stdin", "push_event", "completions"]
    )]
    pub refname: Option<String>,

    /// Previous object id (all zeros for a creation)
    #[arg(value_name = "OLD")]
    pub old: Option<String>,

    /// New object id (all zeros for a deletion)
    #[arg(value_name = "NEW")]
    pub new: Option<String>,

    /// Read `<old> <new> <ref>` lines from standard input
    #[arg(long, conflicts_with_all = ["refname", "push_event"])]
    pub stdin: bool,

    /// Read a push webhook payload from FILE ('-' for standard input)
    #[arg(long, value_name = "FILE", conflicts_with = "refname")]
    pub push_event: Option<PathBuf>,

    /// Repository or mirror to read
    #[arg(long, short = 'C', value_name = "PATH", default_value = ".")]
    pub repo: PathBuf,

    /// Clone the mirror from URL when --repo does not exist
    #[arg(long, value_name = "URL")]
    pub clone_url: Option<String>,

    /// Do not fetch from origin before processing
    #[arg(long)]
    pub no_fetch: bool,

    /// Login of the pushing user, looked up in the authors file
    #[arg(long, value_name = "LOGIN")]
    pub pusher: Option<String>,

    /// Print messages to stdout instead of sending them
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Project name used in the preamble and subject prefix
    #[arg(long, value_name = "NAME")]
    pub project: Option<String>,

    /// Recipient address (repeatable)
    #[arg(long = "recipient", value_name = "ADDRESS")]
    pub recipients: Vec<String>,

    /// Fallback From: identity
    #[arg(long, value_name = "IDENTITY")]
    pub sender: Option<String>,

    /// Subject prefix, used verbatim
    #[arg(long, value_name = "PREFIX")]
    pub email_prefix: Option<String>,

    /// Branch whose history always counts as already reported
    #[arg(long, value_name = "BRANCH")]
    pub primary_branch: Option<String>,

    /// Enable debug logging
    #[arg(long, conflicts_with = "quiet")]
    pub debug: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Shells supported by `--completions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
