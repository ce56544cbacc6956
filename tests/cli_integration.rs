//! Integration tests for the refnotify binary.
//!
//! Every invocation runs with `--dry-run` so messages are printed instead
//! of handed to sendmail, and with an isolated home directory so no user
//! configuration leaks in.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use common::TestRepo;

const ZERO: &str = "0000000000000000000000000000000000000000";
const GHOST: &str = "1234567890123456789012345678901234567890";

/// A refnotify command with a clean environment.
fn refnotify(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("refnotify").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("USER", "tester")
        .env_remove("REFNOTIFY_CONFIG")
        .env_remove("REFNOTIFY_RECIPIENTS")
        .env_remove("REFNOTIFY_ANNOUNCE_RECIPIENTS")
        .env_remove("REFNOTIFY_SENDER")
        .env_remove("REFNOTIFY_EMAIL_PREFIX")
        .env_remove("REFNOTIFY_LOG");
    cmd
}

#[test]
fn version_flag() {
    let home = TempDir::new().unwrap();
    refnotify(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("refnotify"));
}

#[test]
fn bash_completions() {
    let home = TempDir::new().unwrap();
    refnotify(&home)
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_refnotify"));
}

#[test]
fn missing_update_arguments_rejected() {
    let home = TempDir::new().unwrap();
    refnotify(&home).assert().failure();
}

#[test]
fn dry_run_prints_message() {
    let home = TempDir::new().unwrap();
    let repo = TestRepo::new();
    let old = repo.rev_parse("HEAD");
    let new = repo.commit("Add widget");

    refnotify(&home)
        .arg("-C")
        .arg(repo.path())
        .args([
            "--dry-run",
            "--no-fetch",
            "--recipient",
            "commits@example.com",
            "--project",
            "widgets",
            "refs/heads/main",
            old.as_str(),
            new.as_str(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("To: commits@example.com\n"))
        .stdout(predicate::str::contains("Subject: [widgets] Add widget\n"))
        .stdout(predicate::str::contains("X-Git-Refname: refs/heads/main\n"))
        .stdout(predicate::str::contains(format!("commit {}", new)));
}

#[test]
fn sender_flag_sets_from_header() {
    let home = TempDir::new().unwrap();
    let repo = TestRepo::new();
    let head = repo.rev_parse("HEAD");

    refnotify(&home)
        .arg("-C")
        .arg(repo.path())
        .args([
            "-n",
            "--no-fetch",
            "--recipient",
            "commits@example.com",
            "--sender",
            "Hooks <hooks@example.com>",
            "refs/heads/main",
            ZERO,
            head.as_str(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("From: Hooks <hooks@example.com>\n"));
}

#[test]
fn repository_config_file_is_read() {
    let home = TempDir::new().unwrap();
    let repo = TestRepo::new();
    let head = repo.rev_parse("HEAD");
    std::fs::write(
        repo.path().join(".git/refnotify.toml"),
        "project = \"gadgets\"\nrecipients = [\"repo@example.com\"]\n",
    )
    .unwrap();

    refnotify(&home)
        .arg("-C")
        .arg(repo.path())
        .args(["-n", "--no-fetch", "refs/heads/main", ZERO, head.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("To: repo@example.com\n"))
        .stdout(predicate::str::contains("Subject: [gadgets] "));
}

#[test]
fn tracking_branch_is_not_an_error() {
    let home = TempDir::new().unwrap();
    let repo = TestRepo::new();
    let head = repo.rev_parse("HEAD");

    refnotify(&home)
        .arg("-C")
        .arg(repo.path())
        .args([
            "-n",
            "--no-fetch",
            "--recipient",
            "commits@example.com",
            "refs/remotes/origin/main",
            ZERO,
            head.as_str(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn missing_recipients_fail() {
    let home = TempDir::new().unwrap();
    let repo = TestRepo::new();
    let head = repo.rev_parse("HEAD");

    refnotify(&home)
        .arg("-C")
        .arg(repo.path())
        .args(["-n", "--no-fetch", "refs/heads/main", ZERO, head.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no recipients"));
}

#[test]
fn stdin_batch_reports_failures_after_sending_the_rest() {
    let home = TempDir::new().unwrap();
    let repo = TestRepo::new();
    let old = repo.rev_parse("HEAD");
    let new = repo.commit("Good change");
    let input = format!(
        "{ZERO} {GHOST} refs/heads/ghost\n{} {} refs/heads/main\n",
        old, new
    );

    refnotify(&home)
        .arg("-C")
        .arg(repo.path())
        .args([
            "-n",
            "--no-fetch",
            "--recipient",
            "commits@example.com",
            "--stdin",
        ])
        .write_stdin(input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Subject: [").and(predicate::str::contains("Good change")))
        .stderr(predicate::str::contains("1 of 2 update(s) failed"));
}

#[test]
fn stdin_rejects_malformed_lines() {
    let home = TempDir::new().unwrap();
    let repo = TestRepo::new();

    refnotify(&home)
        .arg("-C")
        .arg(repo.path())
        .args(["-n", "--no-fetch", "--recipient", "c@example.com", "--stdin"])
        .write_stdin("not an update\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1: invalid update"));
}

#[test]
fn push_event_names_the_project() {
    let home = TempDir::new().unwrap();
    let repo = TestRepo::new();
    let old = repo.rev_parse("HEAD");
    let new = repo.commit("Webhook change");

    let payload = home.path().join("push.json");
    std::fs::write(
        &payload,
        format!(
            r#"{{
                "ref": "refs/heads/main",
                "before": "{}",
                "after": "{}",
                "repository": {{ "full_name": "acme/widgets" }},
                "pusher": {{ "name": "jdoe" }}
            }}"#,
            old, new
        ),
    )
    .unwrap();

    refnotify(&home)
        .arg("-C")
        .arg(repo.path())
        .args(["-n", "--no-fetch", "--recipient", "commits@example.com"])
        .arg("--push-event")
        .arg(&payload)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Subject: [acme/widgets] Webhook change\n",
        ));
}

#[test]
fn missing_repository_without_clone_source_fails() {
    let home = TempDir::new().unwrap();
    let absent = home.path().join("absent.git");

    refnotify(&home)
        .arg("-C")
        .arg(&absent)
        .args([
            "-n",
            "--recipient",
            "commits@example.com",
            "refs/heads/main",
            ZERO,
            GHOST,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn missing_repository_is_cloned_from_source() {
    let home = TempDir::new().unwrap();
    let source = TestRepo::new();
    let old = source.rev_parse("HEAD");
    let new = source.commit("Mirrored change");
    let mirror = home.path().join("mirror.git");

    refnotify(&home)
        .arg("-C")
        .arg(&mirror)
        .arg("--clone-url")
        .arg(source.path())
        .args([
            "-n",
            "--recipient",
            "commits@example.com",
            "refs/heads/main",
            old.as_str(),
            new.as_str(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Subject: [mirror] Mirrored change\n"));

    assert!(mirror.join("HEAD").exists());
}
