//! Shared fixtures for integration tests.
//!
//! Repositories are built with the real `git` CLI in temporary
//! directories. Every commit and tag carries the same fixed date so
//! rendered output is stable.

#![allow(dead_code)]

use std::cell::Cell;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use refnotify::core::types::{Oid, RefUpdate};
use refnotify::git::Git;

/// Date stamped on every commit and tag.
pub const FIXED_DATE: &str = "2026-10-13T09:12:44+02:00";

/// Test fixture that creates a real git repository on branch `main`.
pub struct TestRepo {
    dir: TempDir,
    counter: Cell<usize>,
}

impl TestRepo {
    /// Create a new test repository with an initial commit.
    pub fn new() -> Self {
        let repo = Self::empty();
        repo.commit("Initial commit");
        repo
    }

    /// Create a repository with no commits yet.
    pub fn empty() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init", "--quiet"]);
        run_git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        run_git(dir.path(), &["config", "commit.gpgsign", "false"]);
        run_git(dir.path(), &["config", "tag.gpgsign", "false"]);

        Self {
            dir,
            counter: Cell::new(0),
        }
    }

    /// Get the path to the repository.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Open a Git interface to this repository.
    pub fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    /// Commit a fresh file, returning the new commit id.
    pub fn commit(&self, message: &str) -> Oid {
        let n = self.counter.get() + 1;
        self.counter.set(n);
        self.commit_file(&format!("file{n}.txt"), &format!("content {n}\n"), message)
    }

    /// Write a file and commit it, returning the new commit id.
    pub fn commit_file(&self, path: &str, content: &str, message: &str) -> Oid {
        std::fs::write(self.path().join(path), content).unwrap();
        self.git_cmd(&["add", path]);
        self.git_cmd(&["commit", "--quiet", "-m", message]);
        self.rev_parse("HEAD")
    }

    /// Commit as a different author.
    pub fn commit_as(&self, author: &str, message: &str) -> Oid {
        let n = self.counter.get() + 1;
        self.counter.set(n);
        let path = format!("file{n}.txt");
        std::fs::write(self.path().join(&path), format!("content {n}\n")).unwrap();
        self.git_cmd(&["add", &path]);
        self.git_cmd(&["commit", "--quiet", "--author", author, "-m", message]);
        self.rev_parse("HEAD")
    }

    /// Commit a fresh file with a raw message recorded as ISO-8859-1.
    pub fn commit_latin1(&self, message: &[u8]) -> Oid {
        let n = self.counter.get() + 1;
        self.counter.set(n);
        let path = format!("file{n}.txt");
        std::fs::write(self.path().join(&path), format!("content {n}\n")).unwrap();
        let message_file = self.path().join(".git/LATIN1_MSG");
        std::fs::write(&message_file, message).unwrap();
        self.git_cmd(&["add", &path]);
        self.git_cmd(&[
            "-c",
            "i18n.commitEncoding=ISO-8859-1",
            "commit",
            "--quiet",
            "-F",
            message_file.to_str().unwrap(),
        ]);
        self.rev_parse("HEAD")
    }

    pub fn checkout(&self, name: &str) {
        self.git_cmd(&["checkout", "--quiet", name]);
    }

    /// Create and switch to a branch at the current HEAD.
    pub fn checkout_new(&self, name: &str) {
        self.git_cmd(&["checkout", "--quiet", "-b", name]);
    }

    /// Create and switch to a branch with no history.
    pub fn checkout_orphan(&self, name: &str) {
        self.git_cmd(&["checkout", "--quiet", "--orphan", name]);
    }

    /// Move the current branch and worktree to `rev`.
    pub fn reset_hard(&self, rev: &str) {
        self.git_cmd(&["reset", "--quiet", "--hard", rev]);
    }

    pub fn tag_annotated(&self, name: &str, target: &str, message: &str) -> Oid {
        self.git_cmd(&["tag", "-a", name, target, "-m", message]);
        self.rev_parse(&format!("refs/tags/{name}"))
    }

    pub fn tag_lightweight(&self, name: &str, target: &str) {
        self.git_cmd(&["tag", name, target]);
    }

    pub fn update_ref(&self, refname: &str, target: &str) {
        self.git_cmd(&["update-ref", refname, target]);
    }

    pub fn delete_ref(&self, refname: &str) {
        self.git_cmd(&["update-ref", "-d", refname]);
    }

    /// Resolve a revision to an id without peeling tags.
    pub fn rev_parse(&self, rev: &str) -> Oid {
        Oid::new(self.git_output(&["rev-parse", rev])).unwrap()
    }

    /// Run git in the repository and return its trimmed stdout.
    pub fn git_output(&self, args: &[&str]) -> String {
        let output = git_command(self.path(), args)
            .output()
            .expect("git command failed");
        if !output.status.success() {
            panic!(
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    pub fn git_cmd(&self, args: &[&str]) {
        run_git(self.path(), args);
    }
}

/// Build an update triple.
pub fn update(refname: &str, old: &Oid, new: &Oid) -> RefUpdate {
    RefUpdate::from_parts(refname, old.as_str(), new.as_str()).unwrap()
}

/// Run a git command in the given directory.
pub fn run_git(dir: &Path, args: &[&str]) {
    let output = git_command(dir, args).output().expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

fn git_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_DATE", FIXED_DATE)
        .env("GIT_COMMITTER_DATE", FIXED_DATE)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE");
    cmd
}
