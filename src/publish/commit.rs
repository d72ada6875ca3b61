//! Commit and push the asset tree.
//!
//! Sequence: `status --porcelain --branch`, then `add -A` and
//! `commit -m <message>` when the tree is dirty, then `push <remote> <branch>`
//! when anything is committed but not yet on the remote. A clean tree that is
//! level with its upstream needs nothing. The first failing step ends the
//! attempt; the next attempt picks up an earlier commit whose push failed.

use anyhow::{Context, Result};
use std::{path::PathBuf, time::Duration};

use super::PublishError;
use crate::config::RepoConfig;
use crate::event;
use crate::logger::EventSink;
use crate::utils::exec::Cmd;

/// Runs version control commands in the repository root.
pub trait VcsRunner: Send + Sync {
    /// Run with `args`; returns stdout. Non-zero exit or timeout is an error.
    fn run(&self, args: &[&str]) -> Result<String>;
}

/// `git` subprocess with a per-call timeout.
pub struct GitCli {
    root: PathBuf,
    timeout: Duration,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }
}

impl VcsRunner for GitCli {
    fn run(&self, args: &[&str]) -> Result<String> {
        let git = which::which("git").context("git not found in PATH")?;
        let output = Cmd::new(git)
            .args(args)
            .cwd(&self.root)
            .timeout(self.timeout)
            .run()?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Result of one commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Auto-commit disabled.
    Skipped,
    /// Working tree clean.
    NothingToCommit,
    Pushed,
    Failed(String),
}

impl CommitOutcome {
    /// A clean tree counts as success; a disabled commit does not.
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::NothingToCommit | Self::Pushed)
    }
}

/// Commit everything and push, when `repo.auto_commit` is on.
///
/// `message` overrides `repo.commit_message`.
pub fn commit_and_push(
    repo: &RepoConfig,
    message: Option<&str>,
    vcs: &dyn VcsRunner,
    sink: &dyn EventSink,
) -> CommitOutcome {
    if !repo.auto_commit {
        event!(sink, "commit"; "[SKIP] auto-commit disabled");
        return CommitOutcome::Skipped;
    }

    let message = message.unwrap_or(&repo.commit_message);
    match try_commit(repo, message, vcs) {
        Ok(CommitOutcome::NothingToCommit) => {
            event!(sink, "commit"; "nothing to commit");
            CommitOutcome::NothingToCommit
        }
        Ok(outcome) => {
            event!(sink, "commit"; "pushed to {}/{}", repo.remote, repo.branch);
            outcome
        }
        Err(e) => {
            event!(sink, "commit"; "[ERROR] {e}");
            CommitOutcome::Failed(e.to_string())
        }
    }
}

fn try_commit(
    repo: &RepoConfig,
    message: &str,
    vcs: &dyn VcsRunner,
) -> Result<CommitOutcome, PublishError> {
    let status = step(vcs, "status", &["status", "--porcelain", "--branch"])?;
    let status = WorkTree::parse(&status);
    if !status.dirty && !status.ahead {
        return Ok(CommitOutcome::NothingToCommit);
    }

    if status.dirty {
        step(vcs, "add", &["add", "-A"])?;
        step(vcs, "commit", &["commit", "-m", message])?;
    }
    step(vcs, "push", &["push", &repo.remote, &repo.branch])?;
    Ok(CommitOutcome::Pushed)
}

/// Parsed `git status --porcelain --branch`.
#[derive(Debug, Default, PartialEq, Eq)]
struct WorkTree {
    /// Uncommitted changes present.
    dirty: bool,
    /// Local commits not on the upstream yet.
    ahead: bool,
}

impl WorkTree {
    fn parse(output: &str) -> Self {
        let mut tree = Self::default();
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            match line.strip_prefix("## ") {
                Some(branch) => tree.ahead = branch.contains("[ahead ") || branch.contains(", ahead "),
                None => tree.dirty = true,
            }
        }
        tree
    }
}

fn step(vcs: &dyn VcsRunner, name: &'static str, args: &[&str]) -> Result<String, PublishError> {
    vcs.run(args).map_err(|e| PublishError::Vcs {
        step: name,
        message: format!("{e:#}"),
    })
}


#[cfg(test)]
mod tests {
    use super::fake::FakeVcs;
    use super::*;
    use crate::logger::MemorySink;

    fn enabled() -> RepoConfig {
        RepoConfig {
            auto_commit: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_disabled_skips() {
        let vcs = FakeVcs::dirty();
        let outcome = commit_and_push(&RepoConfig::default(), None, &vcs, &MemorySink::new());
        assert_eq!(outcome, CommitOutcome::Skipped);
        assert!(!outcome.succeeded());
        assert!(vcs.calls.lock().is_empty());
    }

    #[test]
    fn test_clean_tree_is_success() {
        let vcs = FakeVcs::default();
        let outcome = commit_and_push(&enabled(), None, &vcs, &MemorySink::new());
        assert_eq!(outcome, CommitOutcome::NothingToCommit);
        assert!(outcome.succeeded());
        assert_eq!(vcs.subcommands(), vec!["status"]);
    }

    #[test]
    fn test_full_sequence() {
        let vcs = FakeVcs::dirty();
        let outcome = commit_and_push(&enabled(), Some("heal: 2 repairs"), &vcs, &MemorySink::new());
        assert_eq!(outcome, CommitOutcome::Pushed);

        let calls = vcs.calls.lock();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[1], vec!["add", "-A"]);
        assert_eq!(calls[2], vec!["commit", "-m", "heal: 2 repairs"]);
        assert_eq!(calls[3], vec!["push", "origin", "main"]);
    }

    #[test]
    fn test_failure_stops_sequence() {
        let vcs = FakeVcs::failing("commit", None);
        let sink = MemorySink::new();
        let outcome = commit_and_push(&enabled(), None, &vcs, &sink);

        assert!(matches!(outcome, CommitOutcome::Failed(ref m) if m.contains("git commit failed")));
        assert_eq!(vcs.subcommands(), vec!["status", "add", "commit"]);
        assert!(sink.contains("[ERROR] git commit failed"));
    }

    #[test]
    fn test_unpushed_commit_is_pushed_on_next_attempt() {
        let vcs = FakeVcs::failing("push", Some(1));
        let sink = MemorySink::new();

        let first = commit_and_push(&enabled(), None, &vcs, &sink);
        assert!(matches!(first, CommitOutcome::Failed(_)));

        // tree is clean now but the commit never reached the remote
        let second = commit_and_push(&enabled(), None, &vcs, &sink);
        assert_eq!(second, CommitOutcome::Pushed);
        assert_eq!(
            vcs.subcommands(),
            vec!["status", "add", "commit", "push", "status", "push"]
        );

        let third = commit_and_push(&enabled(), None, &vcs, &sink);
        assert_eq!(third, CommitOutcome::NothingToCommit);
    }

    #[test]
    fn test_parse_work_tree() {
        assert_eq!(WorkTree::parse("## main...origin/main\n"), WorkTree::default());
        assert_eq!(
            WorkTree::parse("## main...origin/main [ahead 2]\n"),
            WorkTree {
                dirty: false,
                ahead: true
            }
        );
        assert_eq!(
            WorkTree::parse("## main...origin/main [ahead 1, behind 3]\n?? new.svg\n"),
            WorkTree {
                dirty: true,
                ahead: true
            }
        );
        // no upstream configured
        assert_eq!(WorkTree::parse("## main\n"), WorkTree::default());
        assert!(WorkTree::parse(" M a.json\n").dirty);
    }
}
