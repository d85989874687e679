/// The set of files created or modified by the change under review, plus
/// the commits it contains.
///
/// Also provides a [`ChangeSource`] trait that abstracts over the ways a
/// change-set can be obtained (explicit lists, git, a unified diff on stdin,
/// the GitHub API).
use std::process::Command;

use anyhow::{Context, Result};

use crate::github;

/// Paths are repository-relative, exactly as the host reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub created: Vec<String>,
    pub modified: Vec<String>,
    /// Commit SHAs, oldest first.
    pub commits: Vec<String>,
}

impl ChangeSet {
    /// Whether `path` was created or modified. Exact match only.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.created.iter().chain(&self.modified).any(|p| p == path)
    }

    /// The commit that links in the report should point at.
    #[must_use]
    pub fn head_sha(&self) -> Option<&str> {
        self.commits.last().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Change sources
// ---------------------------------------------------------------------------

/// A source for obtaining the change-set of a review.
pub trait ChangeSource {
    fn fetch_changes(&self) -> Result<ChangeSet>;
}

/// Change-set given directly, e.g. from command-line flags.
pub struct ExplicitChanges(pub ChangeSet);

impl ChangeSource for ExplicitChanges {
    fn fetch_changes(&self) -> Result<ChangeSet> {
        Ok(self.0.clone())
    }
}

/// Unified diff read from stdin.
pub struct StdinDiff;

impl ChangeSource for StdinDiff {
    fn fetch_changes(&self) -> Result<ChangeSet> {
        let text =
            std::io::read_to_string(std::io::stdin()).context("Failed to read diff from stdin")?;
        Ok(parse_diff(&text))
    }
}

/// Change-set from `git diff --name-status` (e.g. `main...HEAD`).
pub struct GitChanges {
    /// Arguments to pass to `git diff`.
    pub args: String,
}

impl ChangeSource for GitChanges {
    fn fetch_changes(&self) -> Result<ChangeSet> {
        let diff_args: Vec<&str> = self.args.split_whitespace().collect();
        let status = run_git(
            Command::new("git")
                .arg("diff")
                .arg("--name-status")
                .args(&diff_args),
        )?;
        let mut changes = parse_name_status(&status);

        match run_git(Command::new("git").args(["rev-parse", "HEAD"])) {
            Ok(sha) => changes.commits.push(sha.trim().to_string()),
            Err(e) => tracing::warn!("could not resolve HEAD, links disabled: {e:#}"),
        }
        Ok(changes)
    }
}

fn run_git(cmd: &mut Command) -> Result<String> {
    let output = cmd.output().context("Failed to run git")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git failed: {stderr}");
    }
    String::from_utf8(output.stdout).context("git output not valid UTF-8")
}

/// Change-set of a GitHub pull request.
pub struct GitHubChanges {
    /// The resolved GitHub context.
    pub context: github::Context,
}

impl GitHubChanges {
    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        let context = github::Context::from_env()?;
        Ok(Self { context })
    }
}

impl ChangeSource for GitHubChanges {
    fn fetch_changes(&self) -> Result<ChangeSet> {
        self.context.fetch_changes()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse `git diff --name-status` output. Added, copied and renamed files
/// count as created (under their new path); modified and type-changed files
/// as modified; deletions are dropped.
pub fn parse_name_status(text: &str) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for line in text.lines() {
        let mut fields = line.split('\t');
        let Some(status) = fields.next() else {
            continue;
        };
        // Renames and copies carry both paths; the last one is the new path.
        let Some(path) = fields.last() else {
            continue;
        };
        let path = path.to_string();
        match status.chars().next() {
            Some('A' | 'C' | 'R') => changes.created.push(path),
            Some('M' | 'T') => changes.modified.push(path),
            _ => {}
        }
    }

    changes
}

/// Parse a unified diff and classify every touched file. A `--- /dev/null`
/// source marks a new file; a `+++ /dev/null` target marks a deletion.
pub fn parse_diff(diff_text: &str) -> ChangeSet {
    let mut changes = ChangeSet::default();
    let mut from_null = false;

    for line in diff_text.lines() {
        if let Some(rest) = line.strip_prefix("--- ") {
            from_null = rest.trim_end() == "/dev/null";
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            let rest = rest.trim_end();
            if rest == "/dev/null" {
                continue;
            }
            // Strip common VCS prefixes: "b/" (default git), "a/" (some tools).
            let path = rest
                .strip_prefix("b/")
                .or_else(|| rest.strip_prefix("a/"))
                .unwrap_or(rest)
                .to_string();
            if from_null {
                changes.created.push(path);
            } else {
                changes.modified.push(path);
            }
        }
    }

    changes
}
