//! GitHub API helpers: list the files of a pull request and post the
//! review as a pull request comment.

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;

use crate::changes::ChangeSet;

const COMMENT_MARKER: &str = "<!-- covreview-comment -->";
const API: &str = "https://api.github.com";

/// Resolved GitHub Actions context, read from environment variables.
pub struct Context {
    token: String,
    repo: String,
    pr_number: u64,
}

impl Context {
    /// Build a context from standard GitHub Actions environment variables
    /// (`GITHUB_TOKEN`, `GITHUB_REPOSITORY`, `GITHUB_REF`).
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("GITHUB_TOKEN")
            .context("GITHUB_TOKEN environment variable is required")?;
        let repo = std::env::var("GITHUB_REPOSITORY")
            .context("GITHUB_REPOSITORY environment variable is required")?;
        let github_ref = std::env::var("GITHUB_REF").unwrap_or_default();
        let pr_number = pr_number_from_ref(&github_ref)
            .context("could not determine PR number from GITHUB_REF")?;
        Ok(Self {
            token,
            repo,
            pr_number,
        })
    }

    /// Changed files of the pull request, with its head commit.
    pub fn fetch_changes(&self) -> Result<ChangeSet> {
        tracing::info!(repo = %self.repo, pr = self.pr_number, "fetching pull request files");

        let mut files = Vec::new();
        let mut page = 1u32;
        loop {
            let url = format!(
                "{API}/repos/{}/pulls/{}/files?per_page=100&page={page}",
                self.repo, self.pr_number
            );
            let batch: Vec<PullFile> = self
                .get(&url)
                .call()
                .context("Failed to list pull request files")?
                .into_json()
                .context("Failed to parse pull request files JSON")?;
            if batch.is_empty() {
                break;
            }
            files.extend(batch);
            page += 1;
        }

        let url = format!("{API}/repos/{}/pulls/{}", self.repo, self.pr_number);
        let pull: Pull = self
            .get(&url)
            .call()
            .context("Failed to fetch pull request")?
            .into_json()
            .context("Failed to parse pull request JSON")?;

        let mut changes = changes_from_files(files);
        changes.commits.push(pull.head.sha);
        Ok(changes)
    }

    /// Create or update the review comment on the pull request.
    pub fn post_comment(&self, body: &str) -> Result<()> {
        let body_with_marker = format!("{COMMENT_MARKER}\n{body}");
        let payload = serde_json::json!({ "body": body_with_marker });

        let resp = match self.find_existing_comment()? {
            Some(comment_id) => {
                let url = format!("{API}/repos/{}/issues/comments/{comment_id}", self.repo);
                self.request("PATCH", &url).send_json(payload)
            }
            None => {
                let url = format!(
                    "{API}/repos/{}/issues/{}/comments",
                    self.repo, self.pr_number
                );
                self.request("POST", &url).send_json(payload)
            }
        };

        match resp {
            Ok(_) => {}
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                bail!("GitHub API error posting comment (HTTP {code}): {body}");
            }
            Err(e) => bail!("Failed to post comment: {e}"),
        }

        tracing::info!(repo = %self.repo, pr = self.pr_number, "comment posted");
        Ok(())
    }

    /// Find an existing review comment (by our hidden marker).
    fn find_existing_comment(&self) -> Result<Option<u64>> {
        let mut page = 1u32;
        loop {
            let url = format!(
                "{API}/repos/{}/issues/{}/comments?per_page=100&page={page}",
                self.repo, self.pr_number
            );
            let comments: Vec<Comment> = self
                .get(&url)
                .call()
                .context("Failed to list PR comments")?
                .into_json()
                .context("Failed to parse comments JSON")?;
            if comments.is_empty() {
                return Ok(None);
            }
            if let Some(c) = comments
                .iter()
                .find(|c| c.body.as_deref().is_some_and(|b| b.contains(COMMENT_MARKER)))
            {
                return Ok(Some(c.id));
            }
            page += 1;
        }
    }

    fn get(&self, url: &str) -> ureq::Request {
        self.request("GET", url)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        ureq::request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "covreview")
            .set("X-GitHub-Api-Version", "2022-11-28")
    }
}

/// Extract PR number from a ref (e.g. "refs/pull/42/merge" → 42).
fn pr_number_from_ref(github_ref: &str) -> Option<u64> {
    let parts: Vec<&str> = github_ref.split('/').collect();
    if parts.len() >= 3 && parts[0] == "refs" && parts[1] == "pull" {
        parts[2].parse().ok()
    } else {
        None
    }
}

#[derive(Deserialize)]
struct Comment {
    id: u64,
    body: Option<String>,
}

#[derive(Deserialize)]
struct PullFile {
    filename: String,
    status: String,
}

#[derive(Deserialize)]
struct Pull {
    head: PullHead,
}

#[derive(Deserialize)]
struct PullHead {
    sha: String,
}

/// Classify pull request files by their GitHub status.
fn changes_from_files(files: Vec<PullFile>) -> ChangeSet {
    let mut changes = ChangeSet::default();
    for file in files {
        match file.status.as_str() {
            "added" | "copied" | "renamed" => changes.created.push(file.filename),
            "modified" | "changed" => changes.modified.push(file.filename),
            _ => {}
        }
    }
    changes
}
