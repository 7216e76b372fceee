use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use crate::git::check_status;

/// Hosting-service operations for the pull-request step. Same fake-friendly
/// seam as [`crate::git::Vcs`].
#[async_trait]
pub trait Hosting {
    /// Opens a pull request from the currently checked-out branch onto
    /// `base_branch`.
    async fn create_pr(&self, base_branch: &str, title: &str, body: &str) -> anyhow::Result<()>;

    /// Opens the current branch's pull request in a browser.
    async fn view_pr(&self) -> anyhow::Result<()>;
}

/// GitHub CLI (`gh`) implementation. `gh` resolves the repository and the
/// head branch from the working copy, so every command runs at the repo
/// root.
pub struct GhCli {
    repo_root: PathBuf,
}

impl GhCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> anyhow::Result<()> {
        let status = Command::new("gh")
            .args(args)
            .current_dir(&self.repo_root)
            .status()
            .await?;
        check_status(&format!("gh {}", args.join(" ")), status)
    }
}

#[async_trait]
impl Hosting for GhCli {
    async fn create_pr(&self, base_branch: &str, title: &str, body: &str) -> anyhow::Result<()> {
        debug!(base_branch, title, "opening pull request");
        self.run(&[
            "pr", "create", "--base", base_branch, "--title", title, "--body", body,
        ])
        .await
    }

    async fn view_pr(&self) -> anyhow::Result<()> {
        self.run(&["pr", "view", "--web"]).await
    }
}
