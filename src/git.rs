use async_trait::async_trait;
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    process::ExitStatus,
};
use tokio::process::Command;
use tracing::debug;

/// Version-control operations the scaffolding flow needs. Kept behind a
/// trait so the flow can run against a recording fake in tests.
#[async_trait]
pub trait Vcs {
    async fn current_branch(&self) -> anyhow::Result<String>;
    async fn create_branch(&self, branch_name: &str) -> anyhow::Result<()>;
    async fn checkout(&self, branch_name: &str) -> anyhow::Result<()>;
    async fn stage_all(&self) -> anyhow::Result<()>;
    async fn commit(&self, message: &str) -> anyhow::Result<()>;
    async fn push(&self, remote: &str, branch_name: &str) -> anyhow::Result<()>;
    async fn remote_url(&self, remote: &str) -> anyhow::Result<String>;
}

/// `git` CLI implementation, running every command at the repo root.
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new("git");
        command.args(args).current_dir(&self.repo_root);
        command
    }

    async fn run(&self, args: &[&str]) -> anyhow::Result<()> {
        let status = self.command(args).status().await?;
        check_status(&format!("git {}", args.join(" ")), status)
    }

    async fn run_capture(&self, args: &[&str]) -> anyhow::Result<String> {
        let output = self.command(args).output().await?;
        check_status(&format!("git {}", args.join(" ")), output.status)?;
        Ok(String::from_utf8(output.stdout)?)
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn current_branch(&self) -> anyhow::Result<String> {
        let stdout = self
            .run_capture(&["rev-parse", "--symbolic-full-name", "HEAD"])
            .await?;
        let Some(branch_name) = stdout.trim().strip_prefix("refs/heads/") else {
            anyhow::bail!("Malformed git ref, expected it to start with `refs/heads/`: {stdout}");
        };
        Ok(branch_name.to_owned())
    }

    async fn create_branch(&self, branch_name: &str) -> anyhow::Result<()> {
        debug!(branch_name, "creating and checking out branch");
        self.run(&["checkout", "-b", branch_name]).await
    }

    async fn checkout(&self, branch_name: &str) -> anyhow::Result<()> {
        debug!(branch_name, "checking out branch");
        self.run(&["checkout", branch_name]).await
    }

    async fn stage_all(&self) -> anyhow::Result<()> {
        self.run(&["add", "-A"]).await
    }

    async fn commit(&self, message: &str) -> anyhow::Result<()> {
        debug!(message, "committing staged changes");
        self.run(&["commit", "-m", message]).await
    }

    async fn push(&self, remote: &str, branch_name: &str) -> anyhow::Result<()> {
        debug!(remote, branch_name, "pushing with upstream tracking");
        self.run(&["push", "--set-upstream", remote, branch_name])
            .await
    }

    async fn remote_url(&self, remote: &str) -> anyhow::Result<String> {
        let url = self.run_capture(&["remote", "get-url", remote]).await?;
        Ok(url.trim().to_owned())
    }
}

/// Walks upward from `cwd` until a directory containing `.git` is found.
pub fn repo_root(cwd: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
    let cwd = cwd.as_ref();
    let mut candidate_path = Some(cwd);
    while let Some(path) = candidate_path {
        if path.join(".git").is_dir() {
            return Ok(path.to_owned());
        }
        candidate_path = path.parent();
    }
    anyhow::bail!("Working directory is not in a Git repo: {cwd:?}");
}

pub(crate) fn check_status(command: &str, status: ExitStatus) -> anyhow::Result<()> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => anyhow::bail!("`{command}` failed with status code {code}."),
        None => anyhow::bail!("`{command}` was killed by a signal before finishing."),
    }
}

/// A GitHub remote, identified by owner and repository name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Remote {
    pub owner: String,
    pub name: String,
}

impl Remote {
    /// Parses the owner/name pair out of an SSH or HTTPS GitHub remote URL.
    pub fn parse(remote_url: &str) -> anyhow::Result<Self> {
        let re = Regex::new(
            r"(?:git@github\.com:|https://github\.com/)(?P<owner>[^/]+)/(?P<name>[^/.]+)(?:\.git)?",
        )?;
        let Some(captures) = re.captures(remote_url) else {
            anyhow::bail!("Remote URL does not look like a GitHub remote: {remote_url}");
        };
        Ok(Remote {
            owner: captures["owner"].trim().to_owned(),
            name: captures["name"].trim().to_owned(),
        })
    }

    /// URL of the GitHub compare view from which a pull request can be
    /// opened by hand.
    pub fn compare_url(&self, base_branch: &str, branch_to_merge: &str) -> String {
        format!(
            "https://github.com/{}/{}/compare/{base_branch}...{branch_to_merge}?expand=1",
            self.owner, self.name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_url_ssh() -> anyhow::Result<()> {
        let remote = Remote::parse("git@github.com:octocat/sandbox.git")?;
        assert_eq!(
            remote,
            Remote {
                owner: "octocat".to_owned(),
                name: "sandbox".to_owned(),
            },
        );
        Ok(())
    }

    #[test]
    fn test_parse_remote_url_https() -> anyhow::Result<()> {
        let remote = Remote::parse("https://github.com/octocat/sandbox")?;
        assert_eq!(
            remote,
            Remote {
                owner: "octocat".to_owned(),
                name: "sandbox".to_owned(),
            },
        );
        Ok(())
    }

    #[test]
    fn test_parse_remote_url_rejects_non_github() {
        assert!(Remote::parse("https://gitlab.com/octocat/sandbox").is_err());
    }

    #[test]
    fn test_compare_url_targets_base_branch() {
        let remote = Remote {
            owner: "octocat".to_owned(),
            name: "sandbox".to_owned(),
        };
        assert_eq!(
            remote.compare_url("main", "e2e-test-1700000000/utils"),
            "https://github.com/octocat/sandbox/compare/main...e2e-test-1700000000/utils?expand=1",
        );
    }
}
