mod git;
mod github;
mod modules;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use crate::git::{GitCli, Remote, Vcs};
use crate::github::{GhCli, Hosting};
use crate::modules::Module;

const TRUNK_BRANCH: &str = "main";
const PUSH_REMOTE: &str = "origin";
const COMMIT_MESSAGE: &str = "add utils";
const PR_TITLE: &str = "Add utils modules for e2e testing";

/// Scaffolds fixture utility modules onto a fresh branch, pushes it, and
/// opens a pull request for end-to-end tests to act upon.
#[derive(StructOpt)]
struct Opt {
    /// Comma-separated modules to scaffold: `string_utils`, `post_service`.
    #[structopt(long, default_value = "string_utils")]
    include: String,

    /// Push the branch but skip opening a pull request.
    #[structopt(long)]
    disable_pr_creation: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let opt = Opt::from_args();
    let repo_root = git::repo_root(std::env::current_dir()?)?;
    let branch_name = fixture_branch_name(SystemTime::now())?;
    let vcs = GitCli::new(&repo_root);
    let hosting = GhCli::new(&repo_root);
    run(&opt, &repo_root, &branch_name, &vcs, &hosting).await
}

/// The whole flow, linear by construction. The first failing step aborts
/// the run; whatever branch or files already exist are left in place for
/// inspection.
async fn run(
    opt: &Opt,
    repo_root: &Path,
    branch_name: &str,
    vcs: &dyn Vcs,
    hosting: &dyn Hosting,
) -> anyhow::Result<()> {
    let current_branch = vcs.current_branch().await?;
    if current_branch != TRUNK_BRANCH {
        anyhow::bail!(
            "Must be run from `{TRUNK_BRANCH}`, but the current branch is `{current_branch}`."
        );
    }

    let selected = modules::validate_selection(&modules::parse_include(&opt.include))?;

    vcs.create_branch(branch_name).await?;
    modules::materialize(repo_root, &selected)?;
    vcs.stage_all().await?;
    vcs.commit(COMMIT_MESSAGE).await?;
    vcs.push(PUSH_REMOTE, branch_name).await?;
    println!("Pushed `{branch_name}` to {PUSH_REMOTE}.");

    if opt.disable_pr_creation {
        println!("Pull request creation is disabled; `{branch_name}` is ready for manual follow-up.");
        // A non-GitHub remote just loses the hint; the branch name above is
        // the contract.
        let remote_url = vcs.remote_url(PUSH_REMOTE).await?;
        if let Ok(remote) = Remote::parse(&remote_url) {
            println!(
                "Open a pull request by hand at {}",
                remote.compare_url(TRUNK_BRANCH, branch_name),
            );
        }
    } else {
        hosting
            .create_pr(TRUNK_BRANCH, PR_TITLE, &pr_body(&selected))
            .await?;
        hosting.view_pr().await?;
        vcs.checkout(TRUNK_BRANCH).await?;
        println!("Opened a pull request for `{branch_name}` and returned to `{TRUNK_BRANCH}`.");
    }

    Ok(())
}

/// Branch names carry the scaffold time so every invocation gets a fresh
/// branch and, downstream, a fresh pull request.
fn fixture_branch_name(now: SystemTime) -> anyhow::Result<String> {
    let timestamp = now.duration_since(UNIX_EPOCH)?.as_secs();
    Ok(format!("e2e-test-{timestamp}/utils"))
}

fn pr_body(selected: &[&Module]) -> String {
    let mut body = String::from("Scaffolds fixture utility modules for end-to-end testing:\n");
    for module in selected {
        body.push_str(&format!("- `{}` at `{}`\n", module.name, module.path));
    }
    body.push_str("\nGenerated automatically; safe to close once the test run completes.\n");
    body
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
