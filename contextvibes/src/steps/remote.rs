//! Steps that talk to the remote: pull, push, and GitHub CLI calls.

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::workflow::{Step, StepContext};

pub const GH_EXE: &str = "gh";

/// `pull --rebase <remote> <branch>`.
pub struct PullRebase {
    branch: String,
    description: String,
}

impl PullRebase {
    /// Update-main: rebase the local main branch onto its remote.
    pub fn update_main(main: &str) -> Self {
        Self {
            branch: main.to_string(),
            description: format!("Update '{main}' from remote"),
        }
    }

    pub fn branch(branch: &str) -> Self {
        Self {
            branch: branch.to_string(),
            description: format!("Pull latest changes into '{branch}' (rebase)"),
        }
    }
}

impl Step for PullRebase {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        if let Err(err) = ctx.git.pull_rebase(ctx.cancel, &self.branch) {
            ctx.presenter.error(&format!(
                "Pull with rebase from '{}' failed.",
                ctx.git.remote()
            ));
            ctx.presenter.advice(
                "Resolve any conflicts, run 'git rebase --continue' (or 'git rebase --abort'), then try again.",
            );
            return Err(err);
        }
        ctx.presenter
            .success(&format!("'{}' is up to date with '{}'.", self.branch, ctx.git.remote()));
        Ok(())
    }
}

/// Push the current branch only when it is ahead of its upstream.
pub struct PushIfAhead;

impl Step for PushIfAhead {
    fn description(&self) -> String {
        "Push local commits if ahead of remote".to_string()
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        if !ctx.git.is_ahead_of_upstream(ctx.cancel)? {
            ctx.presenter.info("Branch is not ahead of remote; nothing to push.");
            return Ok(());
        }
        ctx.git.push(ctx.cancel, None)?;
        ctx.presenter.success("Pushed local commits.");
        Ok(())
    }
}

/// Push a named branch to the default remote.
pub struct PushBranch {
    branch: String,
}

impl PushBranch {
    pub fn new(branch: &str) -> Self {
        Self {
            branch: branch.to_string(),
        }
    }
}

impl Step for PushBranch {
    fn description(&self) -> String {
        format!("Push '{}' to remote", self.branch)
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.git.push(ctx.cancel, Some(&self.branch))?;
        ctx.presenter
            .success(&format!("Pushed '{}' to '{}'.", self.branch, ctx.git.remote()));
        Ok(())
    }
}

/// Offer to open a pull request with `gh pr create --fill`.
///
/// A missing GitHub CLI is a warning, not a failure; the branch is already
/// pushed by the time this runs.
pub struct CreatePullRequest {
    branch: String,
    web: bool,
}

impl CreatePullRequest {
    pub fn new(branch: &str, web: bool) -> Self {
        Self {
            branch: branch.to_string(),
            web,
        }
    }

    fn args(&self) -> Vec<&'static str> {
        let mut args = vec!["pr", "create", "--fill"];
        if self.web {
            args.push("--web");
        }
        args
    }
}

impl Step for CreatePullRequest {
    fn description(&self) -> String {
        format!("Offer to create a pull request for '{}'", self.branch)
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        if !ctx.exec.command_exists(GH_EXE) {
            ctx.presenter
                .warning("GitHub CLI (gh) not found; skipping pull request creation.");
            ctx.presenter
                .advice("Install it from https://cli.github.com or open the pull request on the web.");
            return Ok(());
        }
        if !ctx.confirm(&format!("Create a pull request for '{}'?", self.branch))? {
            ctx.presenter.info("Skipped pull request creation.");
            return Ok(());
        }
        let args = self.args();
        debug!(args = ?args, "creating pull request");
        ctx.exec
            .execute(ctx.cancel, ctx.git.work_tree(), GH_EXE, &args)
            .context("create pull request with gh")?;
        info!(branch = %self.branch, "pull request created");
        ctx.presenter.success("Pull request created.");
        Ok(())
    }
}

/// `gh issue create` against a feedback repository.
pub struct CreateIssue {
    repo: String,
    title: String,
    body: String,
}

impl CreateIssue {
    pub fn new(repo: &str, title: &str, body: &str) -> Self {
        Self {
            repo: repo.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        }
    }
}

impl Step for CreateIssue {
    fn description(&self) -> String {
        format!("Open issue '{}' in {}", self.title, self.repo)
    }

    fn pre_check(&self, ctx: &StepContext<'_>) -> Result<()> {
        if !ctx.exec.command_exists(GH_EXE) {
            ctx.presenter
                .advice("Install the GitHub CLI from https://cli.github.com and run 'gh auth login'.");
            return Err(anyhow!("GitHub CLI (gh) not found on PATH"));
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let args = [
            "issue",
            "create",
            "--repo",
            self.repo.as_str(),
            "--title",
            self.title.as_str(),
            "--body",
            self.body.as_str(),
        ];
        ctx.exec
            .execute(ctx.cancel, ctx.git.work_tree(), GH_EXE, &args)
            .with_context(|| format!("create issue in {}", self.repo))?;
        ctx.presenter.success(&format!("Issue opened in {}.", self.repo));
        Ok(())
    }
}
