//! Branch gates and branch creation.

use anyhow::{Result, anyhow};
use tracing::info;

use crate::workflow::{Step, StepContext};

/// Refuse to continue on the main branch.
pub struct EnsureNotMain {
    main: String,
    refusal: String,
}

impl EnsureNotMain {
    /// `refusal` is the error reported when the current branch is main.
    pub fn new(main: &str, refusal: &str) -> Self {
        Self {
            main: main.to_string(),
            refusal: refusal.to_string(),
        }
    }
}

impl Step for EnsureNotMain {
    fn description(&self) -> String {
        format!("Verify current branch is not '{}'", self.main)
    }

    fn pre_check(&self, ctx: &StepContext<'_>) -> Result<()> {
        let branch = ctx.git.current_branch(ctx.cancel)?;
        if branch == self.main {
            ctx.presenter.error(&self.refusal);
            ctx.presenter
                .advice("Switch to a feature branch first, e.g. 'contextvibes kickoff --branch feature/<name>'.");
            return Err(anyhow!("{}", self.refusal));
        }
        Ok(())
    }

    fn execute(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Require the current branch to be main.
pub struct CheckOnMain {
    main: String,
}

impl CheckOnMain {
    pub fn new(main: &str) -> Self {
        Self {
            main: main.to_string(),
        }
    }
}

impl Step for CheckOnMain {
    fn description(&self) -> String {
        format!("Verify current branch is '{}'", self.main)
    }

    fn pre_check(&self, ctx: &StepContext<'_>) -> Result<()> {
        let branch = ctx.git.current_branch(ctx.cancel)?;
        if branch != self.main {
            ctx.presenter
                .advice(&format!("Run 'git switch {}' and try again.", self.main));
            return Err(anyhow!(
                "must be on '{}' to start a new branch (currently on '{branch}')",
                self.main
            ));
        }
        Ok(())
    }

    fn execute(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Require no staged, unstaged, or untracked changes.
pub struct EnsureCleanTree;

impl Step for EnsureCleanTree {
    fn description(&self) -> String {
        "Verify working tree is clean".to_string()
    }

    fn pre_check(&self, ctx: &StepContext<'_>) -> Result<()> {
        if !ctx.git.is_working_tree_clean(ctx.cancel)? {
            ctx.presenter
                .advice("Commit your changes with 'contextvibes commit' or stash them first.");
            return Err(anyhow!("working tree has uncommitted changes"));
        }
        Ok(())
    }

    fn execute(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Create `name` from `base`, switch to it, and push it with upstream tracking.
pub struct CreateAndPushBranch {
    name: String,
    base: String,
}

impl CreateAndPushBranch {
    pub fn new(name: &str, base: &str) -> Self {
        Self {
            name: name.to_string(),
            base: base.to_string(),
        }
    }
}

impl Step for CreateAndPushBranch {
    fn description(&self) -> String {
        format!(
            "Create branch '{}' from '{}' and push it upstream",
            self.name, self.base
        )
    }

    fn pre_check(&self, ctx: &StepContext<'_>) -> Result<()> {
        if ctx.git.local_branch_exists(ctx.cancel, &self.name)? {
            ctx.presenter
                .advice(&format!("Use 'git switch {}' to continue work on it.", self.name));
            return Err(anyhow!("branch '{}' already exists locally", self.name));
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.git
            .create_and_switch(ctx.cancel, &self.name, Some(&self.base))?;
        ctx.git.push_set_upstream(ctx.cancel, &self.name)?;
        info!(branch = %self.name, "created and pushed branch");
        ctx.presenter.success(&format!(
            "Created '{}' and set upstream to '{}/{}'.",
            self.name,
            ctx.git.remote(),
            self.name
        ));
        Ok(())
    }
}

pub struct SwitchBranch {
    name: String,
}

impl SwitchBranch {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Step for SwitchBranch {
    fn description(&self) -> String {
        format!("Switch to '{}'", self.name)
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.git.switch_branch(ctx.cancel, &self.name)
    }
}
