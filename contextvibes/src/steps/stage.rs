use anyhow::{Result, anyhow};

use crate::workflow::{Step, StepContext};

/// Make sure something is staged, offering to stage everything.
pub struct EnsureStaged;

impl Step for EnsureStaged {
    fn description(&self) -> String {
        "Ensure changes are staged".to_string()
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        if ctx.git.has_staged_changes(ctx.cancel)? {
            ctx.presenter.info("Staged changes found.");
            return Ok(());
        }
        if ctx.git.is_working_tree_clean(ctx.cancel)? {
            return Err(anyhow!("no changes to commit"));
        }
        ctx.presenter
            .warning("Nothing is staged, but the working tree has changes.");
        if !ctx.confirm("Stage all changes now?")? {
            ctx.presenter.advice("Stage files with 'git add <path>' and try again.");
            return Err(anyhow!("no staged changes"));
        }
        ctx.git.add_all(ctx.cancel)?;
        ctx.presenter.success("Staged all changes.");
        Ok(())
    }
}
