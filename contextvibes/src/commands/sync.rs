use anyhow::Result;

use crate::app::App;
use crate::steps::{EnsureCleanTree, PullRebase, PushIfAhead};
use crate::workflow::{RunOutcome, Workflow};

/// Require a clean tree, rebase onto the remote branch, push if ahead.
pub fn run(app: &App<'_>) -> Result<()> {
    let git = app.open_git()?;
    let branch = git.current_branch(&app.cancel)?;
    let ctx = app.step_context(&git);
    let outcome = Workflow::new(format!("Sync '{branch}' with {}", git.remote()))
        .step(EnsureCleanTree)
        .step(PullRebase::branch(&branch))
        .step(PushIfAhead)
        .run(&ctx)?;
    if outcome == RunOutcome::Completed {
        app.presenter.success("Sync completed successfully.");
    }
    Ok(())
}
