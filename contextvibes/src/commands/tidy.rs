use anyhow::Result;

use crate::app::App;
use crate::steps::{DeleteBranch, EnsureCleanTree, EnsureNotMain, PullRebase, SwitchBranch};
use crate::workflow::{RunOutcome, Workflow};

/// Return to main, update it, and delete the merged feature branch.
pub fn run(app: &App<'_>) -> Result<()> {
    let git = app.open_git()?;
    let branch = git.current_branch(&app.cancel)?;
    let main = app.main_branch();
    let ctx = app.step_context(&git);
    let outcome = Workflow::new(format!("Tidy '{branch}'"))
        .step(EnsureNotMain::new(
            main,
            "already on the main branch; check out the merged branch you want to tidy",
        ))
        .step(EnsureCleanTree)
        .step(SwitchBranch::new(main))
        .step(PullRebase::update_main(main))
        .step(DeleteBranch::new(&branch))
        .run(&ctx)?;
    if outcome == RunOutcome::Completed {
        app.presenter.success(&format!("Back on '{main}' and up to date."));
    }
    Ok(())
}
