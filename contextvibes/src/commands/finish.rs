use anyhow::Result;

use crate::app::App;
use crate::steps::{CreatePullRequest, EnsureNotMain, GeneratePrDescriptionPrompt, PushBranch};
use crate::workflow::Workflow;

const MAIN_REFUSAL: &str = "cannot create a pull request from the main branch";

#[derive(Debug, Clone, Copy, Default)]
pub struct FinishOptions {
    /// Generate an AI pull-request description prompt instead.
    pub ai: bool,
}

pub fn run(app: &App<'_>, opts: FinishOptions) -> Result<()> {
    let git = app.open_git()?;
    let ctx = app.step_context(&git);
    let not_main = EnsureNotMain::new(app.main_branch(), MAIN_REFUSAL);

    if opts.ai {
        Workflow::new("Generate AI Pull Request Prompt")
            .step(not_main)
            .step(GeneratePrDescriptionPrompt)
            .without_confirmation()
            .run(&ctx)?;
        return Ok(());
    }

    let branch = git.current_branch(&app.cancel)?;
    Workflow::new(format!("Finish '{branch}'"))
        .step(not_main)
        .step(PushBranch::new(&branch))
        .step(CreatePullRequest::new(
            &branch,
            app.config.open_pull_request_in_browser(),
        ))
        .run(&ctx)?;
    Ok(())
}
