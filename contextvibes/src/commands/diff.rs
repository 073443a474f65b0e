use anyhow::Result;

use crate::app::App;
use crate::core::config::DESCRIBE_FILE;
use crate::steps::WriteDiffSummary;
use crate::workflow::Workflow;

/// Write a Markdown summary of staged, unstaged, and untracked changes to
/// the describe file.
pub fn run(app: &App<'_>) -> Result<()> {
    let git = app.open_git()?;
    let ctx = app.step_context(&git);
    Workflow::new("Summarize Changes")
        .step(WriteDiffSummary::new(app.workdir.join(DESCRIBE_FILE)))
        .without_confirmation()
        .run(&ctx)?;
    Ok(())
}
