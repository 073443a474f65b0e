use std::path::PathBuf;

use anyhow::Result;

use crate::app::App;
use crate::steps::GenerateFilePrompt;
use crate::workflow::Workflow;

/// Write a code-review prompt over `files`.
pub fn review(app: &App<'_>, files: Vec<PathBuf>) -> Result<()> {
    let git = app.open_git()?;
    let ctx = app.step_context(&git);
    Workflow::new("Generate Code Review Prompt")
        .step(GenerateFilePrompt::review(files))
        .without_confirmation()
        .run(&ctx)?;
    Ok(())
}

/// Write a refactoring prompt over `files`.
pub fn refactor(app: &App<'_>, files: Vec<PathBuf>) -> Result<()> {
    let git = app.open_git()?;
    let ctx = app.step_context(&git);
    Workflow::new("Generate Refactor Prompt")
        .step(GenerateFilePrompt::refactor(files))
        .without_confirmation()
        .run(&ctx)?;
    Ok(())
}
