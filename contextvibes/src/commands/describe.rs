use std::path::PathBuf;

use anyhow::Result;

use crate::app::App;
use crate::core::config::DESCRIBE_FILE;
use crate::steps::GenerateDescribeFile;
use crate::workflow::Workflow;

#[derive(Debug, Clone, Default)]
pub struct DescribeOptions {
    pub prompt: Option<String>,
    pub output: Option<PathBuf>,
}

/// Write a project snapshot for an AI session.
pub fn run(app: &App<'_>, opts: &DescribeOptions) -> Result<()> {
    let git = app.open_git()?;
    let prompt = match &opts.prompt {
        Some(prompt) => Some(prompt.clone()),
        None if app.assume_yes => None,
        None => Some(
            app.presenter
                .input("What do you want to work on? (optional)", Some(""))?,
        ),
    }
    .filter(|p| !p.trim().is_empty());
    let output = match &opts.output {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => app.workdir.join(path),
        None => app.workdir.join(DESCRIBE_FILE),
    };
    let ctx = app.step_context(&git);
    Workflow::new("Describe Project")
        .step(GenerateDescribeFile::new(prompt, output))
        .without_confirmation()
        .run(&ctx)?;
    Ok(())
}
