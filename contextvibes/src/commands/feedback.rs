use anyhow::{Result, anyhow};

use crate::app::App;
use crate::steps::CreateIssue;
use crate::workflow::Workflow;

pub const DEFAULT_FEEDBACK_KEY: &str = "contextvibes";

#[derive(Debug, Clone, Default)]
pub struct FeedbackOptions {
    pub title: String,
    pub body: Option<String>,
    /// Key into `feedback.repositories`.
    pub repo: Option<String>,
}

/// Open a GitHub issue in one of the configured feedback repositories.
pub fn run(app: &App<'_>, opts: &FeedbackOptions) -> Result<()> {
    let title = opts.title.trim();
    if title.is_empty() {
        return Err(anyhow!("an issue title is required"));
    }
    let key = opts.repo.as_deref().unwrap_or(DEFAULT_FEEDBACK_KEY);
    let repos = app.config.feedback.repositories.as_ref();
    let Some(repo) = repos.and_then(|r| r.get(key)) else {
        let known: Vec<&str> = repos
            .map(|r| r.keys().map(String::as_str).collect())
            .unwrap_or_default();
        app.presenter
            .advice(&format!("Known repositories: {}", known.join(", ")));
        return Err(anyhow!("unknown feedback repository '{key}'"));
    };

    let git = app.open_git()?;
    let ctx = app.step_context(&git);
    Workflow::new("Submit Feedback")
        .step(CreateIssue::new(
            repo,
            title,
            opts.body.as_deref().unwrap_or_default(),
        ))
        .run(&ctx)?;
    Ok(())
}
